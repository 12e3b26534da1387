//! Colored console output for operators watching the feed.
//!
//! Dropped requests are reported here as warnings. Finer per-item detail goes
//! through the `log` facade. Set `EVM_FEED_SILENT=1` to mute this module
//! entirely.

use chrono::Local;
use colored::Colorize;

/// Environment variable that silences console output.
pub const SILENT_ENV: &str = "EVM_FEED_SILENT";

/// Severity of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
    Debug,
}

impl LogLevel {
    fn tag(self) -> colored::ColoredString {
        match self {
            Self::Info => "INFO".blue().bold(),
            Self::Success => " OK ".green().bold(),
            Self::Warning => "WARN".yellow().bold(),
            Self::Error => "FAIL".red().bold(),
            Self::Debug => "DBUG".dimmed(),
        }
    }
}

fn is_silent() -> bool {
    std::env::var(SILENT_ENV).is_ok_and(|v| v != "0" && !v.is_empty())
}

fn format_line(level: LogLevel, message: &str) -> String {
    let ts = Local::now().format("%H:%M:%S");
    format!("{} [{}] {}", ts.to_string().dimmed(), level.tag(), message)
}

/// Prints a timestamped, colored line unless output is silenced.
pub fn log(level: LogLevel, message: &str) {
    if is_silent() {
        return;
    }
    let line = format_line(level, message);
    match level {
        LogLevel::Error | LogLevel::Warning => eprintln!("{line}"),
        _ => println!("{line}"),
    }
}

/// Prints a section banner.
pub fn log_section(title: &str) {
    if is_silent() {
        return;
    }
    let bar = "=".repeat(title.len() + 8);
    println!("\n{}", bar.cyan());
    println!("{}", format!("    {title}    ").cyan().bold());
    println!("{}\n", bar.cyan());
}

/// Prints an error with its context.
pub fn log_error(context: &str, error: &str) {
    log(LogLevel::Error, &format!("{context}: {}", error.red()));
}

/// Prints a recoverable failure; the caller carries on without the item.
pub fn log_warning(context: &str, error: &str) {
    log(LogLevel::Warning, &format!("{context}: {}", error.yellow()));
}

/// Startup banner for the feed poller.
pub fn log_startup(rpc_url: &str, window_size: u64, poll_interval_secs: u64) {
    log_section("EVM Activity Feed");
    log(LogLevel::Info, &format!("Endpoint:      {}", rpc_url.bold()));
    log(LogLevel::Info, &format!("Window:        {window_size} blocks"));
    log(LogLevel::Info, &format!("Poll interval: {poll_interval_secs}s"));
}
