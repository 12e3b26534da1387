pub mod address;
pub mod aggregator;
pub mod holdings;
pub mod poller;
pub mod relevance;
pub mod resolve;
pub mod scheduler;
pub mod session;
pub mod walker;
pub mod window;

pub use address::AddressScanner;
pub use aggregator::TransactionAggregator;
pub use holdings::{Holdings, HoldingsResolver};
pub use poller::FeedPoller;
pub use relevance::{AddressRelevanceScanner, RelevanceScan};
pub use resolve::TransactionResolver;
pub use scheduler::{FetchScheduler, Fetched};
pub use session::{CycleReport, FeedSession};
pub use walker::{HistoryWalker, WalkReport};
pub use window::WindowSnapshotBuilder;
