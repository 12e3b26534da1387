//! Data model shared by the chain port, the engine, and the exposed views.

pub mod block;
pub mod event;
pub mod selectors;
pub mod token;
pub mod view;

pub use block::{BlockSummary, TransactionRecord, TxRef};
pub use event::{LogEvent, TRANSFER_TOPIC, TransferDirection, TransferEvent};
pub use token::{HoldingEntry, TokenMetadata, TokenMetadataCache, format_amount};
pub use view::{AccountKind, AddressView, FeeData, FeedSnapshot, FeedStatus};
