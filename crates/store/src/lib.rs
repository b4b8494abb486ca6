//! Persistence: remote HTTP quote store plus a local append-only backup log.

pub mod backup;
pub mod gateway;
pub mod record;

pub use backup::{BackupEntry, BackupLog};
pub use gateway::{HttpQuoteStore, QuoteStore, StoreError};
pub use record::QuoteRecord;
