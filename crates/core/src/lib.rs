//! Core domain and extraction logic for cotiza.
//!
//! This crate is I/O free: the lexical matcher and quote assembler are pure,
//! and the conversation ledger and quote throttle are injected in-process
//! stores. Network seams (oracle, quote store, transport) live in the
//! sibling crates.

pub mod assemble;
pub mod config;
pub mod domain;
pub mod errors;
pub mod extract;
pub mod ledger;
pub mod throttle;

pub use assemble::{AssembleInput, QuoteAssembler};
pub use domain::conversation::{ConversationEntry, Role};
pub use domain::extraction::{DetectionMethod, ExtractedAmount};
pub use domain::product::{DetectedProduct, ProductAttributes, ProductCategory};
pub use domain::quote::{Quote, QuoteId, QuoteIdGenerator};
pub use domain::SupplierId;
pub use errors::DomainError;
pub use extract::lexical::{CommonTerms, LexicalMatcher, MatchOutcome};
pub use ledger::ConversationLedger;
pub use throttle::QuoteThrottle;
