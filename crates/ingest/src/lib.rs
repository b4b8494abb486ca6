//! Inbound message handling: transport types, the processing pipeline, and
//! per-sender serialization.

pub mod attachments;
pub mod contacts;
pub mod pipeline;
pub mod transport;
pub mod workers;

pub use attachments::{PendingAttachment, PendingAttachments};
pub use contacts::{ContactDirectory, InMemoryContactDirectory};
pub use pipeline::{MessageProcessor, PipelineSettings, ProcessOutcome};
pub use transport::{AttachmentPayload, InboundMessage, MessageKind, ReplySender, TypingDelay};
pub use workers::SenderRouter;
