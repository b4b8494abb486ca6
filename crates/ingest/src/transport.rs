//! Transport-facing types. The chat network client itself lives outside
//! this workspace; it feeds [`InboundMessage`]s in and implements
//! [`ReplySender`] for the way out.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cotiza_core::{ProductCategory, SupplierId};
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Image,
    Document,
    Audio,
    Other,
}

/// Media reference delivered alongside an image message. The reference is
/// an URL or storage key minted by the transport, never raw bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentPayload {
    pub image_reference: String,
    pub category_hint: Option<ProductCategory>,
}

#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub sender_id: SupplierId,
    pub body: String,
    pub kind: MessageKind,
    pub attachment: Option<AttachmentPayload>,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn text(sender_id: SupplierId, body: impl Into<String>) -> Self {
        Self {
            sender_id,
            body: body.into(),
            kind: MessageKind::Text,
            attachment: None,
            received_at: Utc::now(),
        }
    }

    pub fn image(sender_id: SupplierId, attachment: AttachmentPayload) -> Self {
        Self {
            sender_id,
            body: String::new(),
            kind: MessageKind::Image,
            attachment: Some(attachment),
            received_at: Utc::now(),
        }
    }
}

/// Outbound reply seam. Delivery is best-effort; the pipeline logs and
/// moves on when a send fails.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send(&self, recipient: &SupplierId, body: &str) -> Result<()>;
}

/// Humanized delay before outbound replies, imitating someone typing.
#[derive(Clone, Copy, Debug)]
pub struct TypingDelay {
    min_ms: u64,
    max_ms: u64,
}

impl TypingDelay {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms: max_ms.max(min_ms) }
    }

    pub async fn wait(&self) {
        // The rng handle must not live across the await point.
        let wait_ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        if wait_ms > 0 {
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        }
    }
}
