//! Pending-attachment slots.
//!
//! Suppliers often send a product photo first and the priced message a few
//! seconds later. Each sender gets a single slot: a newer image replaces
//! the previous one, and the next assembly for that sender consumes the
//! slot exactly once. Stale slots expire rather than attaching to an
//! unrelated quote days later.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use cotiza_core::{ProductCategory, SupplierId};

pub const DEFAULT_EXPIRY_MINUTES: i64 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAttachment {
    pub image_reference: String,
    pub category_hint: Option<ProductCategory>,
    pub stored_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct PendingAttachments {
    expiry: Duration,
    slots: Mutex<HashMap<SupplierId, PendingAttachment>>,
}

impl Default for PendingAttachments {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_EXPIRY_MINUTES))
    }
}

impl PendingAttachments {
    pub fn new(expiry: Duration) -> Self {
        Self { expiry, slots: Mutex::new(HashMap::new()) }
    }

    /// Fills the sender's slot, replacing any previous attachment.
    pub fn store(
        &self,
        sender: &SupplierId,
        image_reference: impl Into<String>,
        category_hint: Option<ProductCategory>,
        now: DateTime<Utc>,
    ) {
        let mut slots = match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slots.insert(
            sender.clone(),
            PendingAttachment { image_reference: image_reference.into(), category_hint, stored_at: now },
        );
    }

    /// Consumes the sender's slot. Expired slots are dropped and `None` is
    /// returned.
    pub fn take(&self, sender: &SupplierId, now: DateTime<Utc>) -> Option<PendingAttachment> {
        let mut slots = match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let attachment = slots.remove(sender)?;
        if now - attachment.stored_at > self.expiry {
            return None;
        }
        Some(attachment)
    }
}
