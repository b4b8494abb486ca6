//! Per-supplier acknowledgement throttling.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::domain::SupplierId;

/// Tracks when each supplier last produced quotes so the pipeline can
/// suppress repeat thank-you replies. Every priced message refreshes the
/// stamp, so the quiet period slides while prices keep arriving. The map
/// lives in memory only, so a restart resets the throttle.
#[derive(Debug, Default)]
pub struct QuoteThrottle {
    last_quoted: Mutex<HashMap<SupplierId, DateTime<Utc>>>,
}

impl QuoteThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps the supplier as having just been quoted.
    pub fn mark_quoted(&self, supplier: &SupplierId, now: DateTime<Utc>) {
        let mut last_quoted = match self.last_quoted.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        last_quoted.insert(supplier.clone(), now);
    }

    /// True when the supplier was stamped less than `window` ago. Gates the
    /// closing acknowledgement only; persistence never consults this.
    pub fn was_quoted_recently(
        &self,
        supplier: &SupplierId,
        window: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        let last_quoted = match self.last_quoted.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        last_quoted.get(supplier).is_some_and(|previous| now - *previous < window)
    }
}
