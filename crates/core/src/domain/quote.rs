use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::{ProductAttributes, ProductCategory};
use crate::domain::SupplierId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

impl std::fmt::Display for QuoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mints quote ids of the form `Q-{arrival millis}-{sequence}`. The
/// process-wide sequence keeps ids distinct even when two senders land in
/// the same millisecond tick.
#[derive(Debug, Default)]
pub struct QuoteIdGenerator {
    sequence: AtomicU64,
}

impl QuoteIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, arrival: DateTime<Utc>) -> QuoteId {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        QuoteId(format!("Q-{}-{sequence}", arrival.timestamp_millis()))
    }
}

/// The unit of persistence: one (product, price) pairing from one supplier
/// message. Write-once after assembly, except for an image reference that
/// may arrive out of band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub supplier_id: SupplierId,
    pub supplier_name: String,
    pub product_name: String,
    pub category: Option<ProductCategory>,
    pub description: String,
    pub price: Option<Decimal>,
    pub has_price: bool,
    pub source_message: String,
    pub captured_at: DateTime<Utc>,
    pub attributes: ProductAttributes,
    pub image_reference: Option<String>,
}

impl Quote {
    /// Attaches an out-of-band image reference. A quote carries at most one.
    pub fn attach_image(&mut self, reference: impl Into<String>) -> Result<(), DomainError> {
        if self.image_reference.is_some() {
            return Err(DomainError::ImageAlreadyAttached(self.id.0.clone()));
        }
        self.image_reference = Some(reference.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Quote, QuoteId, QuoteIdGenerator};
    use crate::domain::product::ProductAttributes;
    use crate::domain::SupplierId;
    use crate::errors::DomainError;

    fn quote_fixture() -> Quote {
        Quote {
            id: QuoteId("Q-1-0".to_string()),
            supplier_id: SupplierId("591790@c.us".to_string()),
            supplier_name: "Proveedor 1790".to_string(),
            product_name: "Silla".to_string(),
            category: None,
            description: "Silla".to_string(),
            price: None,
            has_price: false,
            source_message: "sillas disponibles".to_string(),
            captured_at: Utc::now(),
            attributes: ProductAttributes::default(),
            image_reference: None,
        }
    }

    #[test]
    fn generator_mints_distinct_ids_for_identical_timestamps() {
        let generator = QuoteIdGenerator::new();
        let arrival = Utc::now();
        let first = generator.next(arrival);
        let second = generator.next(arrival);
        assert_ne!(first, second);
    }

    #[test]
    fn image_attaches_once() {
        let mut quote = quote_fixture();
        quote.attach_image("https://backend/img/1.jpg").expect("first attach");
        let error = quote.attach_image("https://backend/img/2.jpg").expect_err("second attach");
        assert!(matches!(error, DomainError::ImageAlreadyAttached(_)));
        assert_eq!(quote.image_reference.as_deref(), Some("https://backend/img/1.jpg"));
    }
}
