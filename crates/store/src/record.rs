use chrono::{DateTime, Utc};
use cotiza_core::Quote;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flat wire shape the remote backend accepts. List-valued attributes
/// collapse to comma-joined strings here and nowhere else.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub quote_id: String,
    pub supplier_id: String,
    pub supplier_name: String,
    pub product_name: String,
    pub product_category: Option<String>,
    pub description: String,
    pub price: Option<Decimal>,
    pub has_price: bool,
    pub source_message: String,
    pub captured_at: DateTime<Utc>,
    pub brand: Option<String>,
    pub material: String,
    pub features: String,
    pub image_url: Option<String>,
}

impl From<&Quote> for QuoteRecord {
    fn from(quote: &Quote) -> Self {
        Self {
            quote_id: quote.id.0.clone(),
            supplier_id: quote.supplier_id.0.clone(),
            supplier_name: quote.supplier_name.clone(),
            product_name: quote.product_name.clone(),
            product_category: quote.category.map(|category| category.as_str().to_owned()),
            description: quote.description.clone(),
            price: quote.price,
            has_price: quote.has_price,
            source_message: quote.source_message.clone(),
            captured_at: quote.captured_at,
            brand: quote.attributes.brand.clone(),
            material: quote.attributes.material.join(", "),
            features: quote.attributes.features.join(", "),
            image_url: quote.image_reference.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use cotiza_core::{ProductAttributes, ProductCategory, Quote, QuoteId, SupplierId};
    use rust_decimal::Decimal;

    use super::QuoteRecord;

    #[test]
    fn list_attributes_collapse_to_comma_joined_strings() {
        let quote = Quote {
            id: QuoteId("Q-1700000000000-3".to_string()),
            supplier_id: SupplierId("59170001234@c.us".to_string()),
            supplier_name: "Muebles Torrez".to_string(),
            product_name: "Silla".to_string(),
            category: Some(ProductCategory::Chair),
            description: "Silla ergonómica".to_string(),
            price: Some(Decimal::from(120)),
            has_price: true,
            source_message: "silla $120".to_string(),
            captured_at: Utc::now(),
            attributes: ProductAttributes {
                material: vec!["cuero".to_string(), "acero".to_string()],
                style: vec!["ergonómica".to_string()],
                brand: Some("Herman Miller".to_string()),
                features: vec!["ruedas".to_string(), "reposabrazos".to_string()],
            },
            image_reference: None,
        };

        let record = QuoteRecord::from(&quote);

        assert_eq!(record.material, "cuero, acero");
        assert_eq!(record.features, "ruedas, reposabrazos");
        assert_eq!(record.product_category.as_deref(), Some("chair"));
        assert_eq!(record.brand.as_deref(), Some("Herman Miller"));
        assert_eq!(record.quote_id, "Q-1700000000000-3");
    }
}
