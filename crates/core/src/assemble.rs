//! Turns one scanned message into persistable [`Quote`]s.

use chrono::{DateTime, Utc};

use crate::domain::extraction::ExtractedAmount;
use crate::domain::product::{DetectedProduct, ProductAttributes, ProductCategory};
use crate::domain::quote::{Quote, QuoteIdGenerator};
use crate::domain::SupplierId;
use crate::extract::lexical::{amount_context, CommonTerms};

/// Name used when a priced message names no recognizable product at all.
const PLACEHOLDER_PRODUCT: &str = "Producto";

/// Everything the assembler needs about one inbound message.
pub struct AssembleInput {
    pub supplier_id: SupplierId,
    pub supplier_name: String,
    pub message: String,
    pub amounts: Vec<ExtractedAmount>,
    pub products: Vec<DetectedProduct>,
    pub arrival: DateTime<Utc>,
    /// Category hint delivered alongside a pending image. Consulted only
    /// when the message itself names no recognizable product.
    pub category_hint: Option<ProductCategory>,
}

pub struct QuoteAssembler {
    ids: QuoteIdGenerator,
    common_terms: CommonTerms,
}

impl Default for QuoteAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteAssembler {
    pub fn new() -> Self {
        Self { ids: QuoteIdGenerator::new(), common_terms: CommonTerms::new() }
    }

    /// Pairing rules:
    /// - with amounts present, one quote per amount, cycling through the
    ///   detected products when there are fewer products than amounts;
    /// - with no detected products, a secondary term lookup runs over the
    ///   raw message, and the placeholder (colored by the attachment's
    ///   category hint, when one came along) covers the rest;
    /// - with no amounts at all, one price-less quote per product.
    pub fn assemble(&self, input: AssembleInput) -> Vec<Quote> {
        let AssembleInput {
            supplier_id,
            supplier_name,
            message,
            amounts,
            products,
            arrival,
            category_hint,
        } = input;

        if amounts.is_empty() {
            return products
                .into_iter()
                .map(|product| {
                    self.quote_for(
                        &supplier_id,
                        &supplier_name,
                        &message,
                        arrival,
                        NamedProduct::from_detected(product),
                        None,
                    )
                })
                .collect();
        }

        let named: Vec<NamedProduct> = if products.is_empty() {
            self.products_from_terms(&message)
        } else {
            products.into_iter().map(NamedProduct::from_detected).collect()
        };

        amounts
            .into_iter()
            .enumerate()
            .map(|(index, amount)| {
                let product = if named.is_empty() {
                    NamedProduct::placeholder(&message, &amount.raw_text, category_hint)
                } else {
                    named[index % named.len()].clone()
                };
                self.quote_for(
                    &supplier_id,
                    &supplier_name,
                    &message,
                    arrival,
                    product,
                    Some(amount),
                )
            })
            .collect()
    }

    fn products_from_terms(&self, message: &str) -> Vec<NamedProduct> {
        self.common_terms
            .lookup(message)
            .into_iter()
            .map(|(category, display_name)| NamedProduct {
                category: Some(category),
                display_name,
                description: message.trim().to_string(),
                attributes: ProductAttributes::default(),
            })
            .collect()
    }

    fn quote_for(
        &self,
        supplier_id: &SupplierId,
        supplier_name: &str,
        message: &str,
        arrival: DateTime<Utc>,
        product: NamedProduct,
        amount: Option<ExtractedAmount>,
    ) -> Quote {
        let price = amount.as_ref().map(|amount| amount.value);
        Quote {
            id: self.ids.next(arrival),
            supplier_id: supplier_id.clone(),
            supplier_name: supplier_name.to_owned(),
            product_name: product.display_name,
            category: product.category,
            description: product.description,
            price,
            has_price: price.is_some(),
            source_message: message.to_owned(),
            captured_at: arrival,
            attributes: product.attributes,
            image_reference: None,
        }
    }
}

#[derive(Clone)]
struct NamedProduct {
    category: Option<ProductCategory>,
    display_name: String,
    description: String,
    attributes: ProductAttributes,
}

impl NamedProduct {
    fn from_detected(product: DetectedProduct) -> Self {
        // Short human-readable summary, then the raw context for anyone who
        // wants to double-check the extraction later.
        let mut summary = product.display_name.clone();
        if let Some(brand) = &product.attributes.brand {
            summary.push(' ');
            summary.push_str(brand);
        }
        if let Some(material) = product.attributes.material.first() {
            summary.push_str(" de ");
            summary.push_str(material);
        }
        if let Some(style) = product.attributes.style.first() {
            summary.push(' ');
            summary.push_str(style);
        }
        let description = if product.context.is_empty() {
            summary
        } else {
            format!("{summary} ({})", product.context)
        };
        Self {
            category: Some(product.category),
            display_name: product.display_name,
            description,
            attributes: product.attributes,
        }
    }

    /// Price with no product anywhere in the message. The description is
    /// the text surrounding the numeric literal so a human can still tell
    /// what was being quoted; a pending-image hint fills in the category.
    fn placeholder(message: &str, raw_amount: &str, hint: Option<ProductCategory>) -> Self {
        Self {
            category: hint,
            display_name: PLACEHOLDER_PRODUCT.to_string(),
            description: amount_context(message, raw_amount),
            attributes: ProductAttributes::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{AssembleInput, QuoteAssembler};
    use crate::domain::extraction::{DetectionMethod, ExtractedAmount};
    use crate::domain::product::{DetectedProduct, ProductAttributes, ProductCategory};
    use crate::domain::SupplierId;

    fn amount(value: i64, raw: &str) -> ExtractedAmount {
        ExtractedAmount {
            value: Decimal::from(value),
            raw_text: raw.to_string(),
            method: DetectionMethod::Pattern,
        }
    }

    fn product(category: ProductCategory, name: &str) -> DetectedProduct {
        DetectedProduct {
            category,
            display_name: name.to_string(),
            attributes: ProductAttributes::default(),
            context: format!("{name} de oferta"),
        }
    }

    fn input(
        message: &str,
        amounts: Vec<ExtractedAmount>,
        products: Vec<DetectedProduct>,
    ) -> AssembleInput {
        AssembleInput {
            supplier_id: SupplierId("59170001234@c.us".to_string()),
            supplier_name: "Muebles Torrez".to_string(),
            message: message.to_string(),
            amounts,
            products,
            arrival: Utc::now(),
            category_hint: None,
        }
    }

    #[test]
    fn one_quote_per_amount_cycling_products() {
        let assembler = QuoteAssembler::new();
        let quotes = assembler.assemble(input(
            "silla $120, mesa $450, otra silla $130",
            vec![amount(120, "$120"), amount(450, "$450"), amount(130, "$130")],
            vec![product(ProductCategory::Chair, "Silla"), product(ProductCategory::Desk, "Mesa")],
        ));

        assert_eq!(quotes.len(), 3);
        assert_eq!(quotes[0].product_name, "Silla");
        assert_eq!(quotes[1].product_name, "Mesa");
        assert_eq!(quotes[2].product_name, "Silla");
        assert!(quotes.iter().all(|quote| quote.has_price));
    }

    #[test]
    fn priced_message_without_detected_products_falls_back_to_terms() {
        let assembler = QuoteAssembler::new();
        let quotes = assembler.assemble(input(
            "El pupitre cuesta 200 bs",
            vec![amount(200, "200 bs")],
            vec![],
        ));

        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].product_name, "Pupitre");
        assert_eq!(quotes[0].category, Some(ProductCategory::Desk));
    }

    #[test]
    fn priced_message_with_no_recognizable_product_gets_placeholder() {
        let assembler = QuoteAssembler::new();
        let quotes = assembler.assemble(input(
            "Todo a 150 por unidad, entrega inmediata",
            vec![amount(150, "150 por unidad")],
            vec![],
        ));

        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].product_name, "Producto");
        assert_eq!(quotes[0].category, None);
        assert!(quotes[0].description.contains("150"));
    }

    #[test]
    fn no_amounts_yields_price_less_quotes_per_product() {
        let assembler = QuoteAssembler::new();
        let quotes = assembler.assemble(input(
            "Tenemos sillas y escritorios",
            vec![],
            vec![product(ProductCategory::Chair, "Silla"), product(ProductCategory::Desk, "Escritorio")],
        ));

        assert_eq!(quotes.len(), 2);
        assert!(quotes.iter().all(|quote| !quote.has_price && quote.price.is_none()));
    }

    #[test]
    fn quote_ids_are_distinct_within_one_message() {
        let assembler = QuoteAssembler::new();
        let quotes = assembler.assemble(input(
            "silla $100 y $200",
            vec![amount(100, "$100"), amount(200, "$200")],
            vec![product(ProductCategory::Chair, "Silla")],
        ));

        assert_ne!(quotes[0].id, quotes[1].id);
    }

    #[test]
    fn placeholder_takes_its_category_from_the_attachment_hint() {
        let assembler = QuoteAssembler::new();
        let mut message = input("precio: 150, entrega inmediata", vec![amount(150, "150")], vec![]);
        message.category_hint = Some(ProductCategory::Shelf);

        let quotes = assembler.assemble(message);

        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].product_name, "Producto");
        assert_eq!(quotes[0].category, Some(ProductCategory::Shelf));
    }

    #[test]
    fn products_named_in_the_message_win_over_the_attachment_hint() {
        let assembler = QuoteAssembler::new();
        let mut message = input("El pupitre cuesta 200 bs", vec![amount(200, "200 bs")], vec![]);
        message.category_hint = Some(ProductCategory::Sofa);

        let quotes = assembler.assemble(message);

        assert_eq!(quotes[0].product_name, "Pupitre");
        assert_eq!(quotes[0].category, Some(ProductCategory::Desk));
    }

    #[test]
    fn source_message_and_supplier_carry_through() {
        let assembler = QuoteAssembler::new();
        let quotes = assembler.assemble(input(
            "mesa $450",
            vec![amount(450, "$450")],
            vec![product(ProductCategory::Desk, "Mesa")],
        ));

        assert_eq!(quotes[0].supplier_name, "Muebles Torrez");
        assert_eq!(quotes[0].source_message, "mesa $450");
    }
}
