use std::time::Duration;

use cotiza_core::{
    DetectedProduct, DetectionMethod, ExtractedAmount, LexicalMatcher, ProductAttributes,
    SupplierId,
};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::oracle::{sanitize, OracleClient, OracleExtraction};

/// Result of running one message through the extraction cascade.
#[derive(Clone, Debug)]
pub struct Extraction {
    pub has_price: bool,
    pub amounts: Vec<ExtractedAmount>,
    pub products: Vec<DetectedProduct>,
    pub method: DetectionMethod,
}

impl Extraction {
    fn empty() -> Self {
        Self {
            has_price: false,
            amounts: Vec::new(),
            products: Vec::new(),
            method: DetectionMethod::Pattern,
        }
    }
}

/// Runs the lexical matcher first and only consults the oracle when no
/// amount was found. Oracle failures degrade to an empty extraction; the
/// counterparty never sees an error.
pub struct ExtractionOrchestrator<O> {
    matcher: LexicalMatcher,
    oracle: O,
    oracle_timeout: Duration,
}

impl<O: OracleClient> ExtractionOrchestrator<O> {
    pub fn new(oracle: O, oracle_timeout: Duration) -> Self {
        Self { matcher: LexicalMatcher::new(), oracle, oracle_timeout }
    }

    pub async fn extract(&self, message: &str, sender: &SupplierId) -> Extraction {
        let outcome = self.matcher.scan(message);
        if !outcome.amounts.is_empty() {
            return Extraction {
                has_price: true,
                amounts: outcome.amounts,
                products: outcome.products,
                method: DetectionMethod::Pattern,
            };
        }

        let oracle_call = self.oracle.extract_price(message, sender);
        let response = match tokio::time::timeout(self.oracle_timeout, oracle_call).await {
            Ok(Ok(extraction)) => extraction,
            Ok(Err(error)) => {
                warn!(
                    event_name = "agent.oracle.extract_failed",
                    supplier = %sender,
                    error = %error,
                    "oracle extraction failed, continuing without price"
                );
                return Extraction { products: outcome.products, ..Extraction::empty() };
            }
            Err(_) => {
                warn!(
                    event_name = "agent.oracle.extract_timeout",
                    supplier = %sender,
                    "oracle extraction timed out, continuing without price"
                );
                return Extraction { products: outcome.products, ..Extraction::empty() };
            }
        };

        let adopted = adopt(response);
        if adopted.amounts.is_empty() {
            // Oracle found nothing either; keep whatever products the
            // lexical pass saw.
            return Extraction { products: outcome.products, ..Extraction::empty() };
        }

        debug!(
            event_name = "agent.oracle.extract_adopted",
            supplier = %sender,
            amounts = adopted.amounts.len(),
            "oracle extraction adopted"
        );
        adopted
    }

    /// Continuation reply for messages without a price. Returns the text to
    /// send, or `None` when the oracle declines, answers blank, or fails.
    pub async fn continuation_reply(
        &self,
        message: &str,
        sender: &SupplierId,
        has_price: bool,
    ) -> Option<String> {
        let oracle_call = self.oracle.generate_reply(message, sender, has_price);
        let reply = match tokio::time::timeout(self.oracle_timeout, oracle_call).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(error)) => {
                warn!(
                    event_name = "agent.oracle.reply_failed",
                    supplier = %sender,
                    error = %error,
                    "oracle reply generation failed"
                );
                return None;
            }
            Err(_) => {
                warn!(
                    event_name = "agent.oracle.reply_timeout",
                    supplier = %sender,
                    "oracle reply generation timed out"
                );
                return None;
            }
        };

        if !reply.should_reply {
            return None;
        }
        let text = sanitize(&reply.reply_text);
        if text.is_empty() {
            return None;
        }
        Some(text)
    }
}

/// Converts the oracle's untrusted answer into domain values: text fields
/// sanitized, non-positive amounts discarded, taxonomy-less products
/// dropped.
fn adopt(response: OracleExtraction) -> Extraction {
    let mut amounts: Vec<ExtractedAmount> = Vec::new();
    for amount in response.amounts {
        if amount.value <= Decimal::ZERO {
            continue;
        }
        if amounts.iter().any(|seen| seen.value == amount.value) {
            continue;
        }
        let raw_text = amount
            .raw_text
            .as_deref()
            .map(sanitize)
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| amount.value.to_string());
        amounts.push(ExtractedAmount { value: amount.value, raw_text, method: DetectionMethod::Oracle });
    }

    let products: Vec<DetectedProduct> = response
        .products
        .into_iter()
        .filter_map(|product| {
            let category = product.category?;
            let display_name = sanitize(&product.display_name);
            if display_name.is_empty() {
                return None;
            }
            Some(DetectedProduct {
                category,
                display_name,
                attributes: ProductAttributes::default(),
                context: product.description.as_deref().map(sanitize).unwrap_or_default(),
            })
        })
        .collect();

    Extraction { has_price: !amounts.is_empty(), amounts, products, method: DetectionMethod::Oracle }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use cotiza_core::{DetectionMethod, ProductCategory, SupplierId};
    use rust_decimal::Decimal;

    use super::ExtractionOrchestrator;
    use crate::oracle::{OracleAmount, OracleClient, OracleExtraction, OracleProduct, OracleReply};

    #[derive(Default)]
    struct FakeOracle {
        extraction: Option<OracleExtraction>,
        reply: Option<OracleReply>,
        fail: bool,
        extract_calls: AtomicUsize,
    }

    #[async_trait]
    impl OracleClient for FakeOracle {
        async fn extract_price(
            &self,
            _message: &str,
            _sender: &SupplierId,
        ) -> Result<OracleExtraction> {
            self.extract_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!("oracle unavailable"));
            }
            Ok(self.extraction.clone().unwrap_or_default())
        }

        async fn generate_reply(
            &self,
            _message: &str,
            _sender: &SupplierId,
            _has_price: bool,
        ) -> Result<OracleReply> {
            if self.fail {
                return Err(anyhow!("oracle unavailable"));
            }
            Ok(self.reply.clone().unwrap_or_default())
        }
    }

    fn sender() -> SupplierId {
        SupplierId("59170009999@c.us".to_string())
    }

    fn make_orchestrator(oracle: FakeOracle) -> ExtractionOrchestrator<FakeOracle> {
        ExtractionOrchestrator::new(oracle, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn lexical_hit_short_circuits_the_oracle() {
        let orchestrator = make_orchestrator(FakeOracle::default());

        let extraction = orchestrator.extract("silla a $120", &sender()).await;

        assert!(extraction.has_price);
        assert_eq!(extraction.method, DetectionMethod::Pattern);
        assert_eq!(orchestrator.oracle.extract_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn oracle_fallback_is_adopted_when_lexical_finds_nothing() {
        let oracle = FakeOracle {
            extraction: Some(OracleExtraction {
                has_price: true,
                amounts: vec![OracleAmount {
                    value: Decimal::from(85),
                    raw_text: Some("ochenta y cinco".to_string()),
                }],
                products: vec![OracleProduct {
                    category: Some(ProductCategory::Chair),
                    display_name: "Silla".to_string(),
                    description: None,
                }],
            }),
            ..FakeOracle::default()
        };
        let orchestrator = make_orchestrator(oracle);

        let extraction =
            orchestrator.extract("te dejo la silla en ochenta y cinco", &sender()).await;

        assert!(extraction.has_price);
        assert_eq!(extraction.method, DetectionMethod::Oracle);
        assert_eq!(extraction.amounts[0].value, Decimal::from(85));
        assert_eq!(extraction.products[0].category, ProductCategory::Chair);
    }

    #[tokio::test]
    async fn oracle_failure_degrades_to_empty_extraction() {
        let orchestrator = make_orchestrator(FakeOracle { fail: true, ..FakeOracle::default() });

        let extraction = orchestrator.extract("te paso el precio luego", &sender()).await;

        assert!(!extraction.has_price);
        assert!(extraction.amounts.is_empty());
    }

    #[tokio::test]
    async fn oracle_output_is_sanitized_and_filtered() {
        let oracle = FakeOracle {
            extraction: Some(OracleExtraction {
                has_price: true,
                amounts: vec![
                    OracleAmount { value: Decimal::from(-5), raw_text: None },
                    OracleAmount { value: Decimal::from(40), raw_text: Some("  40\u{0} bs ".to_string()) },
                ],
                products: vec![
                    OracleProduct {
                        category: None,
                        display_name: "cosa rara".to_string(),
                        description: None,
                    },
                    OracleProduct {
                        category: Some(ProductCategory::Desk),
                        display_name: "Mesa\u{7}".to_string(),
                        description: Some("mesa de madera\r".to_string()),
                    },
                ],
            }),
            ..FakeOracle::default()
        };
        let orchestrator = make_orchestrator(oracle);

        let extraction = orchestrator.extract("cuarenta por la mesa", &sender()).await;

        assert_eq!(extraction.amounts.len(), 1);
        assert_eq!(extraction.amounts[0].raw_text, "40 bs");
        assert_eq!(extraction.products.len(), 1);
        assert_eq!(extraction.products[0].display_name, "Mesa");
        assert_eq!(extraction.products[0].context, "mesa de madera");
    }

    #[tokio::test]
    async fn continuation_reply_respects_should_reply() {
        let oracle = FakeOracle {
            reply: Some(OracleReply { reply_text: " gracias, quedo atento ".to_string(), should_reply: true }),
            ..FakeOracle::default()
        };
        let orchestrator = make_orchestrator(oracle);

        let reply = orchestrator.continuation_reply("hola", &sender(), false).await;
        assert_eq!(reply.as_deref(), Some("gracias, quedo atento"));

        let silent = make_orchestrator(FakeOracle {
            reply: Some(OracleReply { reply_text: "algo".to_string(), should_reply: false }),
            ..FakeOracle::default()
        });
        assert!(silent.continuation_reply("hola", &sender(), false).await.is_none());
    }

    #[tokio::test]
    async fn continuation_reply_swallows_oracle_errors() {
        let orchestrator = make_orchestrator(FakeOracle { fail: true, ..FakeOracle::default() });
        assert!(orchestrator.continuation_reply("hola", &sender(), false).await.is_none());
    }
}
