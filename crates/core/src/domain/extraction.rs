use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How an amount or product was detected: the cheap synchronous regex
/// cascade, or the out-of-process oracle fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Pattern,
    Oracle,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Oracle => "oracle",
        }
    }
}

/// A monetary amount lifted from free-form text. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedAmount {
    pub value: Decimal,
    pub raw_text: String,
    pub method: DetectionMethod,
}
