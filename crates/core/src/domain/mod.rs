pub mod conversation;
pub mod extraction;
pub mod product;
pub mod quote;

use serde::{Deserialize, Serialize};

/// Identifier of a supplier counterparty, as delivered by the transport
/// (typically a phone-number-shaped address).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupplierId(pub String);

impl SupplierId {
    /// Fallback display name when the contact directory has no entry:
    /// `Proveedor` plus the last four digits of the address.
    pub fn fallback_display_name(&self) -> String {
        let digits: String = self.0.chars().filter(char::is_ascii_digit).collect();
        let tail_start = digits.len().saturating_sub(4);
        let tail = &digits[tail_start..];
        if tail.is_empty() {
            "Proveedor".to_string()
        } else {
            format!("Proveedor {tail}")
        }
    }
}

impl std::fmt::Display for SupplierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
