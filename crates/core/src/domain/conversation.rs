use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a ledger entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Counterparty,
    System,
}

/// One turn of a supplier conversation. Session-scoped only: entries are
/// never written to durable storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: Role,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn counterparty(body: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self { role: Role::Counterparty, body: body.into(), timestamp }
    }

    pub fn system(body: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self { role: Role::System, body: body.into(), timestamp }
    }
}
