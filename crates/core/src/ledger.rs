//! In-process conversation history, one bounded deque per supplier.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::domain::conversation::ConversationEntry;
use crate::domain::SupplierId;

pub const DEFAULT_CAPACITY: usize = 20;

/// Session-scoped ledger of recent turns per supplier. Oldest entries are
/// evicted once a supplier reaches capacity; nothing here survives a
/// restart.
pub struct ConversationLedger {
    capacity: usize,
    entries: Mutex<HashMap<SupplierId, VecDeque<ConversationEntry>>>,
}

impl Default for ConversationLedger {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ConversationLedger {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), entries: Mutex::new(HashMap::new()) }
    }

    pub fn append(&self, supplier: &SupplierId, entry: ConversationEntry) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let history = entries.entry(supplier.clone()).or_default();
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back(entry);
    }

    /// Oldest-first snapshot of one supplier's history.
    pub fn history(&self, supplier: &SupplierId) -> Vec<ConversationEntry> {
        let entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.get(supplier).map(|history| history.iter().cloned().collect()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::ConversationLedger;
    use crate::domain::conversation::ConversationEntry;
    use crate::domain::SupplierId;

    fn supplier(address: &str) -> SupplierId {
        SupplierId(address.to_string())
    }

    #[test]
    fn history_is_isolated_per_supplier() {
        let ledger = ConversationLedger::default();
        let first = supplier("59170000001@c.us");
        let second = supplier("59170000002@c.us");

        ledger.append(&first, ConversationEntry::counterparty("hola", Utc::now()));

        assert_eq!(ledger.history(&first).len(), 1);
        assert!(ledger.history(&second).is_empty());
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let ledger = ConversationLedger::new(20);
        let sender = supplier("59170000003@c.us");

        for index in 0..25 {
            ledger.append(
                &sender,
                ConversationEntry::counterparty(format!("mensaje {index}"), Utc::now()),
            );
        }

        let history = ledger.history(&sender);
        assert_eq!(history.len(), 20);
        assert_eq!(history[0].body, "mensaje 5");
        assert_eq!(history[19].body, "mensaje 24");
    }

    #[test]
    fn entries_keep_arrival_order() {
        let ledger = ConversationLedger::default();
        let sender = supplier("59170000004@c.us");
        let now = Utc::now();

        ledger.append(&sender, ConversationEntry::counterparty("precio?", now));
        ledger.append(&sender, ConversationEntry::system("gracias", now));

        let history = ledger.history(&sender);
        assert_eq!(history[0].body, "precio?");
        assert_eq!(history[1].body, "gracias");
    }
}
