use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use cotiza_core::SupplierId;

/// Resolves a supplier address to a human display name. Callers fall back
/// to `SupplierId::fallback_display_name` on a miss.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    async fn lookup(&self, sender: &SupplierId) -> Option<String>;
}

#[derive(Debug, Default)]
pub struct InMemoryContactDirectory {
    entries: RwLock<HashMap<SupplierId, String>>,
}

impl InMemoryContactDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, sender: SupplierId, display_name: impl Into<String>) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(sender, display_name.into());
    }
}

#[async_trait]
impl ContactDirectory for InMemoryContactDirectory {
    async fn lookup(&self, sender: &SupplierId) -> Option<String> {
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.get(sender).cloned()
    }
}

#[cfg(test)]
mod tests {
    use cotiza_core::SupplierId;

    use super::{ContactDirectory, InMemoryContactDirectory};

    #[tokio::test]
    async fn lookup_returns_known_names_only() {
        let directory = InMemoryContactDirectory::new();
        let known = SupplierId("59170001111@c.us".to_string());
        directory.insert(known.clone(), "Muebles Torrez");

        assert_eq!(directory.lookup(&known).await.as_deref(), Some("Muebles Torrez"));
        assert!(directory.lookup(&SupplierId("59170002222@c.us".to_string())).await.is_none());
    }
}
