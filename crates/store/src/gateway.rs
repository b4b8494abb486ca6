use std::time::Duration;

use async_trait::async_trait;
use cotiza_core::config::StoreConfig;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::record::QuoteRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("store responded with status {0}")]
    Status(u16),
}

/// Seam for quote persistence. The pipeline only ever sees this trait, so
/// tests substitute an in-memory fake.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    async fn persist(&self, record: &QuoteRecord) -> Result<(), StoreError>;
}

pub struct HttpQuoteStore {
    http: Client,
    base_url: String,
}

impl HttpQuoteStore {
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let http = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_owned() })
    }
}

#[async_trait]
impl QuoteStore for HttpQuoteStore {
    async fn persist(&self, record: &QuoteRecord) -> Result<(), StoreError> {
        let response =
            self.http.post(format!("{}/quotes", self.base_url)).json(record).send().await?;

        if !response.status().is_success() {
            return Err(StoreError::Status(response.status().as_u16()));
        }

        debug!(
            event_name = "store.quote.persisted",
            quote_id = %record.quote_id,
            supplier = %record.supplier_id,
            "quote persisted"
        );
        Ok(())
    }
}
