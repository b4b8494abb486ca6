//! Remote extraction oracle client.
//!
//! The oracle is an HTTP service that reads a whole message and answers
//! with structured price/product guesses, plus a conversational reply
//! endpoint for messages that carry no price. Its output is untrusted
//! free text and is sanitized before anything downstream sees it.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use cotiza_core::config::OracleConfig;
use cotiza_core::{ProductCategory, SupplierId};
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("oracle responded with status {0}")]
    Status(u16),
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OracleExtraction {
    #[serde(default)]
    pub has_price: bool,
    #[serde(default)]
    pub amounts: Vec<OracleAmount>,
    #[serde(default)]
    pub products: Vec<OracleProduct>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OracleAmount {
    pub value: Decimal,
    #[serde(default)]
    pub raw_text: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OracleProduct {
    /// May come back unset when the oracle cannot map the noun onto the
    /// closed taxonomy; such products are dropped by the orchestrator.
    #[serde(default)]
    pub category: Option<ProductCategory>,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OracleReply {
    #[serde(default)]
    pub reply_text: String,
    #[serde(default)]
    pub should_reply: bool,
}

#[async_trait]
pub trait OracleClient: Send + Sync {
    async fn extract_price(&self, message: &str, sender: &SupplierId)
        -> Result<OracleExtraction>;

    async fn generate_reply(
        &self,
        message: &str,
        sender: &SupplierId,
        has_price: bool,
    ) -> Result<OracleReply>;
}

#[derive(Serialize)]
struct ExtractRequest<'a> {
    message: &'a str,
    sender: &'a str,
}

#[derive(Serialize)]
struct ReplyRequest<'a> {
    message: &'a str,
    sender: &'a str,
    has_price: bool,
}

pub struct HttpOracleClient {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpOracleClient {
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let http = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
        })
    }

    /// Startup reachability check. Callers treat failure as a warning, not
    /// an error: the pipeline degrades to lexical-only extraction.
    pub async fn probe(&self) -> Result<(), OracleError> {
        let response = self.http.get(format!("{}/health", self.base_url)).send().await?;
        if !response.status().is_success() {
            return Err(OracleError::Status(response.status().as_u16()));
        }
        info!(event_name = "agent.oracle.probe_ok", base_url = %self.base_url, "oracle reachable");
        Ok(())
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let mut request = self.http.post(format!("{}{path}", self.base_url));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }
        request
    }
}

#[async_trait]
impl OracleClient for HttpOracleClient {
    async fn extract_price(
        &self,
        message: &str,
        sender: &SupplierId,
    ) -> Result<OracleExtraction> {
        let response = self
            .post("/extract-price")
            .json(&ExtractRequest { message, sender: &sender.0 })
            .send()
            .await
            .map_err(OracleError::Request)?;

        if !response.status().is_success() {
            return Err(OracleError::Status(response.status().as_u16()).into());
        }

        Ok(response.json::<OracleExtraction>().await.map_err(OracleError::Request)?)
    }

    async fn generate_reply(
        &self,
        message: &str,
        sender: &SupplierId,
        has_price: bool,
    ) -> Result<OracleReply> {
        let response = self
            .post("/generate-reply")
            .json(&ReplyRequest { message, sender: &sender.0, has_price })
            .send()
            .await
            .map_err(OracleError::Request)?;

        if !response.status().is_success() {
            return Err(OracleError::Status(response.status().as_u16()).into());
        }

        Ok(response.json::<OracleReply>().await.map_err(OracleError::Request)?)
    }
}

/// Strips control characters (newlines survive) and trims. Applied to every
/// text field the oracle returns.
pub fn sanitize(text: &str) -> String {
    text.chars().filter(|ch| !ch.is_control() || *ch == '\n').collect::<String>().trim().to_string()
}
