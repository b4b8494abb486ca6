use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use cotiza_agent::{ExtractionOrchestrator, HttpOracleClient, OracleError};
use cotiza_core::config::{AppConfig, ConfigError, LoadOptions};
use cotiza_core::{ConversationLedger, QuoteThrottle, SupplierId};
use cotiza_ingest::{
    InMemoryContactDirectory, MessageProcessor, PendingAttachments, PipelineSettings, ReplySender,
    SenderRouter, TypingDelay,
};
use cotiza_store::{BackupLog, HttpQuoteStore, StoreError};
use thiserror::Error;
use tracing::{info, warn};

pub struct Application {
    pub config: AppConfig,
    pub router: Arc<SenderRouter<HttpOracleClient>>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("oracle client construction failed: {0}")]
    Oracle(#[from] OracleError),
    #[error("quote store construction failed: {0}")]
    Store(#[from] StoreError),
}

/// Outbound reply sink used while no chat transport is wired in. Replies
/// are logged and dropped.
#[derive(Debug, Default)]
pub struct NoopReplySender;

#[async_trait::async_trait]
impl ReplySender for NoopReplySender {
    async fn send(&self, recipient: &SupplierId, body: &str) -> anyhow::Result<()> {
        info!(
            event_name = "system.reply.noop",
            recipient = %recipient,
            body,
            "reply dropped (noop transport)"
        );
        Ok(())
    }
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let oracle = HttpOracleClient::from_config(&config.oracle)?;
    if let Err(probe_error) = oracle.probe().await {
        // Extraction degrades to lexical-only until the oracle recovers.
        warn!(
            event_name = "system.bootstrap.oracle_unreachable",
            correlation_id = "bootstrap",
            error = %probe_error,
            "oracle probe failed, continuing"
        );
    }

    let store = HttpQuoteStore::from_config(&config.store)?;
    let backup = BackupLog::new(config.store.backup_path.clone());

    let orchestrator =
        ExtractionOrchestrator::new(oracle, Duration::from_secs(config.oracle.timeout_secs));
    let processor = Arc::new(MessageProcessor::new(
        orchestrator,
        Arc::new(ConversationLedger::new(config.ledger.capacity)),
        Arc::new(QuoteThrottle::new()),
        Arc::new(store),
        backup,
        Arc::new(NoopReplySender),
        Arc::new(InMemoryContactDirectory::new()),
        Arc::new(PendingAttachments::default()),
        PipelineSettings {
            throttle_window: ChronoDuration::seconds(config.throttle.window_secs as i64),
            typing: TypingDelay::new(config.reply.typing_min_ms, config.reply.typing_max_ms),
        },
    ));
    let router = Arc::new(SenderRouter::new(processor));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        "application bootstrap complete"
    );

    Ok(Application { config, router })
}
