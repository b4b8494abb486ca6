//! The message processing pipeline.
//!
//! One call to [`MessageProcessor::process`] handles one inbound message
//! end to end: ledger append, extraction, assembly, persistence, backup,
//! and the outbound reply. Nothing in here returns an error to the caller;
//! every failure is logged and the pipeline moves to the next message.

use std::sync::Arc;

use chrono::{Duration, Utc};
use cotiza_agent::{ExtractionOrchestrator, OracleClient};
use cotiza_core::{
    AssembleInput, ConversationEntry, ConversationLedger, Quote, QuoteAssembler, QuoteThrottle,
    SupplierId,
};
use cotiza_store::{BackupEntry, BackupLog, QuoteRecord, QuoteStore};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::attachments::PendingAttachments;
use crate::contacts::ContactDirectory;
use crate::transport::{InboundMessage, MessageKind, ReplySender, TypingDelay};

/// Closing acknowledgement sent after quotes are captured, at most once per
/// throttle window per supplier.
const CLOSING_ACK: &str = "Listo, gracias por los precios. Los vamos a revisar y te contactamos \
                           en los próximos días para confirmar todo.";

/// Ledger note recorded when an image arrives, so the conversation history
/// reflects the attachment even though its bytes stay with the transport.
const IMAGE_NOTE: &str = "[imagen recibida]";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Empty or unusable message; nothing happened.
    Ignored,
    /// An image was parked in the sender's pending slot.
    AttachmentStored,
    /// The message carried prices and quotes were assembled.
    QuotesCaptured { persisted: usize, failed: usize, acknowledged: bool },
    /// No price found; the conversation continued (maybe silently).
    Continued { replied: bool },
}

#[derive(Clone, Copy, Debug)]
pub struct PipelineSettings {
    pub throttle_window: Duration,
    pub typing: TypingDelay,
}

pub struct MessageProcessor<O> {
    orchestrator: ExtractionOrchestrator<O>,
    assembler: QuoteAssembler,
    ledger: Arc<ConversationLedger>,
    throttle: Arc<QuoteThrottle>,
    store: Arc<dyn QuoteStore>,
    backup: BackupLog,
    replies: Arc<dyn ReplySender>,
    contacts: Arc<dyn ContactDirectory>,
    attachments: Arc<PendingAttachments>,
    settings: PipelineSettings,
}

impl<O: OracleClient> MessageProcessor<O> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orchestrator: ExtractionOrchestrator<O>,
        ledger: Arc<ConversationLedger>,
        throttle: Arc<QuoteThrottle>,
        store: Arc<dyn QuoteStore>,
        backup: BackupLog,
        replies: Arc<dyn ReplySender>,
        contacts: Arc<dyn ContactDirectory>,
        attachments: Arc<PendingAttachments>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            orchestrator,
            assembler: QuoteAssembler::new(),
            ledger,
            throttle,
            store,
            backup,
            replies,
            contacts,
            attachments,
            settings,
        }
    }

    pub async fn process(&self, message: InboundMessage) -> ProcessOutcome {
        let correlation_id = Uuid::new_v4();
        let sender = message.sender_id.clone();

        if message.kind == MessageKind::Image {
            return self.park_attachment(&message, correlation_id);
        }

        let body = message.body.trim();
        if body.is_empty() {
            return ProcessOutcome::Ignored;
        }

        info!(
            event_name = "ingest.message.received",
            correlation_id = %correlation_id,
            supplier = %sender,
            kind = ?message.kind,
            "processing inbound message"
        );

        self.ledger.append(&sender, ConversationEntry::counterparty(body, message.received_at));

        let extraction = self.orchestrator.extract(body, &sender).await;
        if extraction.has_price {
            self.capture_quotes(&message, body, extraction, correlation_id).await
        } else {
            self.continue_conversation(&sender, body, correlation_id).await
        }
    }

    fn park_attachment(
        &self,
        message: &InboundMessage,
        correlation_id: Uuid,
    ) -> ProcessOutcome {
        let Some(attachment) = &message.attachment else {
            return ProcessOutcome::Ignored;
        };

        self.attachments.store(
            &message.sender_id,
            attachment.image_reference.clone(),
            attachment.category_hint,
            message.received_at,
        );
        self.ledger.append(
            &message.sender_id,
            ConversationEntry::counterparty(IMAGE_NOTE, message.received_at),
        );

        info!(
            event_name = "ingest.attachment.parked",
            correlation_id = %correlation_id,
            supplier = %message.sender_id,
            "image parked for next priced message"
        );
        ProcessOutcome::AttachmentStored
    }

    async fn capture_quotes(
        &self,
        message: &InboundMessage,
        body: &str,
        extraction: cotiza_agent::Extraction,
        correlation_id: Uuid,
    ) -> ProcessOutcome {
        let sender = &message.sender_id;
        let supplier_name = match self.contacts.lookup(sender).await {
            Some(name) => name,
            None => sender.fallback_display_name(),
        };
        let pending = self.attachments.take(sender, message.received_at);
        let method = extraction.method;

        let amounts = extraction.amounts.clone();
        let mut quotes = self.assembler.assemble(AssembleInput {
            supplier_id: sender.clone(),
            supplier_name,
            message: body.to_owned(),
            amounts: extraction.amounts,
            products: extraction.products,
            arrival: message.received_at,
            category_hint: pending.as_ref().and_then(|attachment| attachment.category_hint),
        });

        if let Some(attachment) = &pending {
            for quote in &mut quotes {
                if let Err(attach_error) = quote.attach_image(attachment.image_reference.as_str()) {
                    warn!(
                        event_name = "ingest.attachment.attach_failed",
                        correlation_id = %correlation_id,
                        quote_id = %quote.id,
                        error = %attach_error,
                        "pending image not attached"
                    );
                }
            }
        }

        let mut persisted = 0usize;
        let mut failed = 0usize;
        for quote in &quotes {
            match self.store.persist(&QuoteRecord::from(quote)).await {
                Ok(()) => persisted += 1,
                Err(store_error) => {
                    failed += 1;
                    warn!(
                        event_name = "ingest.quote.persist_failed",
                        correlation_id = %correlation_id,
                        quote_id = %quote.id,
                        error = %store_error,
                        "quote persistence failed, continuing with siblings"
                    );
                }
            }
        }

        self.append_backup(sender, body, &amounts, &quotes, message, correlation_id).await;

        // The stamp is refreshed on every priced message, not only when an
        // ack goes out, so the quiet period slides while prices keep coming.
        let now = Utc::now();
        let recently_quoted =
            self.throttle.was_quoted_recently(sender, self.settings.throttle_window, now);
        self.throttle.mark_quoted(sender, now);
        let acknowledged = if recently_quoted {
            false
        } else {
            self.send_reply(sender, CLOSING_ACK, correlation_id).await
        };

        info!(
            event_name = "ingest.quotes.captured",
            correlation_id = %correlation_id,
            supplier = %sender,
            method = method.as_str(),
            quotes = quotes.len(),
            persisted,
            failed,
            acknowledged,
            "quotes captured"
        );
        ProcessOutcome::QuotesCaptured { persisted, failed, acknowledged }
    }

    async fn append_backup(
        &self,
        sender: &SupplierId,
        body: &str,
        amounts: &[cotiza_core::ExtractedAmount],
        quotes: &[Quote],
        message: &InboundMessage,
        correlation_id: Uuid,
    ) {
        let mut product_flags: Vec<String> = Vec::new();
        for quote in quotes {
            let Some(category) = quote.category else { continue };
            let label = category.as_str().to_owned();
            if !product_flags.contains(&label) {
                product_flags.push(label);
            }
        }

        let entry = BackupEntry {
            supplier_id: sender.0.clone(),
            raw_message: body.to_owned(),
            amounts: amounts.iter().map(|amount| amount.value).collect(),
            product_flags,
            timestamp: message.received_at,
        };

        if let Err(io_error) = self.backup.append(&entry).await {
            error!(
                event_name = "ingest.backup.append_failed",
                correlation_id = %correlation_id,
                supplier = %sender,
                error = %io_error,
                "backup log append failed"
            );
        }
    }

    async fn continue_conversation(
        &self,
        sender: &SupplierId,
        body: &str,
        correlation_id: Uuid,
    ) -> ProcessOutcome {
        let Some(reply) = self.orchestrator.continuation_reply(body, sender, false).await else {
            return ProcessOutcome::Continued { replied: false };
        };

        let replied = self.send_reply(sender, &reply, correlation_id).await;
        ProcessOutcome::Continued { replied }
    }

    /// Sends one outbound reply after the typing delay and records it in
    /// the ledger. Returns false when delivery failed.
    async fn send_reply(&self, sender: &SupplierId, body: &str, correlation_id: Uuid) -> bool {
        self.settings.typing.wait().await;
        match self.replies.send(sender, body).await {
            Ok(()) => {
                self.ledger.append(sender, ConversationEntry::system(body, Utc::now()));
                true
            }
            Err(send_error) => {
                warn!(
                    event_name = "ingest.reply.send_failed",
                    correlation_id = %correlation_id,
                    supplier = %sender,
                    error = %send_error,
                    "outbound reply failed"
                );
                false
            }
        }
    }
}
