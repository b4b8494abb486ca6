//! Per-sender serialization.
//!
//! Each supplier gets a dedicated lane: an unbounded channel drained by one
//! task, so that supplier's messages are processed strictly in arrival
//! order while different suppliers interleave freely.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cotiza_agent::OracleClient;
use cotiza_core::SupplierId;
use tokio::sync::mpsc;
use tracing::debug;

use crate::pipeline::MessageProcessor;
use crate::transport::{AttachmentPayload, InboundMessage};

pub struct SenderRouter<O> {
    processor: Arc<MessageProcessor<O>>,
    lanes: Mutex<HashMap<SupplierId, mpsc::UnboundedSender<InboundMessage>>>,
}

impl<O: OracleClient + 'static> SenderRouter<O> {
    pub fn new(processor: Arc<MessageProcessor<O>>) -> Self {
        Self { processor, lanes: Mutex::new(HashMap::new()) }
    }

    /// Queues one message onto its sender's lane, creating the lane (and
    /// its worker task) on first contact.
    pub fn dispatch(&self, message: InboundMessage) {
        let sender = message.sender_id.clone();
        let mut lanes = match self.lanes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let lane = lanes.entry(sender.clone()).or_insert_with(|| {
            debug!(event_name = "ingest.router.lane_opened", supplier = %sender, "lane opened");
            self.spawn_lane()
        });

        if let Err(mpsc::error::SendError(returned)) = lane.send(message) {
            // The worker ended; open a fresh lane and requeue.
            lanes.remove(&sender);
            drop(lanes);
            self.dispatch(returned);
        }
    }

    /// Routes an image event into the sender's pending-attachment slot. It
    /// rides the same lane as text messages so an image sent right before
    /// a priced message is parked before that message is processed.
    pub fn register_attachment(&self, sender: SupplierId, attachment: AttachmentPayload) {
        self.dispatch(InboundMessage::image(sender, attachment));
    }

    fn spawn_lane(&self) -> mpsc::UnboundedSender<InboundMessage> {
        let (lane, mut inbox) = mpsc::unbounded_channel::<InboundMessage>();
        let processor = self.processor.clone();
        tokio::spawn(async move {
            while let Some(message) = inbox.recv().await {
                processor.process(message).await;
            }
        });
        lane
    }
}
