//! # Event Listener
//!
//! Ordered hand-off of quest events to the pipeline.
//!
//! The listener owns a bounded channel. A transport pushes either decoded
//! envelopes ([`EventListener::inject`]) or raw logs
//! ([`EventListener::process_raw_log`]), and the pipeline drains the
//! receiver in order.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Transport   │ ──▶ │   Listener   │ ──▶ │   Channel    │ ──▶ Pipeline
//! │  (logs)      │     │  (Decoder)   │     │   (Bounded)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::Address;
use crossbeam_channel::{bounded, Receiver, Sender};
use kinora_shared::EventEnvelope;
use tracing::{debug, warn};

use crate::events::RawLog;

/// Configuration for the event listener.
#[derive(Clone, Debug)]
pub struct ListenerConfig {
    /// Contract whose logs are accepted.
    pub contract_address: Address,
    /// Channel buffer size for events.
    pub channel_buffer: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            contract_address: Address::ZERO,
            channel_buffer: 1024,
        }
    }
}

/// Statistics for the event listener.
#[derive(Debug, Default)]
pub struct ListenerStats {
    /// Events queued for the pipeline.
    pub events_received: AtomicU64,
    /// Logs from another contract or that failed to decode.
    pub events_rejected: AtomicU64,
    /// Events refused because the channel was full.
    pub events_dropped: AtomicU64,
    /// Events the pipeline finished with.
    pub events_processed: AtomicU64,
}

/// Bounded queue of decoded quest events.
pub struct EventListener {
    /// Sender side of event channel.
    sender: Sender<EventEnvelope>,
    /// Receiver side of event channel.
    receiver: Receiver<EventEnvelope>,
    /// Counters.
    stats: Arc<ListenerStats>,
    /// Configuration.
    config: ListenerConfig,
}

impl EventListener {
    /// Creates a new event listener.
    #[must_use]
    pub fn new(config: ListenerConfig) -> Self {
        let (sender, receiver) = bounded(config.channel_buffer);

        Self {
            sender,
            receiver,
            stats: Arc::new(ListenerStats::default()),
            config,
        }
    }

    /// Returns a clone of the event receiver.
    #[must_use]
    pub fn receiver(&self) -> Receiver<EventEnvelope> {
        self.receiver.clone()
    }

    /// Returns a reference to the statistics.
    #[must_use]
    pub fn stats(&self) -> Arc<ListenerStats> {
        Arc::clone(&self.stats)
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ListenerConfig {
        &self.config
    }

    /// Number of queued events.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Queues a decoded event.
    ///
    /// Returns `false` if the channel is full; the caller should drain the
    /// pipeline and try again.
    pub fn inject(&self, envelope: EventEnvelope) -> bool {
        if self.sender.try_send(envelope).is_ok() {
            self.stats.events_received.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            self.stats.events_dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Decodes a raw log and queues the event.
    ///
    /// Logs emitted by other contracts and undecodable logs are rejected.
    ///
    /// # Returns
    ///
    /// `true` if the event was decoded and queued.
    pub fn process_raw_log(&self, log: &RawLog) -> bool {
        if log.address != self.config.contract_address {
            debug!(address = %log.address, "log from foreign contract ignored");
            self.stats.events_rejected.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        match log.decode() {
            Ok(envelope) => self.inject(envelope),
            Err(err) => {
                warn!(
                    tx = %log.transaction_hash,
                    log_index = log.log_index,
                    error = %err,
                    "undecodable log skipped"
                );
                self.stats.events_rejected.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Counts one event as handled by the pipeline.
    pub fn record_processed(&self) {
        self.stats.events_processed.fetch_add(1, Ordering::Relaxed);
    }
}
