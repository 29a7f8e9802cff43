//! Dispatch workers — a fixed-size pool draining a queue of pre-snapshotted
//! pending messages. Each worker owns one message at a time from claim to
//! persisted outcome.

use crate::dispatcher::DispatchSettings;
use campaign_channels::DeliveryProvider;
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::store::MessageStore;
use campaign_core::templates::render_template;
use campaign_core::text::truncate_chars;
use campaign_core::types::{
    DispatchStats, Message, MessageOutcome, TEST_MODE_RESPONSE, UNSUBSCRIBED_ERROR,
};
use campaign_intelligent_delivery::UnsubscribeFilter;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Run-scoped outcome counters shared by all workers.
#[derive(Debug, Default)]
pub struct DispatchCounters {
    sent: AtomicU64,
    failed: AtomicU64,
    skipped_unsubscribed: AtomicU64,
}

impl DispatchCounters {
    pub fn snapshot(&self, total: u64) -> DispatchStats {
        DispatchStats {
            total,
            sent: self.sent.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            skipped_unsubscribed: self.skipped_unsubscribed.load(Ordering::Acquire),
        }
    }
}

/// What happened to one message, as seen by the worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Processed {
    Skipped,
    Sent { paced: bool },
    Failed,
}

/// Everything a worker needs, shared behind one `Arc` for the run.
pub struct WorkerPool {
    store: Arc<dyn MessageStore>,
    /// `None` in test mode.
    provider: Option<Arc<dyn DeliveryProvider>>,
    filter: UnsubscribeFilter,
    template: String,
    settings: DispatchSettings,
    queue: Mutex<VecDeque<Message>>,
    counters: DispatchCounters,
    first_error: Mutex<Option<CampaignError>>,
}

impl WorkerPool {
    pub fn new(
        store: Arc<dyn MessageStore>,
        provider: Option<Arc<dyn DeliveryProvider>>,
        filter: UnsubscribeFilter,
        template: String,
        settings: DispatchSettings,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            store,
            provider,
            filter,
            template,
            settings,
            queue: Mutex::new(messages.into()),
            counters: DispatchCounters::default(),
            first_error: Mutex::new(None),
        }
    }

    /// Drain the queue with at most `settings.concurrency` workers and wait
    /// for all of them. Returns the counts gathered and, if any worker hit a
    /// run-level error, the first such error.
    pub async fn run(self: Arc<Self>, total: u64) -> (DispatchStats, Option<CampaignError>) {
        let workers = self.settings.concurrency.max(1).min(self.queue.lock().len());

        let handles: Vec<JoinHandle<()>> = (0..workers)
            .map(|worker_id| {
                let pool = self.clone();
                tokio::spawn(async move { pool.work(worker_id).await })
            })
            .collect();

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "dispatch worker panicked");
                self.record_error(CampaignError::Internal(anyhow::anyhow!(
                    "dispatch worker panicked: {e}"
                )));
            }
        }

        let stats = self.counters.snapshot(total);
        let first_error = self.first_error.lock().take();
        (stats, first_error)
    }

    async fn work(&self, worker_id: usize) {
        debug!(worker_id, "dispatch worker started");
        loop {
            let next = self.queue.lock().pop_front();
            let Some(message) = next else {
                break;
            };

            match self.process(&message).await {
                Ok(Processed::Sent { paced: true }) if !self.settings.pacing.is_zero() => {
                    tokio::time::sleep(self.settings.pacing).await;
                }
                Ok(_) => {}
                Err(e) => {
                    error!(
                        worker_id,
                        message_id = %message.id,
                        error = %e,
                        "could not record message outcome"
                    );
                    self.record_error(e);
                }
            }
        }
        debug!(worker_id, "dispatch worker drained");
    }

    async fn process(&self, message: &Message) -> CampaignResult<Processed> {
        if self.filter.is_suppressed(&message.to) {
            self.persist(
                message,
                MessageOutcome::Failed {
                    error: UNSUBSCRIBED_ERROR.to_string(),
                },
            )
            .await?;
            self.counters.failed.fetch_add(1, Ordering::AcqRel);
            self.counters
                .skipped_unsubscribed
                .fetch_add(1, Ordering::AcqRel);
            return Ok(Processed::Skipped);
        }

        let text = render_template(&self.template, message.variables.as_ref());

        let Some(provider) = &self.provider else {
            self.persist(
                message,
                MessageOutcome::Sent {
                    provider_response: TEST_MODE_RESPONSE.to_string(),
                },
            )
            .await?;
            self.counters.sent.fetch_add(1, Ordering::AcqRel);
            return Ok(Processed::Sent { paced: false });
        };

        let outcome = match provider.send(&message.to, &text).await {
            Ok(resp) if resp.accepted => MessageOutcome::Sent {
                provider_response: truncate_chars(&resp.body, self.settings.max_response_len),
            },
            Ok(resp) => MessageOutcome::Failed {
                error: truncate_chars(&resp.body, self.settings.max_error_len),
            },
            Err(e) => {
                warn!(message_id = %message.id, to = %message.to, error = %e, "SMS send failed");
                MessageOutcome::Failed {
                    error: truncate_chars(&e.to_string(), self.settings.max_error_len),
                }
            }
        };

        let processed = match &outcome {
            MessageOutcome::Sent { .. } => Processed::Sent { paced: true },
            MessageOutcome::Failed { .. } => Processed::Failed,
        };
        self.persist(message, outcome).await?;

        match processed {
            Processed::Sent { .. } => self.counters.sent.fetch_add(1, Ordering::AcqRel),
            _ => self.counters.failed.fetch_add(1, Ordering::AcqRel),
        };
        Ok(processed)
    }

    async fn persist(&self, message: &Message, outcome: MessageOutcome) -> CampaignResult<()> {
        let status = outcome.status();
        self.store.update_message(message.id, &outcome).await?;
        metrics::counter!("dispatch.messages", "status" => status.as_str()).increment(1);
        debug!(message_id = %message.id, to = %message.to, status = status.as_str(), "message outcome recorded");
        Ok(())
    }

    fn record_error(&self, e: CampaignError) {
        let mut slot = self.first_error.lock();
        if slot.is_none() {
            *slot = Some(e);
        }
    }
}
