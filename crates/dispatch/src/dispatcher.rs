//! Dispatcher — runs one campaign send: snapshot pending messages, fan out
//! over the worker pool, aggregate, and close the job.

use crate::job::JobTracker;
use crate::worker::WorkerPool;
use campaign_channels::DeliveryProvider;
use campaign_core::config::DispatchConfig;
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::store::{MessageStore, UnsubscribeRegistry};
use campaign_core::types::{Campaign, DispatchStats};
use campaign_intelligent_delivery::UnsubscribeFilter;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// Whether a run contacts the delivery provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    Live,
    /// Full bookkeeping, no provider calls.
    Test,
}

impl DispatchMode {
    pub fn from_test_flag(test_mode: bool) -> Self {
        if test_mode {
            DispatchMode::Test
        } else {
            DispatchMode::Live
        }
    }
}

/// Tunables for one dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub concurrency: usize,
    pub pacing: Duration,
    pub max_error_len: usize,
    pub max_response_len: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}

impl From<&DispatchConfig> for DispatchSettings {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            pacing: config.pacing(),
            max_error_len: config.max_error_len,
            max_response_len: config.max_response_len,
        }
    }
}

/// Campaign dispatch engine.
pub struct Dispatcher {
    store: Arc<dyn MessageStore>,
    registry: Arc<dyn UnsubscribeRegistry>,
    provider: Option<Arc<dyn DeliveryProvider>>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn MessageStore>,
        registry: Arc<dyn UnsubscribeRegistry>,
        settings: DispatchSettings,
    ) -> Self {
        info!(
            concurrency = settings.concurrency,
            pacing_ms = settings.pacing.as_millis() as u64,
            "Dispatcher initialized"
        );
        Self {
            store,
            registry,
            provider: None,
            settings,
        }
    }

    /// Attach the delivery provider used by live runs.
    pub fn with_provider(mut self, provider: Arc<dyn DeliveryProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Send every pending message of `campaign_id`.
    ///
    /// A live run without a provider and an unknown campaign both fail
    /// before any job exists. Any other error closes the job as failed (or
    /// records a failed job if none was opened) and is then returned.
    ///
    /// The run itself executes on its own task. Dropping the returned future
    /// detaches from the run without cancelling it: every snapshot message is
    /// still processed and the job is still closed with the real counts.
    pub async fn dispatch(
        &self,
        campaign_id: Uuid,
        mode: DispatchMode,
    ) -> CampaignResult<DispatchStats> {
        let start = Instant::now();

        let provider = match mode {
            DispatchMode::Test => None,
            DispatchMode::Live => Some(self.provider.clone().ok_or_else(|| {
                CampaignError::Config("SMS provider configuration missing".to_string())
            })?),
        };

        let run = CampaignRun {
            store: self.store.clone(),
            registry: self.registry.clone(),
            provider,
            settings: self.settings.clone(),
            campaign_id,
        };
        let result = match tokio::spawn(run.execute()).await {
            Ok(result) => result,
            Err(e) => Err(CampaignError::Internal(anyhow::anyhow!(
                "dispatch run panicked: {e}"
            ))),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        metrics::histogram!("dispatch.run_duration_ms").record(elapsed_ms as f64);

        match &result {
            Ok(stats) => {
                metrics::counter!("dispatch.runs", "outcome" => "finished").increment(1);
                info!(
                    campaign_id = %campaign_id,
                    test_mode = mode == DispatchMode::Test,
                    total = stats.total,
                    sent = stats.sent,
                    failed = stats.failed,
                    skipped_unsubscribed = stats.skipped_unsubscribed,
                    elapsed_ms,
                    "Campaign dispatch completed"
                );
            }
            Err(e) => {
                metrics::counter!("dispatch.runs", "outcome" => "failed").increment(1);
                warn!(campaign_id = %campaign_id, error = %e, elapsed_ms, "Campaign dispatch failed");
            }
        }

        result
    }
}

/// One dispatch run, owned by the task that executes it.
struct CampaignRun {
    store: Arc<dyn MessageStore>,
    registry: Arc<dyn UnsubscribeRegistry>,
    /// `None` in test mode.
    provider: Option<Arc<dyn DeliveryProvider>>,
    settings: DispatchSettings,
    campaign_id: Uuid,
}

impl CampaignRun {
    async fn execute(self) -> CampaignResult<DispatchStats> {
        let mut tracker = JobTracker::new(self.store.clone(), self.campaign_id);

        // An absent campaign is the only outcome here that must not leave a
        // job behind; a failing lookup is recorded like any other error.
        let campaign = match self.store.get_campaign(self.campaign_id).await {
            Ok(Some(campaign)) => campaign,
            Ok(None) => return Err(CampaignError::CampaignNotFound(self.campaign_id)),
            Err(e) => {
                tracker.fail(&e, None).await;
                return Err(e);
            }
        };

        match self.run(&mut tracker, campaign).await {
            Ok(stats) => match tracker.finish(&stats).await {
                Ok(()) => Ok(stats),
                Err(e) => {
                    tracker.fail(&e, Some(&stats)).await;
                    Err(e)
                }
            },
            Err(e) => {
                tracker.fail(&e, None).await;
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        tracker: &mut JobTracker,
        campaign: Campaign,
    ) -> CampaignResult<DispatchStats> {
        let campaign_id = campaign.id;
        let pending = self.store.find_pending_by_campaign(campaign_id).await?;
        let filter = UnsubscribeFilter::load(self.registry.as_ref()).await?;
        let total = pending.len() as u64;

        let job_id = tracker.open(total).await?;
        info!(
            campaign_id = %campaign_id,
            job_id = %job_id,
            pending = total,
            unsubscribed = filter.len(),
            "Dispatching campaign"
        );

        let pool = Arc::new(WorkerPool::new(
            self.store.clone(),
            self.provider.clone(),
            filter,
            campaign.message,
            self.settings.clone(),
            pending,
        ));
        let (stats, first_error) = pool.run(total).await;

        if let Some(e) = first_error {
            tracker.fail(&e, Some(&stats)).await;
            return Err(e);
        }
        Ok(stats)
    }
}
