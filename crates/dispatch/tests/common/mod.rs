//! Fake collaborators for dispatch tests.

#![allow(dead_code)]

use async_trait::async_trait;
use campaign_channels::{DeliveryError, DeliveryProvider, DeliveryResponse};
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::phone::normalize_phone;
use campaign_core::store::MessageStore;
use campaign_core::types::*;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

// ─── Store ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeStore {
    campaigns: DashMap<Uuid, Campaign>,
    messages: DashMap<Uuid, Message>,
    jobs: DashMap<Uuid, Job>,
    message_writes: DashMap<Uuid, usize>,
    job_transitions: Mutex<Vec<(Uuid, JobStatus)>>,
    pub fail_campaign_lookup: AtomicBool,
    pub fail_pending_lookup: AtomicBool,
    pub fail_job_finish: AtomicBool,
    fail_update_for: Mutex<Option<String>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a campaign with `count` recipients `+1555000NNNN`.
    pub async fn seed(&self, template: &str, count: usize) -> Uuid {
        let recipients = (0..count).map(|i| Recipient::new(phone(i))).collect();
        self.create_campaign("test", template, recipients)
            .await
            .unwrap()
            .id
    }

    pub fn fail_update_for(&self, phone: &str) {
        *self.fail_update_for.lock().unwrap() = Some(phone.to_string());
    }

    pub fn messages(&self, campaign_id: Uuid) -> Vec<Message> {
        let mut out: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.campaign_id == campaign_id)
            .map(|m| m.value().clone())
            .collect();
        out.sort_by_key(|m| m.created_at);
        out
    }

    pub fn message_by_phone(&self, phone: &str) -> Message {
        self.messages
            .iter()
            .find(|m| m.to == phone)
            .map(|m| m.value().clone())
            .expect("no message for phone")
    }

    pub fn writes_for(&self, id: Uuid) -> usize {
        self.message_writes.get(&id).map(|c| *c).unwrap_or(0)
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.jobs.iter().map(|j| j.value().clone()).collect()
    }

    pub fn job(&self, id: Uuid) -> Job {
        self.jobs.get(&id).map(|j| j.value().clone()).expect("no job")
    }

    pub fn transitions(&self) -> Vec<(Uuid, JobStatus)> {
        self.job_transitions.lock().unwrap().clone()
    }
}

pub fn phone(i: usize) -> String {
    format!("+1555000{i:04}")
}

#[async_trait]
impl MessageStore for FakeStore {
    async fn get_campaign(&self, id: Uuid) -> CampaignResult<Option<Campaign>> {
        if self.fail_campaign_lookup.load(Ordering::SeqCst) {
            return Err(CampaignError::Config("campaign table not provisioned".into()));
        }
        Ok(self.campaigns.get(&id).map(|c| c.value().clone()))
    }

    async fn find_pending_by_campaign(&self, campaign_id: Uuid) -> CampaignResult<Vec<Message>> {
        if self.fail_pending_lookup.load(Ordering::SeqCst) {
            return Err(CampaignError::Store("database unavailable".into()));
        }
        Ok(self
            .messages(campaign_id)
            .into_iter()
            .filter(|m| m.status == MessageStatus::Pending)
            .collect())
    }

    async fn update_message(&self, id: Uuid, outcome: &MessageOutcome) -> CampaignResult<()> {
        tokio::task::yield_now().await;
        let mut entry = self
            .messages
            .get_mut(&id)
            .ok_or_else(|| CampaignError::Store(format!("message {id} missing")))?;
        if self.fail_update_for.lock().unwrap().as_deref() == Some(entry.to.as_str()) {
            return Err(CampaignError::Store("write rejected".into()));
        }
        match outcome {
            MessageOutcome::Sent { provider_response } => {
                entry.status = MessageStatus::Sent;
                entry.provider_response = Some(provider_response.clone());
            }
            MessageOutcome::Failed { error } => {
                entry.status = MessageStatus::Failed;
                entry.error = Some(error.clone());
            }
        }
        entry.updated_at = Utc::now();
        *self.message_writes.entry(id).or_insert(0) += 1;
        Ok(())
    }

    async fn create_job(
        &self,
        campaign_id: Uuid,
        status: JobStatus,
        stats: JobStats,
    ) -> CampaignResult<Job> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            job_type: JobType::CampaignSend,
            campaign_id,
            status,
            stats,
            created_at: now,
            finished_at: status.is_terminal().then_some(now),
        };
        self.jobs.insert(job.id, job.clone());
        self.job_transitions.lock().unwrap().push((job.id, status));
        Ok(job)
    }

    async fn update_job(
        &self,
        id: Uuid,
        status: JobStatus,
        finished_at: Option<DateTime<Utc>>,
        stats: JobStats,
    ) -> CampaignResult<()> {
        if status == JobStatus::Finished && self.fail_job_finish.load(Ordering::SeqCst) {
            return Err(CampaignError::Store("job table locked".into()));
        }
        let mut job = self
            .jobs
            .get_mut(&id)
            .ok_or_else(|| CampaignError::Store(format!("job {id} missing")))?;
        job.status = status;
        job.finished_at = finished_at;
        job.stats = stats;
        self.job_transitions.lock().unwrap().push((id, status));
        Ok(())
    }

    async fn create_campaign(
        &self,
        name: &str,
        message: &str,
        recipients: Vec<Recipient>,
    ) -> CampaignResult<Campaign> {
        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: name.to_string(),
            message: message.to_string(),
            created_at: now,
        };
        for (i, r) in recipients.into_iter().enumerate() {
            let created_at = now + ChronoDuration::milliseconds(i as i64);
            let msg = Message {
                id: Uuid::new_v4(),
                campaign_id: campaign.id,
                to: normalize_phone(&r.phone),
                status: MessageStatus::Pending,
                variables: r.variables,
                error: None,
                provider_response: None,
                created_at,
                updated_at: created_at,
            };
            self.messages.insert(msg.id, msg);
        }
        self.campaigns.insert(campaign.id, campaign.clone());
        Ok(campaign)
    }

    async fn list_campaigns(&self) -> CampaignResult<Vec<CampaignSummary>> {
        Ok(Vec::new())
    }

    async fn campaign_detail(&self, _id: Uuid) -> CampaignResult<Option<CampaignDetail>> {
        Ok(None)
    }

    async fn list_jobs(&self, _limit: usize) -> CampaignResult<Vec<Job>> {
        Ok(self.jobs())
    }
}

// ─── Provider ──────────────────────────────────────────────────────────────

/// Provider that records calls and the peak number of concurrent sends.
#[derive(Default)]
pub struct RecordingProvider {
    delay: Duration,
    reject: HashMap<String, String>,
    transport_fail: HashSet<String>,
    accept_body: String,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self {
            accept_body: r#"{"status":"queued"}"#.to_string(),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn rejecting(mut self, phone: &str, body: &str) -> Self {
        self.reject.insert(phone.to_string(), body.to_string());
        self
    }

    pub fn failing_transport(mut self, phone: &str) -> Self {
        self.transport_fail.insert(phone.to_string());
        self
    }

    pub fn with_accept_body(mut self, body: &str) -> Self {
        self.accept_body = body.to_string();
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryProvider for RecordingProvider {
    async fn send(&self, to: &str, text: &str) -> Result<DeliveryResponse, DeliveryError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap()
            .push((to.to_string(), text.to_string()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.transport_fail.contains(to) {
            return Err(DeliveryError::Transport("connection reset by peer".into()));
        }
        if let Some(body) = self.reject.get(to) {
            return Ok(DeliveryResponse::rejected(body.clone()));
        }
        Ok(DeliveryResponse::accepted(self.accept_body.clone()))
    }
}
