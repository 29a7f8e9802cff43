//! Collaborator traits the dispatch engine is written against.
//!
//! Persistence technology is not this crate's concern: an in-memory
//! implementation lives in `campaign-management`, and a database-backed one
//! only has to honour the same contracts.

use crate::error::CampaignResult;
use crate::types::{
    Campaign, CampaignDetail, CampaignSummary, Job, JobStats, JobStatus, Message, MessageOutcome,
    Recipient,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// Persisted campaigns, messages and jobs.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn get_campaign(&self, id: Uuid) -> CampaignResult<Option<Campaign>>;

    /// Pending messages for a campaign, oldest first.
    async fn find_pending_by_campaign(&self, campaign_id: Uuid) -> CampaignResult<Vec<Message>>;

    /// Record the terminal outcome of one message.
    async fn update_message(&self, id: Uuid, outcome: &MessageOutcome) -> CampaignResult<()>;

    async fn create_job(
        &self,
        campaign_id: Uuid,
        status: JobStatus,
        stats: JobStats,
    ) -> CampaignResult<Job>;

    async fn update_job(
        &self,
        id: Uuid,
        status: JobStatus,
        finished_at: Option<DateTime<Utc>>,
        stats: JobStats,
    ) -> CampaignResult<()>;

    /// Create a campaign with one pending message per recipient whose phone
    /// survives normalization.
    async fn create_campaign(
        &self,
        name: &str,
        message: &str,
        recipients: Vec<Recipient>,
    ) -> CampaignResult<Campaign>;

    /// Newest first.
    async fn list_campaigns(&self) -> CampaignResult<Vec<CampaignSummary>>;

    async fn campaign_detail(&self, id: Uuid) -> CampaignResult<Option<CampaignDetail>>;

    /// Newest first, at most `limit`.
    async fn list_jobs(&self, limit: usize) -> CampaignResult<Vec<Job>>;
}

/// Set of normalized phones that must never be sent to.
#[async_trait]
pub trait UnsubscribeRegistry: Send + Sync {
    async fn list_all(&self) -> CampaignResult<HashSet<String>>;

    /// Normalize and insert `phone`. Re-adding an existing phone is a no-op.
    /// Returns the normalized key.
    async fn add(&self, phone: &str) -> CampaignResult<String>;
}
