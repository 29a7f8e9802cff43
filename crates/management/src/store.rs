//! In-memory message store backed by DashMap.
//!
//! Production: replace with PostgreSQL (sqlx) or similar ACID store.
//! This provides the same `MessageStore` surface for development and testing.

use async_trait::async_trait;
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::phone::normalize_phone;
use campaign_core::store::MessageStore;
use campaign_core::types::*;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

/// Thread-safe in-memory store for campaigns, messages and jobs.
pub struct InMemoryStore {
    campaigns: DashMap<Uuid, Campaign>,
    messages: DashMap<Uuid, Message>,
    jobs: DashMap<Uuid, Job>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        info!("Message store initialized (in-memory, development mode)");
        Self {
            campaigns: DashMap::new(),
            messages: DashMap::new(),
            jobs: DashMap::new(),
        }
    }

    /// Seed one demo campaign so the server can be exercised without a
    /// creation flow.
    pub async fn seed_demo_data(&self) -> CampaignResult<Campaign> {
        let vars = |name: &str| HashMap::from([("name".to_string(), name.to_string())]);
        let campaign = self
            .create_campaign(
                "Spring launch",
                "Hi {{name}}, our spring collection is live. Reply STOP to opt out.",
                vec![
                    Recipient::new("+1 (206) 555-0100").with_variables(vars("Avery")),
                    Recipient::new("+1 (206) 555-0101").with_variables(vars("Jordan")),
                    Recipient::new("+1 (206) 555-0102"),
                ],
            )
            .await?;
        info!(campaign_id = %campaign.id, "demo campaign seeded");
        Ok(campaign)
    }

    fn campaign_messages(&self, campaign_id: Uuid) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|r| r.value().campaign_id == campaign_id)
            .map(|r| r.value().clone())
            .collect()
    }

    fn count(messages: &[Message]) -> MessageCounts {
        let by = |status| messages.iter().filter(|m| m.status == status).count() as u64;
        MessageCounts {
            pending: by(MessageStatus::Pending),
            sent: by(MessageStatus::Sent),
            failed: by(MessageStatus::Failed),
            total: messages.len() as u64,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn get_campaign(&self, id: Uuid) -> CampaignResult<Option<Campaign>> {
        Ok(self.campaigns.get(&id).map(|r| r.value().clone()))
    }

    async fn find_pending_by_campaign(&self, campaign_id: Uuid) -> CampaignResult<Vec<Message>> {
        let mut pending: Vec<Message> = self
            .campaign_messages(campaign_id)
            .into_iter()
            .filter(|m| m.status == MessageStatus::Pending)
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(pending)
    }

    async fn update_message(&self, id: Uuid, outcome: &MessageOutcome) -> CampaignResult<()> {
        let mut entry = self
            .messages
            .get_mut(&id)
            .ok_or_else(|| CampaignError::Store(format!("message {id} not found")))?;
        let m = entry.value_mut();
        match outcome {
            MessageOutcome::Sent { provider_response } => {
                m.status = MessageStatus::Sent;
                m.provider_response = Some(provider_response.clone());
            }
            MessageOutcome::Failed { error } => {
                m.status = MessageStatus::Failed;
                m.error = Some(error.clone());
            }
        }
        m.updated_at = Utc::now();
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
        Ok(job)
    }

    async fn update_job(
        &self,
        id: Uuid,
        status: JobStatus,
        finished_at: Option<DateTime<Utc>>,
        stats: JobStats,
    ) -> CampaignResult<()> {
        let mut entry = self
            .jobs
            .get_mut(&id)
            .ok_or_else(|| CampaignError::Store(format!("job {id} not found")))?;
        let job = entry.value_mut();
        job.status = status;
        job.finished_at = finished_at;
        job.stats = stats;
        Ok(())
    }

    async fn create_campaign(
        &self,
        name: &str,
        message: &str,
        recipients: Vec<Recipient>,
    ) -> CampaignResult<Campaign> {
        let normalized: Vec<(String, Option<HashMap<String, String>>)> = recipients
            .into_iter()
            .map(|r| (normalize_phone(&r.phone), r.variables))
            .filter(|(to, _)| !to.is_empty())
            .collect();

        if normalized.is_empty() {
            return Err(CampaignError::Validation(
                "No valid phone numbers provided after normalization.".to_string(),
            ));
        }

        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: name.to_string(),
            message: message.to_string(),
            created_at: now,
        };

        // Offset creation times so oldest-first order follows input order.
        for (i, (to, variables)) in normalized.into_iter().enumerate() {
            let created_at = now + Duration::microseconds(i as i64);
            let msg = Message {
                id: Uuid::new_v4(),
                campaign_id: campaign.id,
                to,
                status: MessageStatus::Pending,
                variables,
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
        let mut summaries: Vec<CampaignSummary> = self
            .campaigns
            .iter()
            .map(|r| {
                let campaign = r.value().clone();
                let counts = Self::count(&self.campaign_messages(campaign.id));
                CampaignSummary {
                    campaign,
                    total: counts.total,
                    sent: counts.sent,
                    failed: counts.failed,
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.campaign.created_at.cmp(&a.campaign.created_at));
        Ok(summaries)
    }

    async fn campaign_detail(&self, id: Uuid) -> CampaignResult<Option<CampaignDetail>> {
        let Some(campaign) = self.campaigns.get(&id).map(|r| r.value().clone()) else {
            return Ok(None);
        };
        let mut messages = self.campaign_messages(id);
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let summary = Self::count(&messages);
        Ok(Some(CampaignDetail {
            campaign,
            messages,
            summary,
        }))
    }

    async fn list_jobs(&self, limit: usize) -> CampaignResult<Vec<Job>> {
        let mut jobs: Vec<Job> = self.jobs.iter().map(|r| r.value().clone()).collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.truncate(limit);
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_campaign_normalizes_and_drops_invalid() {
        let store = InMemoryStore::new();
        let campaign = store
            .create_campaign(
                "c",
                "hi",
                vec![
                    Recipient::new("+1 (206) 555-0123"),
                    Recipient::new("n/a"),
                    Recipient::new("206.555.0199"),
                ],
            )
            .await
            .unwrap();

        let pending = store.find_pending_by_campaign(campaign.id).await.unwrap();
        let phones: Vec<&str> = pending.iter().map(|m| m.to.as_str()).collect();
        assert_eq!(phones, vec!["+12065550123", "2065550199"]);
    }

    #[tokio::test]
    async fn test_create_campaign_rejects_empty_recipients() {
        let store = InMemoryStore::new();
        let err = store
            .create_campaign("c", "hi", vec![Recipient::new("none")])
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignError::Validation(_)));
        assert!(store.list_campaigns().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pending_excludes_processed_messages() {
        let store = InMemoryStore::new();
        let campaign = store.seed_demo_data().await.unwrap();
        let pending = store.find_pending_by_campaign(campaign.id).await.unwrap();
        assert_eq!(pending.len(), 3);

        store
            .update_message(
                pending[0].id,
                &MessageOutcome::Failed {
                    error: "boom".into(),
                },
            )
            .await
            .unwrap();

        let pending = store.find_pending_by_campaign(campaign.id).await.unwrap();
        assert_eq!(pending.len(), 2);

        let detail = store.campaign_detail(campaign.id).await.unwrap().unwrap();
        assert_eq!(
            detail.summary,
            MessageCounts {
                pending: 2,
                sent: 0,
                failed: 1,
                total: 3
            }
        );
    }

    #[tokio::test]
    async fn test_update_unknown_message_is_store_error() {
        let store = InMemoryStore::new();
        let err = store
            .update_message(
                Uuid::new_v4(),
                &MessageOutcome::Sent {
                    provider_response: "ok".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignError::Store(_)));
    }

    #[tokio::test]
    async fn test_job_lifecycle_and_listing() {
        let store = InMemoryStore::new();
        let campaign_id = Uuid::new_v4();

        let running = store
            .create_job(campaign_id, JobStatus::Running, JobStats::running(2))
            .await
            .unwrap();
        assert!(running.finished_at.is_none());

        let failed = store
            .create_job(campaign_id, JobStatus::Failed, JobStats::failed("x", None))
            .await
            .unwrap();
        assert!(failed.finished_at.is_some());

        store
            .update_job(
                running.id,
                JobStatus::Finished,
                Some(Utc::now()),
                JobStats::finished(&DispatchStats::default()),
            )
            .await
            .unwrap();

        let jobs = store.list_jobs(20).await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.status.is_terminal()));
        assert_eq!(store.list_jobs(1).await.unwrap().len(), 1);
    }
}
