use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Provider response recorded for messages "sent" in test mode.
pub const TEST_MODE_RESPONSE: &str = "Test mode - not sent";

/// Error recorded for recipients found in the unsubscribe registry.
pub const UNSUBSCRIBED_ERROR: &str = "Recipient unsubscribed";

// ─── Campaign ──────────────────────────────────────────────────────────────

/// A named message template plus its recipient set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    /// Template body with `{{key}}` placeholders.
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A recipient as supplied at campaign creation, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub phone: String,
    #[serde(default)]
    pub variables: Option<HashMap<String, String>>,
}

impl Recipient {
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            variables: None,
        }
    }

    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables = Some(variables);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSummary {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub total: u64,
    pub sent: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageCounts {
    pub pending: u64,
    pub sent: u64,
    pub failed: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: Campaign,
    /// Newest first.
    pub messages: Vec<Message>,
    pub summary: MessageCounts,
}

// ─── Message ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Sent => "sent",
            MessageStatus::Failed => "failed",
        }
    }
}

/// One per-recipient delivery unit belonging to a campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub campaign_id: Uuid,
    /// Normalized phone.
    pub to: String,
    pub status: MessageStatus,
    #[serde(default)]
    pub variables: Option<HashMap<String, String>>,
    pub error: Option<String>,
    pub provider_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Terminal outcome written back for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Sent { provider_response: String },
    Failed { error: String },
}

impl MessageOutcome {
    pub fn status(&self) -> MessageStatus {
        match self {
            MessageOutcome::Sent { .. } => MessageStatus::Sent,
            MessageOutcome::Failed { .. } => MessageStatus::Failed,
        }
    }
}

// ─── Job ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobType {
    #[serde(rename = "campaign-send")]
    CampaignSend,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Finished,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// Aggregate outcome of one dispatch run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchStats {
    pub total: u64,
    pub sent: u64,
    pub failed: u64,
    pub skipped_unsubscribed: u64,
}

/// Structured job payload. Which fields are present depends on the phase:
/// `{total}` while running, the full counts when finished, and `{error}`
/// (plus any counts gathered before the error) when failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_unsubscribed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStats {
    pub fn running(total: u64) -> Self {
        Self {
            total: Some(total),
            ..Default::default()
        }
    }

    pub fn finished(stats: &DispatchStats) -> Self {
        Self {
            total: Some(stats.total),
            sent: Some(stats.sent),
            failed: Some(stats.failed),
            skipped_unsubscribed: Some(stats.skipped_unsubscribed),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, partial: Option<&DispatchStats>) -> Self {
        let mut stats = partial.map(Self::finished).unwrap_or_default();
        stats.error = Some(error.into());
        stats
    }
}

/// One record of a single dispatch run's lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub campaign_id: Uuid,
    pub status: JobStatus,
    pub stats: JobStats,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}
