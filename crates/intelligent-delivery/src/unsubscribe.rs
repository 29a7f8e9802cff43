//! Unsubscribe registry and per-run filter.

use async_trait::async_trait;
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::phone::normalize_phone;
use campaign_core::store::UnsubscribeRegistry;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribeEntry {
    /// Normalized phone.
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only, thread-safe unsubscribe registry backed by `DashMap`.
pub struct UnsubscribeList {
    entries: DashMap<String, UnsubscribeEntry>,
}

impl UnsubscribeList {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn contains(&self, phone: &str) -> bool {
        self.entries.contains_key(&normalize_phone(phone))
    }

    pub fn get(&self, phone: &str) -> Option<UnsubscribeEntry> {
        self.entries
            .get(&normalize_phone(phone))
            .map(|e| e.value().clone())
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

impl Default for UnsubscribeList {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UnsubscribeRegistry for UnsubscribeList {
    async fn list_all(&self) -> CampaignResult<HashSet<String>> {
        Ok(self.entries.iter().map(|e| e.key().clone()).collect())
    }

    async fn add(&self, phone: &str) -> CampaignResult<String> {
        let normalized = normalize_phone(phone);
        if normalized.is_empty() {
            return Err(CampaignError::Validation("Phone number is invalid".to_string()));
        }

        let mut inserted = false;
        self.entries.entry(normalized.clone()).or_insert_with(|| {
            inserted = true;
            UnsubscribeEntry {
                phone: normalized.clone(),
                created_at: Utc::now(),
            }
        });

        if inserted {
            metrics::counter!("unsubscribe.added").increment(1);
            tracing::info!(phone = %normalized, "recipient unsubscribed");
        }
        Ok(normalized)
    }
}

// ---------------------------------------------------------------------------
// Per-run filter
// ---------------------------------------------------------------------------

/// Snapshot of the registry taken once per dispatch run, so each recipient
/// check is an in-memory set lookup.
#[derive(Debug, Clone, Default)]
pub struct UnsubscribeFilter {
    phones: HashSet<String>,
}

impl UnsubscribeFilter {
    /// Load the whole registry.
    pub async fn load(registry: &dyn UnsubscribeRegistry) -> CampaignResult<Self> {
        let phones = registry.list_all().await?;
        tracing::debug!(entries = phones.len(), "unsubscribe snapshot loaded");
        Ok(Self::from_phones(phones))
    }

    /// Build a filter from raw phones; each is normalized, empty keys dropped.
    pub fn from_phones<I, S>(phones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phones: phones
                .into_iter()
                .map(|p| normalize_phone(p.as_ref()))
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Whether sends to `phone` must be suppressed.
    pub fn is_suppressed(&self, phone: &str) -> bool {
        let key = normalize_phone(phone);
        !key.is_empty() && self.phones.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.phones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phones.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_normalizes() {
        let list = UnsubscribeList::new();
        let key = list.add("+1 (206) 555-0123").await.unwrap();
        assert_eq!(key, "+12065550123");
        assert!(list.contains("+12065550123"));
        assert!(list.contains("+1 206 555 0123"));
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let list = UnsubscribeList::new();
        list.add("+15551234567").await.unwrap();
        let first = list.get("+15551234567").unwrap();

        list.add("+1 555 123 4567").await.unwrap();
        assert_eq!(list.count(), 1);
        assert_eq!(list.get("+15551234567").unwrap().created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_phone() {
        let list = UnsubscribeList::new();
        let err = list.add("not a phone").await.unwrap_err();
        assert!(matches!(err, CampaignError::Validation(_)));
        assert_eq!(list.count(), 0);
    }

    #[tokio::test]
    async fn test_filter_loads_snapshot() {
        let list = UnsubscribeList::new();
        list.add("+15551111111").await.unwrap();
        list.add("+15552222222").await.unwrap();

        let filter = UnsubscribeFilter::load(&list).await.unwrap();
        assert_eq!(filter.len(), 2);

        // Later registry changes do not leak into the snapshot.
        list.add("+15553333333").await.unwrap();
        assert!(filter.is_suppressed("+15551111111"));
        assert!(filter.is_suppressed("+1 555 222 2222"));
        assert!(!filter.is_suppressed("+15553333333"));
    }

    #[test]
    fn test_filter_never_suppresses_empty_key() {
        let filter = UnsubscribeFilter::from_phones(["abc", "+15551111111"]);
        assert_eq!(filter.len(), 1);
        assert!(!filter.is_suppressed("xyz"));
        assert!(!filter.is_suppressed(""));
    }
}
