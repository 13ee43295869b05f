//! The configuration-store collaborator.
//!
//! One [`CommunityConfig`] record exists per community. The core only reads
//! records; onboarding flows outside the core create them.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::id::{ChannelId, CommunityId};

/// The prefix every new community starts with.
pub const DEFAULT_PREFIX: &str = "!?";

/// Per-community configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityConfig {
    /// Unique key.
    pub community_id: CommunityId,
    /// Accepted command prefixes.
    #[serde(default)]
    pub prefixes: BTreeSet<String>,
    /// Channel that receives the player list, if configured.
    #[serde(default)]
    pub playerlist_channel: Option<ChannelId>,
    /// Linked external club id, if any.
    #[serde(default)]
    pub club_id: Option<String>,
    /// Whether the online command is enabled.
    #[serde(default)]
    pub online_cmd: bool,
}

impl CommunityConfig {
    /// Creates a record with default settings and the default prefix.
    pub fn new(community_id: impl Into<CommunityId>) -> Self {
        Self {
            community_id: community_id.into(),
            prefixes: BTreeSet::from([DEFAULT_PREFIX.to_string()]),
            playerlist_channel: None,
            club_id: None,
            online_cmd: false,
        }
    }

    /// Replaces the prefix set.
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }
}

/// Storage for community configuration records.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetches the record for `community`.
    async fn get(&self, community: CommunityId) -> StoreResult<CommunityConfig>;

    /// Creates a record for `community` from `defaults`.
    async fn create(
        &self,
        community: CommunityId,
        defaults: CommunityConfig,
    ) -> StoreResult<CommunityConfig>;

    /// Drops pooled connections, including those in use.
    ///
    /// Called when the platform connection drops so that stale connections
    /// are not reused after the reconnect.
    async fn disconnect(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// A shared config store trait object.
pub type BoxedStore = Arc<dyn ConfigStore>;

impl fmt::Debug for dyn ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore").finish_non_exhaustive()
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// An in-process [`ConfigStore`].
///
/// Useful for development deployments and tests; it counts `get` calls so
/// caching behaviour can be observed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<CommunityId, CommunityConfig>>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record.
    pub fn insert(&self, config: CommunityConfig) {
        self.records.write().insert(config.community_id, config);
    }

    /// Number of `get` calls served so far, including misses.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get(&self, community: CommunityId) -> StoreResult<CommunityConfig> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.records
            .read()
            .get(&community)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create(
        &self,
        community: CommunityId,
        mut defaults: CommunityConfig,
    ) -> StoreResult<CommunityConfig> {
        defaults.community_id = community;
        let mut records = self.records.write();
        if let Some(existing) = records.get(&community) {
            return Ok(existing.clone());
        }
        records.insert(community, defaults.clone());
        debug!(community = %community, "Created community config");
        Ok(defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_record() {
        let store = MemoryStore::new();
        assert_eq!(store.get(CommunityId(1)).await, Err(StoreError::NotFound));
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = MemoryStore::new();
        let created = store
            .create(CommunityId(7), CommunityConfig::new(0))
            .await
            .unwrap();
        assert_eq!(created.community_id, CommunityId(7));
        assert!(created.prefixes.contains(DEFAULT_PREFIX));

        let fetched = store.get(CommunityId(7)).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_keeps_existing_record() {
        let store = MemoryStore::new();
        store.insert(CommunityConfig::new(3).with_prefixes(["$"]));

        let created = store
            .create(CommunityId(3), CommunityConfig::new(3))
            .await
            .unwrap();
        assert_eq!(created.prefixes, BTreeSet::from(["$".to_string()]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: CommunityConfig =
            serde_json::from_value(serde_json::json!({"community_id": 5})).unwrap();
        assert_eq!(config.community_id, CommunityId(5));
        assert!(config.prefixes.is_empty());
        assert!(!config.online_cmd);
    }
}
