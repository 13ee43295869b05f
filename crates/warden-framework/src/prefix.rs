//! Per-community dynamic prefix resolution.
//!
//! [`PrefixResolver`] computes which strings mark an inbound message as a
//! command invocation. It runs for every message on the hot path, so it never
//! fails: every store problem degrades to "mention prefixes only".
//!
//! Resolution order:
//!
//! 1. The two mention forms of the bot are always accepted.
//! 2. Direct messages get nothing else; the store is not consulted.
//! 3. Messages whose community is not resolvable yet get the default prefix.
//! 4. Community messages get the community's custom prefixes, served from an
//!    in-process cache populated on the first successful lookup.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use warden_core::{
    BoxedStore, CommunityId, DEFAULT_PREFIX, InboundMessage, MessageOrigin, StoreError, UserId,
};

/// Default upper bound for a store lookup made while resolving prefixes.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// A set of accepted prefixes.
pub type PrefixSet = BTreeSet<String>;

/// Returns the two mention forms that always address the bot.
pub fn mention_prefixes(bot: UserId) -> PrefixSet {
    PrefixSet::from([format!("<@{bot}> "), format!("<@!{bot}> ")])
}

/// Resolves the accepted command prefixes for inbound messages.
///
/// The cache is keyed by community and lives for the whole process. Reads
/// and writes may race across tasks; a duplicate fetch for the same
/// community stores the same value, so last-writer-wins is fine.
pub struct PrefixResolver {
    store: BoxedStore,
    cache: RwLock<HashMap<CommunityId, PrefixSet>>,
    default_prefix: String,
    lookup_timeout: Duration,
}

impl PrefixResolver {
    /// Creates a resolver backed by `store`.
    pub fn new(store: BoxedStore) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
            default_prefix: DEFAULT_PREFIX.to_string(),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Sets the prefix used when a message's community is not resolvable yet.
    pub fn default_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.default_prefix = prefix.into();
        self
    }

    /// Sets the upper bound for a single store lookup.
    pub fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Computes the accepted prefixes for `message`.
    ///
    /// The result is never empty: the mention prefixes of `bot` are always
    /// included.
    pub async fn resolve(&self, bot: UserId, message: &InboundMessage) -> PrefixSet {
        let mut prefixes = mention_prefixes(bot);
        prefixes.extend(self.custom_prefixes(message).await);
        prefixes
    }

    async fn custom_prefixes(&self, message: &InboundMessage) -> PrefixSet {
        let community = match message.origin {
            MessageOrigin::Direct => return PrefixSet::new(),
            MessageOrigin::Pending => {
                trace!(message = %message.id, "Community not available yet, using default prefix");
                return PrefixSet::from([self.default_prefix.clone()]);
            }
            MessageOrigin::Community(id) => id,
        };

        if let Some(cached) = self.cached(community) {
            return cached;
        }

        let lookup = tokio::time::timeout(self.lookup_timeout, self.store.get(community)).await;
        match lookup.unwrap_or(Err(StoreError::Timeout)) {
            Ok(config) => {
                debug!(
                    community = %community,
                    count = config.prefixes.len(),
                    "Cached community prefixes"
                );
                self.cache.write().insert(community, config.prefixes.clone());
                config.prefixes
            }
            Err(err) => self.degrade(community, err),
        }
    }

    /// Maps a failed lookup to the custom prefixes to use instead.
    ///
    /// Nothing is cached, so a later successful lookup is picked up.
    fn degrade(&self, community: CommunityId, err: StoreError) -> PrefixSet {
        match err {
            StoreError::NotFound => {
                trace!(community = %community, "No config record yet, no custom prefixes");
            }
            StoreError::NotReady => {
                debug!(community = %community, "Store not initialized, no custom prefixes");
            }
            StoreError::StoreUnavailable(reason) => {
                warn!(community = %community, %reason, "Store unavailable, no custom prefixes");
            }
            StoreError::Timeout => {
                warn!(
                    community = %community,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "Prefix lookup timed out, no custom prefixes"
                );
            }
            StoreError::InvalidKey(key) => {
                warn!(community = %community, %key, "Prefix lookup key error, no custom prefixes");
            }
        }
        PrefixSet::new()
    }

    /// Returns the cached custom prefixes for `community`, if any.
    pub fn cached(&self, community: CommunityId) -> Option<PrefixSet> {
        self.cache.read().get(&community).cloned()
    }

    /// Replaces the cached custom prefixes for `community`.
    ///
    /// Configuration commands call this after persisting a prefix change.
    pub fn update(&self, community: CommunityId, prefixes: PrefixSet) {
        self.cache.write().insert(community, prefixes);
    }

    /// Drops the cached prefixes for `community`; the next message refetches.
    pub fn invalidate(&self, community: CommunityId) -> bool {
        self.cache.write().remove(&community).is_some()
    }

    /// Number of communities with cached prefixes.
    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }
}

impl std::fmt::Debug for PrefixResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixResolver")
            .field("cached", &self.cached_len())
            .field("default_prefix", &self.default_prefix)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}

/// Finds the longest prefix in `prefixes` that starts `content`.
pub fn match_prefix<'a>(prefixes: &'a PrefixSet, content: &str) -> Option<&'a str> {
    prefixes
        .iter()
        .filter(|p| !p.is_empty() && content.starts_with(p.as_str()))
        .max_by_key(|p| p.len())
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{FailingStore, SlowStore};
    use warden_core::{CommunityConfig, MemoryStore};

    const BOT: UserId = UserId(99);

    fn resolver(store: Arc<MemoryStore>) -> PrefixResolver {
        PrefixResolver::new(store)
    }

    #[tokio::test]
    async fn test_direct_message_gets_mentions_only() {
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver(Arc::clone(&store));
        let msg = InboundMessage::direct(1, 2, 3, "!?ping");

        let prefixes = resolver.resolve(BOT, &msg).await;

        assert_eq!(prefixes, mention_prefixes(BOT));
        assert!(prefixes.contains("<@99> "));
        assert!(prefixes.contains("<@!99> "));
        assert_eq!(store.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_pending_community_gets_default_prefix() {
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver(Arc::clone(&store)).default_prefix("!?");
        let mut msg = InboundMessage::in_community(1, 2, 42, 3, "!?ping");
        msg.origin = MessageOrigin::Pending;

        let prefixes = resolver.resolve(BOT, &msg).await;

        assert_eq!(prefixes.len(), 3);
        assert!(prefixes.contains("!?"));
        assert_eq!(store.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_record_is_not_cached() {
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver(Arc::clone(&store));
        let msg = InboundMessage::in_community(1, 2, 42, 3, "!?ping");

        let prefixes = resolver.resolve(BOT, &msg).await;

        assert_eq!(prefixes, mention_prefixes(BOT));
        assert!(resolver.cached(CommunityId(42)).is_none());

        // Once the record exists it is picked up.
        store.insert(CommunityConfig::new(42).with_prefixes(["$"]));
        let prefixes = resolver.resolve(BOT, &msg).await;
        assert!(prefixes.contains("$"));
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_store() {
        let store = Arc::new(MemoryStore::new());
        store.insert(CommunityConfig::new(7).with_prefixes(["!?", "r!"]));
        let resolver = resolver(Arc::clone(&store));
        let msg = InboundMessage::in_community(1, 2, 7, 3, "r!help");

        for _ in 0..5 {
            let prefixes = resolver.resolve(BOT, &msg).await;
            assert_eq!(prefixes.len(), 4);
            assert!(prefixes.contains("r!"));
        }

        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_prefix_set_is_cached() {
        let store = Arc::new(MemoryStore::new());
        store.insert(CommunityConfig::new(7).with_prefixes(Vec::<String>::new()));
        let resolver = resolver(Arc::clone(&store));
        let msg = InboundMessage::in_community(1, 2, 7, 3, "hello");

        resolver.resolve(BOT, &msg).await;
        resolver.resolve(BOT, &msg).await;

        assert_eq!(store.fetch_count(), 1);
        assert_eq!(resolver.cached(CommunityId(7)), Some(PrefixSet::new()));
    }

    #[tokio::test]
    async fn test_store_failures_degrade_to_mentions() {
        let failures = [
            StoreError::NotReady,
            StoreError::unavailable("connection refused"),
            StoreError::Timeout,
            StoreError::InvalidKey("guild_id".into()),
        ];

        for failure in failures {
            let resolver = PrefixResolver::new(Arc::new(FailingStore::new(failure.clone())));
            let msg = InboundMessage::in_community(1, 2, 5, 3, "!?ping");

            let prefixes = resolver.resolve(BOT, &msg).await;

            assert_eq!(prefixes, mention_prefixes(BOT), "failure: {failure}");
            assert_eq!(resolver.cached_len(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out() {
        let store = SlowStore::new(Duration::from_secs(60));
        let resolver =
            PrefixResolver::new(Arc::new(store)).lookup_timeout(Duration::from_millis(200));
        let msg = InboundMessage::in_community(1, 2, 5, 3, "!?ping");

        let prefixes = resolver.resolve(BOT, &msg).await;

        assert_eq!(prefixes, mention_prefixes(BOT));
        assert_eq!(resolver.cached_len(), 0);
    }

    #[tokio::test]
    async fn test_update_and_invalidate() {
        let store = Arc::new(MemoryStore::new());
        store.insert(CommunityConfig::new(7).with_prefixes(["!?"]));
        let resolver = resolver(Arc::clone(&store));
        let msg = InboundMessage::in_community(1, 2, 7, 3, "?ping");

        resolver.resolve(BOT, &msg).await;
        resolver.update(CommunityId(7), PrefixSet::from(["?".to_string()]));
        assert!(resolver.resolve(BOT, &msg).await.contains("?"));
        assert_eq!(store.fetch_count(), 1);

        assert!(resolver.invalidate(CommunityId(7)));
        assert!(!resolver.invalidate(CommunityId(7)));
        assert!(resolver.resolve(BOT, &msg).await.contains("!?"));
        assert_eq!(store.fetch_count(), 2);
    }

    #[test]
    fn test_match_prefix_prefers_longest() {
        let prefixes = PrefixSet::from(["!".to_string(), "!?".to_string(), "<@1> ".to_string()]);
        assert_eq!(match_prefix(&prefixes, "!?ping"), Some("!?"));
        assert_eq!(match_prefix(&prefixes, "!ping"), Some("!"));
        assert_eq!(match_prefix(&prefixes, "<@1> ping"), Some("<@1> "));
        assert_eq!(match_prefix(&prefixes, "ping"), None);
    }
}
