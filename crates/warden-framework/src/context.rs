//! The per-invocation context handed to commands.
//!
//! One [`InvocationContext`] is built for every inbound message that resolves
//! to a command. It is never shared across messages and is dropped once the
//! command (and any error reporting for it) completes.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::trace;

use warden_core::{
    BoxedPlatform, BoxedStore, ChannelId, CommunityConfig, CommunityId, InboundMessage,
    MessageId, MessageReference, OutgoingMessage, PlatformResult, UserId,
};

use crate::error::{ContextError, ContextResult};
use crate::prefix::PrefixResolver;

/// Context for a single command invocation.
pub struct InvocationContext {
    platform: BoxedPlatform,
    store: BoxedStore,
    message: InboundMessage,
    prefix: String,
    invoked_with: String,
    command: String,
    args: Vec<String>,
    prefixes: Option<Arc<PrefixResolver>>,
    /// At most one store fetch per invocation.
    config: OnceCell<CommunityConfig>,
}

impl InvocationContext {
    /// Creates a context for `message`.
    ///
    /// The invocation fields (prefix, command name, arguments) start empty and
    /// are filled in by the dispatcher.
    pub fn new(platform: BoxedPlatform, store: BoxedStore, message: InboundMessage) -> Self {
        Self {
            platform,
            store,
            message,
            prefix: String::new(),
            invoked_with: String::new(),
            command: String::new(),
            args: Vec::new(),
            prefixes: None,
            config: OnceCell::new(),
        }
    }

    /// Sets the prefix that matched.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the resolved command, the name it was invoked with, and its
    /// arguments.
    pub fn with_command(
        mut self,
        command: impl Into<String>,
        invoked_with: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        self.command = command.into();
        self.invoked_with = invoked_with.into();
        self.args = args;
        self
    }

    /// Gives commands access to the prefix cache.
    pub fn with_prefix_resolver(mut self, resolver: Arc<PrefixResolver>) -> Self {
        self.prefixes = Some(resolver);
        self
    }

    /// The originating message.
    pub fn message(&self) -> &InboundMessage {
        &self.message
    }

    /// The originating community, if any.
    pub fn community(&self) -> Option<CommunityId> {
        self.message.community()
    }

    /// The invoking user.
    pub fn author(&self) -> UserId {
        self.message.author_id
    }

    /// The channel the command was invoked in.
    pub fn channel(&self) -> ChannelId {
        self.message.channel_id
    }

    /// The prefix that matched.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Canonical name of the resolved command.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The name as typed by the user (may be an alias).
    pub fn invoked_with(&self) -> &str {
        &self.invoked_with
    }

    /// Shell-split arguments following the command name.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The chat platform.
    pub fn platform(&self) -> &BoxedPlatform {
        &self.platform
    }

    /// The configuration store.
    pub fn store(&self) -> &BoxedStore {
        &self.store
    }

    /// The prefix cache, when wired by the dispatcher.
    pub fn prefix_resolver(&self) -> Option<&Arc<PrefixResolver>> {
        self.prefixes.as_ref()
    }

    /// Returns the community's configuration record.
    ///
    /// The first call performs one store fetch and memoizes the result; later
    /// calls (from any number of handlers) reuse it. A failed fetch is not
    /// memoized.
    pub async fn fetch_config(&self) -> ContextResult<&CommunityConfig> {
        let community = self.community().ok_or(ContextError::NotInCommunity)?;
        self.config
            .get_or_try_init(|| async {
                trace!(community = %community, "Fetching community config");
                self.store.get(community).await.map_err(ContextError::from)
            })
            .await
    }

    /// Returns the memoized configuration record without fetching.
    pub fn cached_config(&self) -> Option<&CommunityConfig> {
        self.config.get()
    }

    /// Replies to the originating message.
    ///
    /// The reply cites the original message but tolerates it being deleted
    /// in the meantime: the reply is then sent unlinked instead of failing.
    pub async fn reply(&self, message: impl Into<OutgoingMessage>) -> PlatformResult<MessageId> {
        let reference = MessageReference::to_message(&self.message).fail_if_not_exists(false);
        self.send(message.into().with_reference(reference)).await
    }

    /// Sends a message to the invocation's channel.
    pub async fn send(&self, message: impl Into<OutgoingMessage>) -> PlatformResult<MessageId> {
        self.platform
            .send_message(self.message.channel_id, message.into())
            .await
    }
}

impl std::fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationContext")
            .field("message", &self.message.id)
            .field("community", &self.community())
            .field("prefix", &self.prefix)
            .field("command", &self.command)
            .field("args", &self.args)
            .field("config_fetched", &self.config.initialized())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingStore, RecordingPlatform};
    use warden_core::{MemoryStore, StoreError};

    fn ctx(store: BoxedStore, message: InboundMessage) -> InvocationContext {
        InvocationContext::new(Arc::new(RecordingPlatform::new()), store, message)
    }

    #[tokio::test]
    async fn test_fetch_config_memoizes() {
        let store = Arc::new(MemoryStore::new());
        store.insert(CommunityConfig::new(42).with_prefixes(["$"]));
        let ctx = ctx(store.clone(), InboundMessage::in_community(1, 2, 42, 3, "$cfg"));

        assert!(ctx.cached_config().is_none());
        for _ in 0..3 {
            let config = ctx.fetch_config().await.unwrap();
            assert_eq!(config.community_id, CommunityId(42));
        }

        assert_eq!(store.fetch_count(), 1);
        assert!(ctx.cached_config().is_some());
    }

    #[tokio::test]
    async fn test_fetch_config_concurrent_callers_share_one_fetch() {
        let store = Arc::new(MemoryStore::new());
        store.insert(CommunityConfig::new(42));
        let ctx = ctx(store.clone(), InboundMessage::in_community(1, 2, 42, 3, "!?x"));

        let (a, b) = tokio::join!(ctx.fetch_config(), ctx.fetch_config());
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_config_failure_is_not_memoized() {
        let store = Arc::new(MemoryStore::new());
        let ctx = ctx(store.clone(), InboundMessage::in_community(1, 2, 42, 3, "!?x"));

        assert_eq!(
            ctx.fetch_config().await,
            Err(ContextError::Store(StoreError::NotFound))
        );

        store.insert(CommunityConfig::new(42));
        assert!(ctx.fetch_config().await.is_ok());
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_config_in_direct_message() {
        let store = Arc::new(FailingStore::new(StoreError::NotReady));
        let ctx = ctx(store.clone(), InboundMessage::direct(1, 2, 3, "!?x"));

        assert_eq!(ctx.fetch_config().await, Err(ContextError::NotInCommunity));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_reply_tolerates_deleted_message() {
        let platform = Arc::new(RecordingPlatform::new());
        let message = InboundMessage::in_community(10, 20, 42, 3, "!?ping");
        let ctx = InvocationContext::new(
            platform.clone(),
            Arc::new(MemoryStore::new()),
            message.clone(),
        );

        ctx.reply("pong").await.unwrap();

        let sent = platform.sent();
        assert_eq!(sent.len(), 1);
        let reference = sent[0].message.reference.clone().unwrap();
        assert_eq!(reference.message_id, message.id);
        assert!(!reference.fail_if_not_exists);
        assert_eq!(sent[0].message.content.as_deref(), Some("pong"));
    }
}
