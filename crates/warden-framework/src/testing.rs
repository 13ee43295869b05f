//! Hand-written collaborator fakes for tests.
//!
//! Enabled for this crate's own tests and, through the `testing` feature, for
//! downstream crates' tests.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use warden_core::{
    Activity, ChannelId, ChatPlatform, CommunityConfig, CommunityId, ComponentInteraction,
    ConfigStore, InteractionId, MessageId, OutgoingMessage, PlatformError, PlatformResult,
    StoreError, StoreResult, User, UserId,
};

/// Where a recorded message was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Channel(ChannelId),
    Direct(UserId),
    Interaction(InteractionId),
}

/// A message recorded by [`RecordingPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub destination: Destination,
    pub message: OutgoingMessage,
}

/// A [`ChatPlatform`] that records every send in order.
#[derive(Debug)]
pub struct RecordingPlatform {
    bot_id: UserId,
    owner: Option<User>,
    owner_delay: Duration,
    sent: Mutex<Vec<Sent>>,
    presences: Mutex<Vec<Activity>>,
    presence_error: Mutex<Option<PlatformError>>,
    next_id: AtomicU64,
}

impl Default for RecordingPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingPlatform {
    /// Bot id used by default.
    pub const BOT_ID: UserId = UserId(99);
    /// Operator id used by default.
    pub const OWNER_ID: UserId = UserId(1);

    /// Creates a platform whose application owner is [`Self::OWNER_ID`].
    pub fn new() -> Self {
        Self {
            bot_id: Self::BOT_ID,
            owner: Some(User::new(Self::OWNER_ID, "operator")),
            owner_delay: Duration::ZERO,
            sent: Mutex::new(Vec::new()),
            presences: Mutex::new(Vec::new()),
            presence_error: Mutex::new(None),
            next_id: AtomicU64::new(1000),
        }
    }

    /// Makes the application-owner lookup fail.
    pub fn without_owner(mut self) -> Self {
        self.owner = None;
        self
    }

    /// Makes the application-owner lookup take `delay`.
    pub fn with_owner_delay(mut self, delay: Duration) -> Self {
        self.owner_delay = delay;
        self
    }

    /// Makes the next presence update fail with `error`.
    pub fn fail_next_presence(&self, error: PlatformError) {
        *self.presence_error.lock() = Some(error);
    }

    /// Every recorded send, in order.
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    /// Text content of every direct message sent to `user`, in order.
    pub fn direct_texts(&self, user: UserId) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|s| s.destination == Destination::Direct(user))
            .filter_map(|s| s.message.content.clone())
            .collect()
    }

    /// Every message sent to `channel`, in order.
    pub fn channel_messages(&self, channel: ChannelId) -> Vec<OutgoingMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|s| s.destination == Destination::Channel(channel))
            .map(|s| s.message.clone())
            .collect()
    }

    /// Every interaction response, in order.
    pub fn interaction_responses(&self) -> Vec<OutgoingMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|s| matches!(s.destination, Destination::Interaction(_)))
            .map(|s| s.message.clone())
            .collect()
    }

    /// Every presence successfully applied.
    pub fn presences(&self) -> Vec<Activity> {
        self.presences.lock().clone()
    }

    fn record(&self, destination: Destination, message: OutgoingMessage) -> MessageId {
        self.sent.lock().push(Sent {
            destination,
            message,
        });
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl ChatPlatform for RecordingPlatform {
    fn current_user_id(&self) -> UserId {
        self.bot_id
    }

    async fn application_owner(&self) -> PlatformResult<User> {
        if !self.owner_delay.is_zero() {
            tokio::time::sleep(self.owner_delay).await;
        }
        self.owner
            .clone()
            .ok_or_else(|| PlatformError::Other("application has no owner".into()))
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> PlatformResult<MessageId> {
        Ok(self.record(Destination::Channel(channel), message))
    }

    async fn send_direct(
        &self,
        user: UserId,
        message: OutgoingMessage,
    ) -> PlatformResult<MessageId> {
        Ok(self.record(Destination::Direct(user), message))
    }

    async fn respond_to_interaction(
        &self,
        interaction: &ComponentInteraction,
        message: OutgoingMessage,
    ) -> PlatformResult<()> {
        self.record(Destination::Interaction(interaction.id), message);
        Ok(())
    }

    async fn set_presence(&self, activity: &Activity) -> PlatformResult<()> {
        if let Some(error) = self.presence_error.lock().take() {
            return Err(error);
        }
        self.presences.lock().push(activity.clone());
        Ok(())
    }
}

/// A [`ConfigStore`] that always fails with the same error.
#[derive(Debug)]
pub struct FailingStore {
    error: StoreError,
    calls: AtomicUsize,
    disconnects: AtomicUsize,
}

impl FailingStore {
    pub fn new(error: StoreError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
        }
    }

    /// Number of `get` and `create` calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of `disconnect` calls.
    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigStore for FailingStore {
    async fn get(&self, _community: CommunityId) -> StoreResult<CommunityConfig> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }

    async fn create(
        &self,
        _community: CommunityId,
        _defaults: CommunityConfig,
    ) -> StoreResult<CommunityConfig> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }

    async fn disconnect(&self) -> StoreResult<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

/// A [`ConfigStore`] whose lookups take `delay` before finding nothing.
#[derive(Debug)]
pub struct SlowStore {
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ConfigStore for SlowStore {
    async fn get(&self, _community: CommunityId) -> StoreResult<CommunityConfig> {
        tokio::time::sleep(self.delay).await;
        Err(StoreError::NotFound)
    }

    async fn create(
        &self,
        community: CommunityId,
        defaults: CommunityConfig,
    ) -> StoreResult<CommunityConfig> {
        tokio::time::sleep(self.delay).await;
        Ok(CommunityConfig {
            community_id: community,
            ..defaults
        })
    }
}
