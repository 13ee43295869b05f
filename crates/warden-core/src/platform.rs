//! The chat-platform collaborator.
//!
//! The core never talks to the network directly. A platform client (gateway
//! connection plus REST API) implements [`ChatPlatform`] and feeds
//! [`PlatformEvent`]s into the runtime through a channel.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{PlatformError, PlatformResult};
use crate::id::{ChannelId, MessageId, User, UserId};
use crate::message::{ComponentInteraction, InboundMessage, OutgoingMessage};

/// The kind of presence activity shown under the bot's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Playing,
    Listening,
    Watching,
}

/// A presence activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub name: String,
}

impl Activity {
    /// A "watching ..." activity.
    pub fn watching(name: impl Into<String>) -> Self {
        Self {
            kind: ActivityKind::Watching,
            name: name.into(),
        }
    }
}

/// Events delivered by the platform's event source.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    /// The gateway session is ready (sent on first connect and on every
    /// full reconnect).
    Ready,
    /// A dropped session was resumed without a full reconnect.
    Resumed,
    /// The gateway connection was lost.
    Disconnected,
    /// A message was posted somewhere the bot can see.
    Message(InboundMessage),
    /// The event source failed while processing an event.
    Error {
        /// Name of the event being processed.
        event: String,
        /// What went wrong.
        error: PlatformError,
    },
}

impl PlatformEvent {
    /// Returns a short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Resumed => "resumed",
            Self::Disconnected => "disconnected",
            Self::Message(_) => "message",
            Self::Error { .. } => "error",
        }
    }
}

/// Receiving end of the platform's event stream.
pub type EventReceiver = mpsc::Receiver<PlatformEvent>;

/// Sending end of the platform's event stream.
pub type EventSender = mpsc::Sender<PlatformEvent>;

/// Creates a bounded event channel between a platform client and the runtime.
pub fn event_channel(buffer: usize) -> (EventSender, EventReceiver) {
    mpsc::channel(buffer)
}

/// Send primitives exposed by the chat platform.
///
/// Implementations must honour [`MessageReference::fail_if_not_exists`]:
/// when it is `false` and the cited message is gone, the message is sent
/// without the citation instead of failing.
///
/// [`MessageReference::fail_if_not_exists`]: crate::MessageReference::fail_if_not_exists
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Returns the bot's own user id.
    fn current_user_id(&self) -> UserId;

    /// Looks up the owner of the bot application (the operator).
    async fn application_owner(&self) -> PlatformResult<User>;

    /// Sends a message to a channel.
    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> PlatformResult<MessageId>;

    /// Sends a direct message to a user.
    async fn send_direct(&self, user: UserId, message: OutgoingMessage)
    -> PlatformResult<MessageId>;

    /// Responds to an interactive-component interaction.
    async fn respond_to_interaction(
        &self,
        interaction: &ComponentInteraction,
        message: OutgoingMessage,
    ) -> PlatformResult<()>;

    /// Updates the bot's presence.
    async fn set_presence(&self, activity: &Activity) -> PlatformResult<()>;
}

/// A shared chat platform trait object.
pub type BoxedPlatform = Arc<dyn ChatPlatform>;

impl fmt::Debug for dyn ChatPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatPlatform")
            .field("current_user_id", &self.current_user_id())
            .finish_non_exhaustive()
    }
}
