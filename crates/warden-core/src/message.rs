//! Inbound and outbound message types.
//!
//! Inbound messages are what the platform's event source delivers. Outbound
//! messages are what the core asks the platform to send: plain content, a
//! rich payload, or both, optionally citing an earlier message.

use serde::{Deserialize, Serialize};

use crate::embed::Embed;
use crate::id::{ChannelId, CommunityId, InteractionId, MessageId, UserId};

/// Base URL used to build jump references.
pub const JUMP_URL_BASE: &str = "https://discord.com/channels";

// ============================================================================
// Inbound
// ============================================================================

/// Where an inbound message came from.
///
/// `Pending` covers a dispatch-ordering artifact: the message was posted in a
/// community channel, but the community itself is not available to the
/// process yet (events can arrive before the community cache is populated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum MessageOrigin {
    /// A direct message, outside any community.
    Direct,
    /// A message from a known community.
    Community(CommunityId),
    /// A community message whose community is not resolvable yet.
    Pending,
}

impl MessageOrigin {
    /// Returns the community id, if known.
    pub fn community(&self) -> Option<CommunityId> {
        match self {
            Self::Community(id) => Some(*id),
            Self::Direct | Self::Pending => None,
        }
    }
}

/// A message event delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// The message id.
    pub id: MessageId,
    /// The channel the message was posted in.
    pub channel_id: ChannelId,
    /// The originating community.
    pub origin: MessageOrigin,
    /// The author.
    pub author_id: UserId,
    /// Whether the author is a bot account.
    #[serde(default)]
    pub author_is_bot: bool,
    /// Raw content.
    pub content: String,
}

impl InboundMessage {
    /// Creates a message posted in a community channel.
    pub fn in_community(
        id: impl Into<MessageId>,
        channel_id: impl Into<ChannelId>,
        community: impl Into<CommunityId>,
        author_id: impl Into<UserId>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            origin: MessageOrigin::Community(community.into()),
            author_id: author_id.into(),
            author_is_bot: false,
            content: content.into(),
        }
    }

    /// Creates a direct message.
    pub fn direct(
        id: impl Into<MessageId>,
        channel_id: impl Into<ChannelId>,
        author_id: impl Into<UserId>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            origin: MessageOrigin::Direct,
            author_id: author_id.into(),
            author_is_bot: false,
            content: content.into(),
        }
    }

    /// Returns the originating community id, if known.
    pub fn community(&self) -> Option<CommunityId> {
        self.origin.community()
    }

    /// Returns a link-like pointer to this message, used for operator triage.
    pub fn jump_url(&self) -> String {
        let scope = match self.origin.community() {
            Some(community) => community.to_string(),
            None => "@me".to_string(),
        };
        format!("{JUMP_URL_BASE}/{scope}/{}/{}", self.channel_id, self.id)
    }
}

/// An interactive-component interaction (button press, select menu, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInteraction {
    /// The interaction id.
    pub id: InteractionId,
    /// Opaque token used to respond to the interaction.
    pub token: String,
    /// The channel the component lives in.
    pub channel_id: ChannelId,
    /// The user who triggered the interaction.
    pub user_id: UserId,
    /// The component's custom id.
    pub custom_id: String,
}

// ============================================================================
// Outbound
// ============================================================================

/// A citation of an earlier message attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReference {
    /// The cited message.
    pub message_id: MessageId,
    /// The channel of the cited message.
    pub channel_id: ChannelId,
    /// The community of the cited message, if any.
    pub community_id: Option<CommunityId>,
    /// When `false`, the platform sends the message unlinked instead of
    /// failing if the cited message has been deleted.
    pub fail_if_not_exists: bool,
}

impl MessageReference {
    /// Builds a reference to `message`.
    pub fn to_message(message: &InboundMessage) -> Self {
        Self {
            message_id: message.id,
            channel_id: message.channel_id,
            community_id: message.community(),
            fail_if_not_exists: true,
        }
    }

    /// Sets whether sending should fail when the cited message is gone.
    pub fn fail_if_not_exists(mut self, fail: bool) -> Self {
        self.fail_if_not_exists = fail;
        self
    }
}

/// A message the core asks the platform to send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Plain text content.
    pub content: Option<String>,
    /// Rich payload.
    pub embed: Option<Embed>,
    /// Optional citation of an earlier message.
    pub reference: Option<MessageReference>,
}

impl OutgoingMessage {
    /// Creates a plain-text message.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Creates a message carrying only a rich payload.
    pub fn embed(embed: Embed) -> Self {
        Self {
            embed: Some(embed),
            ..Default::default()
        }
    }

    /// Attaches a rich payload.
    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embed = Some(embed);
        self
    }

    /// Attaches a citation.
    pub fn with_reference(mut self, reference: MessageReference) -> Self {
        self.reference = Some(reference);
        self
    }
}

impl From<&str> for OutgoingMessage {
    fn from(content: &str) -> Self {
        Self::text(content)
    }
}

impl From<String> for OutgoingMessage {
    fn from(content: String) -> Self {
        Self::text(content)
    }
}

impl From<Embed> for OutgoingMessage {
    fn from(embed: Embed) -> Self {
        Self::embed(embed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_url_in_community() {
        let msg = InboundMessage::in_community(3, 2, 1, 9, "hi");
        assert_eq!(msg.jump_url(), "https://discord.com/channels/1/2/3");
    }

    #[test]
    fn jump_url_in_direct_message() {
        let msg = InboundMessage::direct(3, 2, 9, "hi");
        assert_eq!(msg.jump_url(), "https://discord.com/channels/@me/2/3");
    }

    #[test]
    fn reference_defaults_to_strict() {
        let msg = InboundMessage::in_community(3, 2, 1, 9, "hi");
        let reference = MessageReference::to_message(&msg);
        assert!(reference.fail_if_not_exists);
        assert_eq!(reference.community_id, Some(CommunityId(1)));
        assert!(!reference.fail_if_not_exists(false).fail_if_not_exists);
    }

    #[test]
    fn origin_serializes_tagged() {
        let json = serde_json::to_value(MessageOrigin::Community(CommunityId(42))).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "community", "id": 42}));
        let json = serde_json::to_value(MessageOrigin::Direct).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "direct"}));
    }
}
