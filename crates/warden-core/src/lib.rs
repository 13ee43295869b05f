//! # Warden Core
//!
//! Foundation types for the Warden bot core.
//!
//! This crate holds everything the command-admission and error-escalation
//! layers share, but none of their logic:
//!
//! - **Identifiers**: typed snowflake ids ([`CommunityId`], [`UserId`], ...)
//! - **Messages**: inbound events and outbound sends ([`InboundMessage`], [`OutgoingMessage`])
//! - **Rich payloads**: [`Embed`] and its size validation ([`embed_check`])
//! - **Collaborators**: the chat platform ([`ChatPlatform`]) and the
//!   configuration store ([`ConfigStore`]), with an in-memory store
//! - **Errors**: [`StoreError`] and [`PlatformError`]

pub mod embed;
pub mod error;
pub mod format;
pub mod id;
pub mod message;
pub mod platform;
pub mod store;

pub use embed::{Colour, Embed, EmbedField, EmbedLimitError, embed_check, validate_embed};
pub use error::{PlatformError, PlatformResult, StoreError, StoreResult};
pub use format::{format_timestamp, toggle_friendly_str, yesno_friendly_str};
pub use id::{ChannelId, CommunityId, InteractionId, MessageId, User, UserId};
pub use message::{
    ComponentInteraction, InboundMessage, MessageOrigin, MessageReference, OutgoingMessage,
};
pub use platform::{
    Activity, ActivityKind, BoxedPlatform, ChatPlatform, EventReceiver, EventSender,
    PlatformEvent, event_channel,
};
pub use store::{BoxedStore, CommunityConfig, ConfigStore, DEFAULT_PREFIX, MemoryStore};
