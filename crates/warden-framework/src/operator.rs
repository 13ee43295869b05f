//! The operator: the single designated administrator of the bot.
//!
//! The operator's identity is not configured; it is resolved once at startup
//! through the platform's application-owner lookup.

use std::sync::OnceLock;

use tracing::{debug, warn};

use warden_core::{ChatPlatform, OutgoingMessage, PlatformError, PlatformResult, User, UserId};

/// Largest part sent to the operator in one direct message.
pub const MAX_CHUNK_CHARS: usize = 1950;

/// Content for [`Operator::notify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerMessage {
    /// Free text, split into [`MAX_CHUNK_CHARS`]-character parts.
    Text(String),
    /// Pre-chunked parts, sent as is.
    Chunks(Vec<String>),
}

impl OwnerMessage {
    /// Returns the parts that will be delivered, in order.
    pub fn into_parts(self) -> Vec<String> {
        match self {
            Self::Text(text) => string_split(&text, MAX_CHUNK_CHARS),
            Self::Chunks(chunks) => chunks,
        }
    }
}

impl From<&str> for OwnerMessage {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for OwnerMessage {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<String>> for OwnerMessage {
    fn from(chunks: Vec<String>) -> Self {
        Self::Chunks(chunks)
    }
}

/// Splits `text` into parts of at most `max` characters.
///
/// Splits fall on character boundaries, never inside a code point.
pub fn string_split(text: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut len = 0;

    for ch in text.chars() {
        if len == max {
            parts.push(std::mem::take(&mut current));
            len = 0;
        }
        current.push(ch);
        len += 1;
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Holds the resolved operator identity.
#[derive(Debug, Default)]
pub struct Operator {
    user: OnceLock<User>,
}

impl Operator {
    /// Creates an unresolved operator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the operator. Only the first call takes effect.
    pub fn set(&self, user: User) -> bool {
        self.user.set(user).is_ok()
    }

    /// Returns the operator, once resolved.
    pub fn get(&self) -> Option<&User> {
        self.user.get()
    }

    /// Returns the operator's id, once resolved.
    pub fn id(&self) -> Option<UserId> {
        self.user.get().map(|user| user.id)
    }

    /// Whether `user` is the operator. Always `false` before resolution.
    pub fn is(&self, user: UserId) -> bool {
        self.id() == Some(user)
    }

    /// Sends `message` to the operator as direct messages.
    ///
    /// Parts are sent one at a time, each awaited before the next starts, so
    /// they arrive in order. Stops at the first failed send.
    pub async fn notify(
        &self,
        platform: &dyn ChatPlatform,
        message: impl Into<OwnerMessage>,
    ) -> PlatformResult<()> {
        let Some(operator) = self.id() else {
            warn!("Operator not resolved yet, dropping notification");
            return Err(PlatformError::Other("operator is not resolved".into()));
        };

        let parts = message.into().into_parts();
        debug!(operator = %operator, parts = parts.len(), "Messaging operator");
        for part in parts {
            platform
                .send_direct(operator, OutgoingMessage::text(part))
                .await?;
        }
        Ok(())
    }
}
