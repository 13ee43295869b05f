//! Snowflake-style identifiers.
//!
//! Every entity on the chat platform is addressed by a 64-bit id. Each kind
//! gets its own newtype so a channel id can never be passed where a community
//! id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Creates a new id from its raw value.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifies a community (guild), the unit of configuration scoping.
    CommunityId
);
define_id!(
    /// Identifies a user account.
    UserId
);
define_id!(
    /// Identifies a text channel, including direct-message channels.
    ChannelId
);
define_id!(
    /// Identifies a single message.
    MessageId
);
define_id!(
    /// Identifies an interactive-component interaction.
    InteractionId
);

/// A user as known to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user's id.
    pub id: UserId,
    /// Display name.
    pub name: String,
}

impl User {
    /// Creates a new user.
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The rich mention form, `<@id>`.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}
