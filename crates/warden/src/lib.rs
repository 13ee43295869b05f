//! # Warden
//!
//! Command admission and error escalation for a group-chat bot.
//!
//! ## Overview
//!
//! Every inbound message flows through the same pipeline:
//!
//! ```text
//! ┌──────────┐   ┌────────────────┐   ┌───────────────┐   ┌─────────┐
//! │ Platform │──▶│ PrefixResolver │──▶│ AdmissionGate │──▶│ Command │
//! └──────────┘   └────────────────┘   └───────────────┘   └────┬────┘
//!                                                              │ error
//!                                     operator DMs ◀── ┌───────▼───────┐
//!                                     user notice  ◀── │ ErrorPipeline │
//!                                                      └───────────────┘
//! ```
//!
//! - **PrefixResolver**: per-community prefixes, cached for the process lifetime
//! - **AdmissionGate**: startup, direct-message and restricted-community checks
//! - **InvocationContext**: memoized community config and reply helpers
//! - **ErrorPipeline**: renders failures for the operator and notifies the invoker
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use warden::prelude::*;
//!
//! async fn ping(ctx: Arc<InvocationContext>) -> anyhow::Result<()> {
//!     ctx.reply("Pong!").await?;
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (platform, events) = my_platform::connect().await?;
//!     let store = my_store::connect().await?;
//!
//!     let extensions = ExtensionSet::new().with("cogs.owner_cmds", |commands: &CommandRegistry| {
//!         commands.register(command_fn("ping", ping))?;
//!         Ok(())
//!     });
//!
//!     WardenRuntime::builder()
//!         .extensions(extensions)
//!         .build(platform, store)?
//!         .run(events)
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `json-log`: JSON log output
//! - `testing`: recording platform and failing store fakes

pub use warden_core as core;
pub use warden_framework as framework;
pub use warden_runtime as runtime;

/// Commonly used types for building a bot.
///
/// ```rust,ignore
/// use warden::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Runtime
    pub use warden_runtime::{
        Extension, ExtensionSet, RuntimeBuilder, RuntimeError, WardenConfig, WardenRuntime,
    };

    // Commands
    pub use warden_framework::{
        Command, CommandRegistry, DispatchOutcome, Dispatcher, InvocationContext, command_fn,
    };

    // Admission and escalation
    pub use warden_framework::{
        AdmissionGate, Denial, ErrorPipeline, Lifecycle, Operator, PrefixResolver,
    };

    // Foundation types
    pub use warden_core::{
        BoxedPlatform, BoxedStore, ChannelId, ChatPlatform, Colour, CommunityConfig, CommunityId,
        ConfigStore, Embed, InboundMessage, OutgoingMessage, PlatformError, PlatformEvent,
        StoreError, User, UserId,
    };

    // Logging
    pub use warden_runtime::prelude::*;
}
