//! Commands and command lookup.
//!
//! A command is anything implementing [`Command`]. Closures can be turned
//! into commands with [`command_fn`]:
//!
//! ```rust,ignore
//! use warden_framework::{CommandRegistry, command_fn};
//!
//! let registry = CommandRegistry::new();
//! registry.register(command_fn("ping", |ctx| async move {
//!     ctx.reply("Pong!").await?;
//!     Ok(())
//! }))?;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::context::InvocationContext;

pub mod registry;
pub mod split;

pub use registry::CommandRegistry;
pub use split::{parse_invocation, shell_split};

/// A shared command trait object.
pub type BoxedCommand = Arc<dyn Command>;

/// A text command.
#[async_trait]
pub trait Command: Send + Sync {
    /// Canonical name.
    fn name(&self) -> &str;

    /// Alternative names.
    fn aliases(&self) -> &[String] {
        &[]
    }

    /// Runs the command. Errors are escalated through the error pipeline.
    async fn run(&self, ctx: Arc<InvocationContext>) -> anyhow::Result<()>;
}

type HandlerFn =
    dyn Fn(Arc<InvocationContext>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync;

/// A command backed by an async closure.
pub struct FnCommand {
    name: String,
    aliases: Vec<String>,
    handler: Box<HandlerFn>,
}

impl FnCommand {
    /// Adds an alternative name.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

impl std::fmt::Debug for FnCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCommand")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Command for FnCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    async fn run(&self, ctx: Arc<InvocationContext>) -> anyhow::Result<()> {
        (self.handler)(ctx).await
    }
}

/// Creates a command named `name` from an async closure.
pub fn command_fn<F, Fut>(name: impl Into<String>, handler: F) -> FnCommand
where
    F: Fn(Arc<InvocationContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    FnCommand {
        name: name.into(),
        aliases: Vec::new(),
        handler: Box::new(move |ctx| Box::pin(handler(ctx))),
    }
}
