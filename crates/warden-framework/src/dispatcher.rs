//! Inbound message dispatch.
//!
//! For every inbound message the [`Dispatcher`]:
//!
//! 1. Resolves the accepted prefixes and matches the longest one
//! 2. Looks up the invoked command (with the `-` to `_` fallback)
//! 3. Builds an [`InvocationContext`]
//! 4. Evaluates the [`AdmissionGate`]
//! 5. Runs the command, escalating any error or panic through the
//!    [`ErrorPipeline`]

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{Instrument, Level, debug, span};

use warden_core::{BoxedPlatform, BoxedStore, InboundMessage};

use crate::command::{CommandRegistry, parse_invocation};
use crate::context::InvocationContext;
use crate::gate::{Admission, AdmissionGate, Denial};
use crate::prefix::{PrefixResolver, match_prefix};
use crate::report::{ErrorOrigin, ErrorPipeline};

/// What happened to a dispatched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The author is a bot account.
    Ignored,
    /// No accepted prefix, or nothing after it.
    NotACommand,
    /// A prefix matched but no command has the invoked name.
    UnknownCommand(String),
    /// The admission gate refused the command.
    Rejected(Denial),
    /// The command ran to completion.
    Completed,
    /// The command failed and the failure was reported.
    Failed,
}

/// Routes inbound messages to commands.
#[derive(Clone)]
pub struct Dispatcher {
    platform: BoxedPlatform,
    store: BoxedStore,
    prefixes: Arc<PrefixResolver>,
    commands: Arc<CommandRegistry>,
    gate: AdmissionGate,
    pipeline: ErrorPipeline,
}

impl Dispatcher {
    /// Creates a dispatcher with an empty command registry and a fresh
    /// prefix cache backed by `store`.
    pub fn new(
        platform: BoxedPlatform,
        store: BoxedStore,
        gate: AdmissionGate,
        pipeline: ErrorPipeline,
    ) -> Self {
        Self {
            prefixes: Arc::new(PrefixResolver::new(Arc::clone(&store))),
            commands: Arc::new(CommandRegistry::new()),
            platform,
            store,
            gate,
            pipeline,
        }
    }

    /// Uses `prefixes` for prefix resolution.
    pub fn with_prefix_resolver(mut self, prefixes: Arc<PrefixResolver>) -> Self {
        self.prefixes = prefixes;
        self
    }

    /// Uses `commands` for command lookup.
    pub fn with_commands(mut self, commands: Arc<CommandRegistry>) -> Self {
        self.commands = commands;
        self
    }

    pub fn prefixes(&self) -> &Arc<PrefixResolver> {
        &self.prefixes
    }

    pub fn commands(&self) -> &Arc<CommandRegistry> {
        &self.commands
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn pipeline(&self) -> &ErrorPipeline {
        &self.pipeline
    }

    /// Dispatches one inbound message.
    pub async fn dispatch(&self, message: InboundMessage) -> DispatchOutcome {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            message = %message.id,
            channel = %message.channel_id
        );
        self.dispatch_inner(message).instrument(span).await
    }

    async fn dispatch_inner(&self, message: InboundMessage) -> DispatchOutcome {
        if message.author_is_bot {
            return DispatchOutcome::Ignored;
        }

        let bot = self.platform.current_user_id();
        let prefixes = self.prefixes.resolve(bot, &message).await;
        let Some(prefix) = match_prefix(&prefixes, &message.content) else {
            return DispatchOutcome::NotACommand;
        };

        let rest = &message.content[prefix.len()..];
        let Some((invoked, args)) = parse_invocation(rest) else {
            return DispatchOutcome::NotACommand;
        };

        let Some(command) = self.commands.resolve(invoked) else {
            debug!(invoked, "Unknown command");
            return DispatchOutcome::UnknownCommand(invoked.to_string());
        };

        let ctx = InvocationContext::new(
            Arc::clone(&self.platform),
            Arc::clone(&self.store),
            message.clone(),
        )
        .with_prefix(prefix)
        .with_command(command.name(), invoked, args)
        .with_prefix_resolver(Arc::clone(&self.prefixes));
        let ctx = Arc::new(ctx);

        if let Admission::Denied(denial) = self.gate.check(&ctx) {
            debug!(command = command.name(), reason = %denial, "Command not admitted");
            return DispatchOutcome::Rejected(denial);
        }

        debug!(command = command.name(), author = %ctx.author(), "Running command");
        let result = AssertUnwindSafe(command.run(Arc::clone(&ctx)))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(anyhow::anyhow!(
                    "command '{}' panicked: {}",
                    command.name(),
                    panic_message(panic.as_ref())
                ))
            });

        match result {
            Ok(()) => DispatchOutcome::Completed,
            Err(err) => {
                self.pipeline
                    .handle(&err, Some(ErrorOrigin::Command(&ctx)))
                    .await;
                DispatchOutcome::Failed
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("commands", &self.commands.len())
            .field("prefixes", &self.prefixes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;

    use super::*;
    use crate::command::command_fn;
    use crate::gate::Lifecycle;
    use crate::operator::Operator;
    use crate::report::CODE_BLOCK_OPEN;
    use crate::testing::RecordingPlatform;
    use warden_core::{ChannelId, CommunityConfig, MemoryStore, User};

    const OWNER: warden_core::UserId = RecordingPlatform::OWNER_ID;

    struct Harness {
        platform: Arc<RecordingPlatform>,
        store: Arc<MemoryStore>,
        lifecycle: Arc<Lifecycle>,
        dispatcher: Dispatcher,
    }

    async fn ping(ctx: Arc<InvocationContext>) -> anyhow::Result<()> {
        ctx.reply("Pong!").await?;
        Ok(())
    }

    async fn club_set(ctx: Arc<InvocationContext>) -> anyhow::Result<()> {
        ctx.reply(ctx.args().join(",")).await?;
        Ok(())
    }

    async fn divide(_ctx: Arc<InvocationContext>) -> anyhow::Result<()> {
        Err(anyhow!("division by zero"))
    }

    async fn explode(ctx: Arc<InvocationContext>) -> anyhow::Result<()> {
        let slots: Vec<u32> = Vec::new();
        ctx.reply(slots[ctx.args().len()].to_string()).await?;
        Ok(())
    }

    fn harness() -> Harness {
        let platform = Arc::new(RecordingPlatform::new());
        let store = Arc::new(MemoryStore::new());
        let lifecycle = Arc::new(Lifecycle::new());
        let operator = Arc::new(Operator::new());
        operator.set(User::new(OWNER, "operator"));

        let gate = AdmissionGate::new(Arc::clone(&lifecycle), Arc::clone(&operator))
            .restricted_community(Some(100.into()))
            .allow_list(["help", "ping"]);
        let pipeline = ErrorPipeline::new(platform.clone(), operator);
        let dispatcher = Dispatcher::new(platform.clone(), store.clone(), gate, pipeline);

        let commands = dispatcher.commands();
        commands.register(command_fn("ping", ping)).unwrap();
        commands.register(command_fn("club_set", club_set)).unwrap();
        commands.register(command_fn("divide", divide)).unwrap();
        commands.register(command_fn("explode", explode)).unwrap();

        Harness {
            platform,
            store,
            lifecycle,
            dispatcher,
        }
    }

    fn start(h: &Harness) {
        h.lifecycle.mark_ready();
        h.lifecycle.finish_init_load();
    }

    fn texts(platform: &RecordingPlatform, channel: u64) -> Vec<String> {
        platform
            .channel_messages(ChannelId(channel))
            .into_iter()
            .filter_map(|m| m.content)
            .collect()
    }

    #[tokio::test]
    async fn test_runs_command_with_default_prefix() {
        let h = harness();
        start(&h);
        h.store.insert(CommunityConfig::new(42));

        let outcome = h
            .dispatcher
            .dispatch(InboundMessage::in_community(1, 2, 42, 5, "!?ping"))
            .await;

        assert_eq!(outcome, DispatchOutcome::Completed);
        assert_eq!(texts(&h.platform, 2), vec!["Pong!"]);
    }

    #[tokio::test]
    async fn test_mention_prefix_always_works() {
        let h = harness();
        start(&h);

        let outcome = h
            .dispatcher
            .dispatch(InboundMessage::in_community(1, 2, 42, 5, "<@!99> ping"))
            .await;

        assert_eq!(outcome, DispatchOutcome::Completed);
    }

    #[tokio::test]
    async fn test_plain_messages_are_not_commands() {
        let h = harness();
        start(&h);
        h.store.insert(CommunityConfig::new(42));

        for content in ["hello there", "!?", "!?   "] {
            let outcome = h
                .dispatcher
                .dispatch(InboundMessage::in_community(1, 2, 42, 5, content))
                .await;
            assert_eq!(outcome, DispatchOutcome::NotACommand, "content: {content:?}");
        }
        assert!(h.platform.sent().is_empty());
    }

    #[tokio::test]
    async fn test_bot_authors_are_ignored() {
        let h = harness();
        start(&h);
        let mut message = InboundMessage::in_community(1, 2, 42, 5, "<@99> ping");
        message.author_is_bot = true;

        assert_eq!(h.dispatcher.dispatch(message).await, DispatchOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_unknown_command_and_dash_fallback() {
        let h = harness();
        start(&h);
        h.store.insert(CommunityConfig::new(42));

        let outcome = h
            .dispatcher
            .dispatch(InboundMessage::in_community(1, 2, 42, 5, "!?nope"))
            .await;
        assert_eq!(outcome, DispatchOutcome::UnknownCommand("nope".into()));

        let outcome = h
            .dispatcher
            .dispatch(InboundMessage::in_community(1, 2, 42, 5, "!?club-set \"Realm A\" b"))
            .await;
        assert_eq!(outcome, DispatchOutcome::Completed);
        assert_eq!(texts(&h.platform, 2), vec!["Realm A,b"]);
    }

    #[tokio::test]
    async fn test_rejected_until_started() {
        let h = harness();
        let message = InboundMessage::in_community(1, 2, 42, OWNER, "<@99> ping");

        assert_eq!(
            h.dispatcher.dispatch(message.clone()).await,
            DispatchOutcome::Rejected(Denial::NotReady)
        );
        h.lifecycle.mark_ready();
        assert_eq!(
            h.dispatcher.dispatch(message.clone()).await,
            DispatchOutcome::Rejected(Denial::InitialLoad)
        );
        h.lifecycle.finish_init_load();
        assert_eq!(h.dispatcher.dispatch(message).await, DispatchOutcome::Completed);
    }

    #[tokio::test]
    async fn test_direct_messages_are_rejected() {
        let h = harness();
        start(&h);

        let outcome = h
            .dispatcher
            .dispatch(InboundMessage::direct(1, 2, 5, "<@99> ping"))
            .await;
        assert_eq!(outcome, DispatchOutcome::Rejected(Denial::DirectMessage));
    }

    #[tokio::test]
    async fn test_failing_command_is_reported() {
        let h = harness();
        start(&h);

        let message = InboundMessage::in_community(1, 2, 42, 5, "<@99> divide");
        let outcome = h.dispatcher.dispatch(message.clone()).await;

        assert_eq!(outcome, DispatchOutcome::Failed);
        let dms = h.platform.direct_texts(OWNER);
        assert_eq!(dms[0], format!("Error on: {}", message.jump_url()));
        assert!(dms[1].starts_with(CODE_BLOCK_OPEN));

        let replies = h.platform.channel_messages(ChannelId(2));
        assert_eq!(replies.len(), 1);
        assert!(replies[0].embed.is_some());
    }

    #[tokio::test]
    async fn test_panicking_command_is_reported() {
        let h = harness();
        start(&h);

        let outcome = h
            .dispatcher
            .dispatch(InboundMessage::in_community(1, 2, 42, 5, "<@99> explode"))
            .await;

        assert_eq!(outcome, DispatchOutcome::Failed);
        let dms = h.platform.direct_texts(OWNER);
        assert!(dms.iter().any(|dm| dm.contains("panicked")));
        assert!(dms.iter().any(|dm| dm.contains("index out of bounds")));
    }

    #[tokio::test]
    async fn test_prefix_lookup_is_cached_across_messages() {
        let h = harness();
        start(&h);
        h.store.insert(CommunityConfig::new(42).with_prefixes(["r!"]));
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        h.dispatcher
            .commands()
            .register(command_fn("count", move |_ctx| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }))
            .unwrap();

        for _ in 0..3 {
            h.dispatcher
                .dispatch(InboundMessage::in_community(1, 2, 42, 5, "r!count"))
                .await;
        }

        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert_eq!(h.store.fetch_count(), 1);
    }
}
