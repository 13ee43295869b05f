//! Startup lifecycle and the event loop.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use warden_runtime::{ExtensionSet, WardenRuntime};
//!
//! let runtime = WardenRuntime::builder()
//!     .config_file("config.toml")
//!     .extensions(ExtensionSet::new().with("cogs.owner_cmds", owner_cmds::setup))
//!     .build(platform, store)?;
//!
//! // Runs until the event stream closes or Ctrl+C / SIGTERM.
//! runtime.run(events).await?;
//! ```
//!
//! # Startup
//!
//! On the first ready event the runtime marks the lifecycle ready, resolves
//! the operator through the platform's application-owner lookup and loads
//! the extensions. Every ready event then announces itself to the operator
//! and applies the presence. The first announcement ends the initial load,
//! which opens the admission gate.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use tokio::signal;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use warden_core::{
    BoxedPlatform, BoxedStore, ComponentInteraction, EventReceiver, PlatformError, PlatformEvent,
    format_timestamp,
};
use warden_framework::{
    AdmissionGate, CommandRegistry, Dispatcher, ErrorPipeline, Lifecycle, Operator, Phase,
    PrefixResolver,
};

use crate::config::{ConfigLoader, WardenConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::extensions::ExtensionSet;
use crate::keep_alive::spawn_keep_alive;
use crate::logging;

/// Sent to the operator when the presence update hits a closed connection.
pub const RECONNECTING_NOTICE: &str = "Reconnecting...";

/// The bot runtime.
pub struct WardenRuntime {
    config: WardenConfig,
    platform: BoxedPlatform,
    store: BoxedStore,
    lifecycle: Arc<Lifecycle>,
    operator: Arc<Operator>,
    dispatcher: Dispatcher,
    extensions: ExtensionSet,
    running: AtomicBool,
}

impl std::fmt::Debug for WardenRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WardenRuntime")
            .field("phase", &self.lifecycle.phase())
            .field("operator", &self.operator.id())
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

impl WardenRuntime {
    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// Logging is left untouched; see [`RuntimeBuilder::build`].
    pub fn from_config(config: WardenConfig, platform: BoxedPlatform, store: BoxedStore) -> Self {
        let lifecycle = Arc::new(Lifecycle::new());
        let operator = Arc::new(Operator::new());

        let gate = AdmissionGate::new(Arc::clone(&lifecycle), Arc::clone(&operator))
            .restricted_community(config.bot.restricted_community)
            .allow_list(config.bot.restricted_allow_list.iter().cloned());
        let pipeline = ErrorPipeline::new(Arc::clone(&platform), Arc::clone(&operator));
        let prefixes = PrefixResolver::new(Arc::clone(&store))
            .default_prefix(config.bot.default_prefix.clone())
            .lookup_timeout(config.bot.prefix_lookup_timeout());

        let dispatcher = Dispatcher::new(Arc::clone(&platform), Arc::clone(&store), gate, pipeline)
            .with_prefix_resolver(Arc::new(prefixes));

        Self {
            config,
            platform,
            store,
            lifecycle,
            operator,
            dispatcher,
            extensions: ExtensionSet::new(),
            running: AtomicBool::new(false),
        }
    }

    /// Sets the extensions loaded at startup.
    pub fn with_extensions(mut self, extensions: ExtensionSet) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &Arc<Lifecycle> {
        &self.lifecycle
    }

    pub fn operator(&self) -> &Arc<Operator> {
        &self.operator
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The command registry extensions register into.
    pub fn commands(&self) -> &Arc<CommandRegistry> {
        self.dispatcher.commands()
    }

    /// Handles one platform event to completion.
    ///
    /// Fails only when the initial load fails.
    pub async fn handle_event(&self, event: PlatformEvent) -> RuntimeResult<()> {
        debug!(event = event.name(), "Handling event");
        match event {
            PlatformEvent::Ready => {
                if self.lifecycle.mark_ready() {
                    self.first_ready().await?;
                } else {
                    self.on_ready().await;
                }
            }
            PlatformEvent::Resumed => self.on_resumed().await,
            PlatformEvent::Disconnected => self.on_disconnect().await,
            PlatformEvent::Message(message) => {
                self.dispatcher.dispatch(message).await;
            }
            PlatformEvent::Error { event, error } => self.on_error(&event, error).await,
        }
        Ok(())
    }

    /// The one-time startup load: operator lookup, then extensions.
    async fn init_load(&self) -> RuntimeResult<()> {
        let owner = self.platform.application_owner().await?;
        info!(operator = %owner.id, name = %owner.name, "Operator resolved");
        self.operator.set(owner);

        let loaded = self
            .extensions
            .load_all(&self.config.extensions, self.commands())?;
        info!(
            extensions = loaded.len(),
            commands = self.commands().len(),
            "Initial load complete"
        );
        Ok(())
    }

    /// Announces the connection and applies the presence.
    pub async fn on_ready(&self) {
        let now = format_timestamp(SystemTime::now());
        let announcement = if self.lifecycle.is_init_load() {
            format!("Logged in at {now}!")
        } else {
            format!("Reconnected at {now}!")
        };

        if let Err(e) = self
            .operator
            .notify(self.platform.as_ref(), announcement)
            .await
        {
            warn!(error = %e, "Failed to announce connection to operator");
        }

        self.lifecycle.finish_init_load();

        match self.platform.set_presence(&self.config.bot.presence()).await {
            Ok(()) => {}
            Err(PlatformError::ConnectionClosed { reason }) => {
                debug!(reason = %reason, "Connection closed while setting presence");
                if let Err(e) = self
                    .operator
                    .notify(self.platform.as_ref(), RECONNECTING_NOTICE)
                    .await
                {
                    warn!(error = %e, "Failed to notify operator of reconnect");
                }
            }
            Err(e) => warn!(error = %e, "Failed to set presence"),
        }
    }

    /// Re-applies the presence after a resumed session.
    pub async fn on_resumed(&self) {
        if let Err(e) = self.platform.set_presence(&self.config.bot.presence()).await {
            warn!(error = %e, "Failed to restore presence after resume");
        }
    }

    /// Resets the store's connections so a reconnect starts clean.
    pub async fn on_disconnect(&self) {
        if let Err(e) = self.store.disconnect().await {
            debug!(error = %e, "Ignoring store disconnect failure");
        }
    }

    /// Reports an event-level error without an invocation context.
    pub async fn on_error(&self, event: &str, error: PlatformError) {
        let error = anyhow::Error::new(error).context(format!("Ignoring exception in {event}"));
        self.dispatcher.pipeline().handle(&error, None).await;
    }

    /// Reports an error raised by an interactive component.
    pub async fn report_component_error(
        &self,
        error: &anyhow::Error,
        interaction: &ComponentInteraction,
    ) {
        self.dispatcher
            .pipeline()
            .handle_component(error, interaction)
            .await;
    }

    /// Runs until the event stream closes or a shutdown signal arrives.
    pub async fn run(&self, events: EventReceiver) -> RuntimeResult<()> {
        info!("Warden runtime is now running. Press Ctrl+C to stop.");
        self.run_until(events, wait_for_shutdown()).await
    }

    /// Runs until the event stream closes or `shutdown` completes.
    ///
    /// Messages are dispatched concurrently; every other event is handled
    /// in arrival order. The initial load runs alongside the event loop, so
    /// commands arriving meanwhile reach the gate and are turned away.
    /// In-flight dispatches are awaited before returning.
    pub async fn run_until<F>(&self, mut events: EventReceiver, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(RuntimeError::AlreadyRunning);
        }

        let keep_alive = if self.config.keep_alive.enabled {
            match spawn_keep_alive(&self.config.keep_alive).await {
                Ok(handle) => Some(handle),
                Err(e) => {
                    self.running.store(false, Ordering::Release);
                    return Err(e);
                }
            }
        } else {
            None
        };

        let mut tasks = JoinSet::new();
        let mut shutdown = std::pin::pin!(shutdown);
        let mut startup: Option<Startup<'_>> = None;

        let result = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                outcome = poll_startup(&mut startup), if startup.is_some() => {
                    startup = None;
                    if let Err(e) = outcome {
                        error!(error = %e, "Initial load failed, stopping");
                        break Err(e);
                    }
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        if self.lifecycle.phase() == Phase::Connecting {
                            warn!("Event stream closed before the first ready event");
                            break Err(RuntimeError::EventStreamClosed);
                        }
                        info!("Event stream closed");
                        break Ok(());
                    };
                    match event {
                        PlatformEvent::Message(message) => {
                            let dispatcher = self.dispatcher.clone();
                            tasks.spawn(async move {
                                dispatcher.dispatch(message).await;
                            });
                        }
                        PlatformEvent::Ready if startup.is_some() => {
                            debug!("Ready event during the initial load, announcement pending");
                        }
                        PlatformEvent::Ready if self.lifecycle.mark_ready() => {
                            debug!("Starting initial load");
                            startup = Some(Box::pin(self.first_ready()));
                        }
                        other => {
                            if let Err(e) = self.handle_event(other).await {
                                error!(error = %e, "Initial load failed, stopping");
                                break Err(e);
                            }
                        }
                    }
                }
            }

            while let Some(joined) = tasks.try_join_next() {
                log_join(joined);
            }
        };
        drop(startup);

        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }

        if let Some(handle) = keep_alive {
            handle.shutdown().await;
        }
        self.on_disconnect().await;
        self.running.store(false, Ordering::Release);

        info!("Runtime stopped");
        result
    }

    /// The initial load followed by the first announcement.
    async fn first_ready(&self) -> RuntimeResult<()> {
        self.init_load().await?;
        self.on_ready().await;
        Ok(())
    }
}

type Startup<'a> = Pin<Box<dyn Future<Output = RuntimeResult<()>> + 'a>>;

async fn poll_startup(startup: &mut Option<Startup<'_>>) -> RuntimeResult<()> {
    match startup {
        Some(load) => load.await,
        None => std::future::pending().await,
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "Dispatch task failed");
    }
}

/// Waits for Ctrl+C or SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down");
                    }
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`WardenRuntime`] with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    extensions: ExtensionSet,
    init_logging: bool,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            extensions: ExtensionSet::new(),
            init_logging: true,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: WardenConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Sets the extensions loaded at startup.
    pub fn extensions(mut self, extensions: ExtensionSet) -> Self {
        self.extensions = extensions;
        self
    }

    /// Leaves the global tracing subscriber alone.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    /// Loads and validates the configuration, initializes logging and
    /// builds the runtime.
    pub fn build(self, platform: BoxedPlatform, store: BoxedStore) -> RuntimeResult<WardenRuntime> {
        let config = self.config_loader.load()?;
        validate_config(&config)?;

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        info!(
            log_level = %config.logging.level,
            restricted_community = ?config.bot.restricted_community,
            "Runtime initialized from configuration"
        );

        Ok(WardenRuntime::from_config(config, platform, store).with_extensions(self.extensions))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
