//! Runtime orchestration.
//!
//! [`YoaiRuntime`] owns one bot: its configuration, the API client, the
//! handler registry and the polling loop that feeds it.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use yoai_runtime::YoaiRuntime;
//!
//! // Loads yoai.toml from the current directory plus YOAI_* variables
//! let runtime = YoaiRuntime::new()?;
//!
//! // Custom configuration path
//! let runtime = YoaiRuntime::builder()
//!     .config_file("config/yoai.toml")
//!     .build()?;
//!
//! // Use pre-loaded config
//! let config = load_config()?;
//! let runtime = YoaiRuntime::from_config(&config)?;
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use yoai_core::{Bot, BoxedTransport, UpdateSource};
use yoai_framework::{BoxedSink, Dispatcher, Handler, HandlerRegistry, TracingSink};
use yoai_transport::HttpTransport;

use crate::config::{ConfigLoader, YoaiConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::polling::{Poller, PollerStats};

/// A configured bot, ready to poll.
///
/// # Simple Usage
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use yoai_runtime::YoaiRuntime;
/// use yoai_framework::UpdateContext;
///
/// let runtime = YoaiRuntime::new()?;
/// runtime.on_command("ping", |_ctx: Arc<UpdateContext>| async { "pong".to_string() });
/// runtime.run().await?;
/// ```
pub struct YoaiRuntime {
    config: YoaiConfig,
    bot: Arc<Bot>,
    registry: Arc<HandlerRegistry>,
    sink: BoxedSink,
    source: Arc<dyn UpdateSource>,
    /// Parent of every run's cancellation token.
    shutdown: CancellationToken,
    stats: Arc<PollerStats>,
    running: AtomicBool,
}

impl YoaiRuntime {
    /// Creates a runtime from the default configuration sources.
    ///
    /// # Errors
    ///
    /// Fails if the configuration cannot be loaded or is invalid, or if the
    /// HTTP transport cannot be built from it.
    pub fn new() -> RuntimeResult<Self> {
        Self::builder().build()
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from a loaded configuration.
    ///
    /// Initializes logging, validates the configuration and builds the HTTP
    /// transport.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Config`] for an invalid configuration and
    /// [`RuntimeError::Transport`] if the client cannot be built.
    pub fn from_config(config: &YoaiConfig) -> RuntimeResult<Self> {
        logging::init_from_config(&config.logging);
        validate_config(config)?;

        let transport = HttpTransport::new(config.api.to_client_config())?;

        info!(
            base_url = %config.api.base_url,
            log_level = %config.logging.level,
            commands = config.commands.len(),
            "Runtime initialized from configuration"
        );

        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a runtime on top of an existing transport.
    ///
    /// Neither validates the configuration nor touches logging.
    pub fn with_transport(config: &YoaiConfig, transport: BoxedTransport) -> Self {
        let bot = Arc::new(Bot::new(transport));
        let source: Arc<dyn UpdateSource> = bot.clone();

        Self {
            config: config.clone(),
            bot,
            registry: Arc::new(HandlerRegistry::new()),
            sink: Arc::new(TracingSink),
            source,
            shutdown: CancellationToken::new(),
            stats: Arc::default(),
            running: AtomicBool::new(false),
        }
    }

    /// Replaces the sink receiving contained failures.
    pub fn with_sink(mut self, sink: BoxedSink) -> Self {
        self.sink = sink;
        self
    }

    /// Replaces where updates are fetched from. Defaults to the bot itself.
    pub fn with_update_source(mut self, source: Arc<dyn UpdateSource>) -> Self {
        self.source = source;
        self
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a handler for every message no command claims.
    pub fn on_message<H: Handler>(&self, handler: H) {
        self.registry.register_generic(handler);
    }

    /// Registers a handler for `/name`.
    ///
    /// Returns `true` if an earlier handler for the same name was replaced.
    pub fn on_command<H: Handler>(&self, name: impl Into<String>, handler: H) -> bool {
        self.registry.register_command(name, handler)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The configuration this runtime was built from.
    pub fn config(&self) -> &YoaiConfig {
        &self.config
    }

    /// The bot API client.
    pub fn bot(&self) -> &Arc<Bot> {
        &self.bot
    }

    /// The handler registry.
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Token that stops the runtime when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Polling counters, accumulated over every run.
    pub fn stats(&self) -> &Arc<PollerStats> {
        &self.stats
    }

    /// Returns whether the polling loop is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Runs until Ctrl+C or SIGTERM.
    pub async fn run(&self) -> RuntimeResult<()> {
        info!("YoAI runtime is now running. Press Ctrl+C to stop.");
        self.run_until(wait_for_shutdown()).await
    }

    /// Runs until `shutdown` completes or [`stop`](Self::stop) is called.
    ///
    /// The configured command menu is pushed first. When `shutdown` resolves,
    /// the update being dispatched finishes before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::AlreadyRunning`] if another run is active and
    /// [`RuntimeError::FatalTransport`] if the transport is misconfigured.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Runtime is already running");
            return Err(RuntimeError::AlreadyRunning);
        }

        let result = self.poll_until(shutdown).await;
        self.running.store(false, Ordering::SeqCst);

        info!("Runtime stopped");
        result
    }

    /// Stops the runtime. The loop exits between cycles.
    ///
    /// A stopped runtime cannot be started again.
    pub fn stop(&self) {
        info!("Stopping YoAI runtime");
        self.shutdown.cancel();
    }

    async fn poll_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.push_commands().await;

        let dispatcher = Dispatcher::new(Arc::clone(&self.registry), Arc::clone(&self.bot))
            .with_sink(Arc::clone(&self.sink));
        let poller = Poller::new(
            Arc::clone(&self.source),
            dispatcher,
            self.config.polling.to_settings(),
        )
        .with_stats(Arc::clone(&self.stats));

        let token = self.shutdown.child_token();
        let polling = poller.start(&token);
        tokio::pin!(polling);
        tokio::pin!(shutdown);

        tokio::select! {
            result = &mut polling => result,
            () = &mut shutdown => {
                token.cancel();
                polling.await
            }
        }
    }

    async fn push_commands(&self) {
        let commands = &self.config.commands;
        if commands.is_empty() {
            return;
        }

        if let Err(e) = self.bot.configure_commands(commands).await {
            warn!(error = %e, count = commands.len(), "Failed to configure commands");
        }
    }
}

impl std::fmt::Debug for YoaiRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoaiRuntime")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// Waits for Ctrl+C or SIGTERM.
///
/// If no signal can be registered this never resolves and only
/// [`YoaiRuntime::stop`] ends the run.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    result = signal::ctrl_c() => on_ctrl_c(result).await,
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                on_ctrl_c(signal::ctrl_c().await).await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        on_ctrl_c(signal::ctrl_c().await).await;
    }
}

async fn on_ctrl_c(result: std::io::Result<()>) {
    match result {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`YoaiRuntime`] with custom configuration sources.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = YoaiRuntime::builder()
///     .config_file("config/yoai.toml")
///     .profile("production")
///     .build()?;
/// ```
#[derive(Debug)]
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a builder searching the working directory and the user
    /// config directory.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
        }
    }

    /// Loads this file instead of searching.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a directory to search for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Reads `YOAI_*` environment variables (the default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Ignores environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration on top of every other source.
    pub fn merge(mut self, config: YoaiConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads the configuration and builds the runtime.
    ///
    /// # Errors
    ///
    /// See [`YoaiRuntime::from_config`].
    pub fn build(self) -> RuntimeResult<YoaiRuntime> {
        let config = self.config_loader.load()?;
        YoaiRuntime::from_config(&config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use figment::Jail;
    use parking_lot::Mutex;
    use serde_json::json;
    use yoai_core::{BotCommand, RawUpdate, TransportError};
    use yoai_framework::{Failure, UpdateContext};

    use super::*;
    use crate::config::ConfigError;
    use crate::testing::{CollectingSink, RecordingTransport, ScriptedSource, Step, request_error};

    fn test_config() -> YoaiConfig {
        let mut config = YoaiConfig::default();
        config.api.api_key = "key".to_string();
        config
    }

    fn runtime_with(
        config: &YoaiConfig,
        steps: Vec<Step>,
    ) -> (YoaiRuntime, Arc<RecordingTransport>, Arc<ScriptedSource>) {
        let transport = Arc::new(RecordingTransport::default());
        let source = ScriptedSource::new(steps);
        let runtime =
            YoaiRuntime::with_transport(config, transport.clone()).with_update_source(source.clone());
        (runtime, transport, source)
    }

    fn update(chat: &str, text: &str) -> RawUpdate {
        RawUpdate::new(json!({"chatId": chat, "text": text}))
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_routes_updates() {
        let (runtime, transport, _source) = runtime_with(
            &test_config(),
            vec![Step::Batch(vec![update("A", "/help"), update("B", "hi")])],
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        runtime.on_message(move |ctx: Arc<UpdateContext>| {
            let recorder = Arc::clone(&recorder);
            async move {
                recorder.lock().push(ctx.chat_id().to_string());
            }
        });
        runtime.on_command("help", |_ctx: Arc<UpdateContext>| async {
            "Commands: /help".to_string()
        });

        tokio_test::assert_ok!(
            runtime
                .run_until(tokio::time::sleep(Duration::from_secs(1)))
                .await
        );

        assert_eq!(*seen.lock(), vec!["B"]);
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "sendMessage");
        assert_eq!(sent[0].1["to"], "A");
        assert_eq!(runtime.stats().updates(), 2);
        assert!(!runtime.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_commands_are_pushed() {
        let mut config = test_config();
        config.commands = vec![BotCommand::new("help", "Show help")];
        let (runtime, transport, _source) = runtime_with(&config, Vec::new());

        tokio_test::assert_ok!(runtime.run_until(async {}).await);

        assert_eq!(transport.endpoints(), vec!["setCommands"]);
        assert_eq!(transport.sent()[0].1["commands"][0]["command"], "help");
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_run_is_rejected() {
        let (runtime, _transport, _source) = runtime_with(&test_config(), Vec::new());

        let (first, second) = tokio::join!(
            runtime.run_until(tokio::time::sleep(Duration::from_secs(5))),
            runtime.run_until(async {}),
        );

        tokio_test::assert_ok!(first);
        assert!(matches!(second, Err(RuntimeError::AlreadyRunning)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_run() {
        let (runtime, _transport, source) = runtime_with(&test_config(), Vec::new());

        runtime.stop();
        tokio_test::assert_ok!(runtime.run_until(std::future::pending()).await);

        assert!(source.fetches().is_empty());
        assert!(runtime.shutdown_token().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_run() {
        let (runtime, _transport, source) = runtime_with(&test_config(), Vec::new());

        let stopper = async {
            tokio::time::sleep(Duration::from_secs(4)).await;
            runtime.stop();
        };
        let (result, ()) = tokio::join!(runtime.run_until(std::future::pending()), stopper);

        tokio_test::assert_ok!(result);
        assert_eq!(source.fetches().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_reach_custom_sink() {
        let sink = Arc::new(CollectingSink::default());
        let (runtime, _transport, _source) = runtime_with(
            &test_config(),
            vec![Step::Fail(request_error()), Step::Batch(vec![update("C", "x")])],
        );
        let runtime = runtime.with_sink(sink.clone());
        runtime.on_message(|_ctx: Arc<UpdateContext>| async { Err::<(), _>("boom") });

        tokio_test::assert_ok!(
            runtime
                .run_until(tokio::time::sleep(Duration::from_secs(4)))
                .await
        );

        let failures = sink.failures();
        assert_eq!(failures.len(), 2);
        assert!(matches!(failures[0], Failure::Transport(_)));
        assert!(matches!(failures[1], Failure::Handler { ref chat_id, .. } if chat_id == "C"));
        assert_eq!(runtime.stats().fetch_failures(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_transport_ends_run() {
        let (runtime, _transport, _source) = runtime_with(
            &test_config(),
            vec![Step::Fail(TransportError::InvalidConfig("bad".to_string()))],
        );

        let result = runtime.run_until(std::future::pending()).await;

        assert!(matches!(result, Err(RuntimeError::FatalTransport(_))));
        assert!(!runtime.is_running());
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let result = YoaiRuntime::from_config(&YoaiConfig::default());
        assert!(matches!(
            result,
            Err(RuntimeError::Config(ConfigError::MissingField { .. }))
        ));
    }

    #[test]
    fn test_from_config_rejects_bad_base_url() {
        let mut config = test_config();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(matches!(
            YoaiRuntime::from_config(&config),
            Err(RuntimeError::Config(ConfigError::InvalidUrl { .. }))
        ));
    }

    #[test]
    fn test_builder_reads_env() {
        Jail::expect_with(|jail| {
            jail.set_env("YOAI_API__API_KEY", "from-env");
            jail.set_env("YOAI_POLLING__INTERVAL_SECS", "7");
            jail.set_env("YOAI_POLLING__COOLDOWN_SECS", "12");

            let runtime = YoaiRuntime::builder()
                .search_path(jail.directory())
                .build()
                .map_err(|e| e.to_string())?;

            assert_eq!(runtime.config().api.api_key, "from-env");
            assert_eq!(runtime.config().polling.interval_secs, 7);
            assert_eq!(runtime.config().polling.cooldown_secs, 12);
            assert!(!runtime.is_running());
            Ok(())
        });
    }

    #[test]
    fn test_builder_merge_wins() {
        Jail::expect_with(|jail| {
            jail.set_env("YOAI_API__API_KEY", "from-env");

            let runtime = YoaiRuntime::builder()
                .search_path(jail.directory())
                .merge(test_config())
                .build()
                .map_err(|e| e.to_string())?;

            assert_eq!(runtime.config().api.api_key, "key");
            Ok(())
        });
    }
}
