//! Host-facing runtime orchestration.
//!
//! [`C3Runtime`] owns the command registry and the console front end. The
//! host calls [`C3Runtime::submit`] for every line typed into its console;
//! dispatched calls get a result-delivery task that waits for the script
//! runtime's answer, chunks it for the display and hands each chunk to
//! [`ConsoleHost::print`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use c3_runtime::C3Runtime;
//!
//! let runtime = C3Runtime::builder()
//!     .config_file("config/c3.toml")
//!     .script_runtime(Arc::new(MyScripts::new()))
//!     .host(Arc::new(MyConsole::new()))
//!     .build()?;
//!
//! if !runtime.submit("c3 spawn lydia --count 2", None) {
//!     // not a registered command, let the host run it
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use c3_core::{
    CommandDecl, CommandRegistry, Console, ConsoleHost, Dispatcher, Execution, NoObjects,
    ObjectResolver, PendingCall, RegistrationError, ScriptRuntime, Target, split_output,
};
use tokio::runtime::{Handle, Runtime};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, trace, warn};

use crate::config::{C3Config, ConfigLoader, DisplayConfig};
use crate::error::{LoadError, RuntimeError, RuntimeResult};
use crate::loader::load_directories;
use crate::logging;

/// The C3 console runtime.
pub struct C3Runtime {
    config: C3Config,
    console: Console,
    host: Arc<dyn ConsoleHost>,
    handle: Handle,
    /// Present only when no tokio runtime was running at build time.
    owned: Option<Runtime>,
    shutdown: CancellationToken,
    tasks: TaskTracker,
    load_failures: Vec<LoadError>,
    registration_issues: Vec<RegistrationError>,
}

impl C3Runtime {
    /// Creates a runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &C3Config {
        &self.config
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        self.console.registry()
    }

    /// Files and directories skipped while loading declarations.
    pub fn load_failures(&self) -> &[LoadError] {
        &self.load_failures
    }

    /// Declarations rejected while building the registry.
    pub fn registration_issues(&self) -> &[RegistrationError] {
        &self.registration_issues
    }

    /// The tokio handle result-delivery tasks are spawned on.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Whether this runtime created its own tokio runtime.
    pub fn owns_executor(&self) -> bool {
        self.owned.is_some()
    }

    /// Processes one console line.
    ///
    /// Returns `false` when the line is not a registered command, in which
    /// case the host should run it itself. Help and diagnostics are printed
    /// immediately; call results are printed when they arrive.
    pub fn submit(&self, line: &str, target: Option<&Target>) -> bool {
        trace!(line = %line, selection = ?target.map(|t| &t.identifier), "Console line submitted");

        match self.console.execute(line, target) {
            Execution::NotHandled => false,
            Execution::Help(text) | Execution::Failed(text) => {
                deliver(self.host.as_ref(), &self.config.display, &text);
                true
            }
            Execution::Dispatched(pending) => {
                self.spawn_delivery(pending);
                true
            }
        }
    }

    fn spawn_delivery(&self, pending: PendingCall) {
        if self.shutdown.is_cancelled() {
            warn!(command = %pending.command, "Runtime is shut down, result will not be shown");
            return;
        }

        let host = Arc::clone(&self.host);
        let display = self.config.display.clone();
        let token = self.shutdown.clone();
        let command = format!("{} {}", pending.command, pending.subcommand);

        self.tasks.spawn_on(
            async move {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(command = %command, "Result delivery cancelled");
                    }
                    text = pending.output() => {
                        deliver(host.as_ref(), &display, &text);
                    }
                }
            },
            &self.handle,
        );
    }

    /// Number of results still waiting to be delivered.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Waits until every result delivery spawned so far has finished.
    pub async fn wait_idle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Stops delivering outstanding results and waits for their tasks.
    ///
    /// Lines submitted afterwards are still parsed and dispatched, but their
    /// results are dropped.
    pub async fn shutdown(&self) {
        info!(pending = self.tasks.len(), "Shutting down C3 runtime");
        self.shutdown.cancel();
        self.tasks.close();
        self.tasks.wait().await;
    }

    /// Blocking variant of [`shutdown`](Self::shutdown) for hosts without an
    /// async context. Only waits when the runtime owns its executor.
    pub fn shutdown_blocking(&self) {
        self.shutdown.cancel();
        self.tasks.close();
        if let Some(runtime) = &self.owned {
            runtime.block_on(self.tasks.wait());
        }
    }
}

impl std::fmt::Debug for C3Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("C3Runtime")
            .field("commands", &self.registry().len())
            .field("pending", &self.tasks.len())
            .field("owns_executor", &self.owned.is_some())
            .finish_non_exhaustive()
    }
}

/// Chunks `text` for the display and prints every chunk in order.
fn deliver(host: &dyn ConsoleHost, display: &DisplayConfig, text: &str) {
    for chunk in split_output(text, &display.separator, display.width) {
        host.print(chunk);
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`C3Runtime`].
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    config: Option<C3Config>,
    script_runtime: Option<Arc<dyn ScriptRuntime>>,
    resolver: Arc<dyn ObjectResolver>,
    host: Option<Arc<dyn ConsoleHost>>,
    directories: Vec<PathBuf>,
    declarations: Vec<CommandDecl>,
    init_logging: bool,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            config: None,
            script_runtime: None,
            resolver: Arc::new(NoObjects),
            host: None,
            directories: Vec::new(),
            declarations: Vec::new(),
            init_logging: true,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: C3Config) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Uses `config` as is, skipping every configuration source.
    pub fn config(mut self, config: C3Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Leaves the global tracing subscriber alone.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    pub fn script_runtime(mut self, runtime: Arc<dyn ScriptRuntime>) -> Self {
        self.script_runtime = Some(runtime);
        self
    }

    /// Sets the object resolver (default: every object resolves to none).
    pub fn resolver(mut self, resolver: Arc<dyn ObjectResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn host(mut self, host: Arc<dyn ConsoleHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Adds a declaration directory on top of the configured ones.
    pub fn directory<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.directories.push(dir.as_ref().to_path_buf());
        self
    }

    /// Registers a declaration after every directory has been loaded.
    pub fn declaration(mut self, decl: CommandDecl) -> Self {
        self.declarations.push(decl);
        self
    }

    /// Loads configuration and declarations and builds the runtime.
    pub fn build(self) -> RuntimeResult<C3Runtime> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_loader.load()?,
        };
        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        let script_runtime = self
            .script_runtime
            .ok_or(RuntimeError::MissingScriptRuntime)?;
        let host = self.host.ok_or(RuntimeError::MissingHost)?;

        let mut directories = config.commands.directories.clone();
        directories.extend(self.directories);
        let loaded = load_directories(&directories, &config.commands.extensions);

        let mut registry = CommandRegistry::builder();
        for decl in loaded.decls().chain(&self.declarations) {
            let _ = registry.add(decl);
        }
        let (registry, registration_issues) = registry.finish();

        let (handle, owned) = match Handle::try_current() {
            Ok(handle) => (handle, None),
            Err(_) => {
                debug!("No tokio runtime running, starting one");
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .thread_name("c3-runtime")
                    .enable_all()
                    .build()
                    .map_err(RuntimeError::AsyncRuntime)?;
                (runtime.handle().clone(), Some(runtime))
            }
        };

        let dispatcher = Dispatcher::new(script_runtime, self.resolver, Arc::clone(&host));
        let console = Console::new(Arc::new(registry), dispatcher);

        info!(
            commands = console.registry().len(),
            skipped_files = loaded.failures.len(),
            rejected = registration_issues.len(),
            width = config.display.width,
            "C3 runtime initialized"
        );

        Ok(C3Runtime {
            config,
            console,
            host,
            handle,
            owned,
            shutdown: CancellationToken::new(),
            tasks: TaskTracker::new(),
            load_failures: loaded.failures,
            registration_issues,
        })
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use c3_core::{RemoteCall, RemoteError, ReplySlot, ReturnValue};
    use parking_lot::Mutex;

    /// Answers `Echo` with its first argument and holds every other call.
    #[derive(Default)]
    struct Scripts {
        held: Mutex<Vec<ReplySlot>>,
    }

    impl ScriptRuntime for Scripts {
        fn invoke(&self, call: RemoteCall, reply: ReplySlot) -> Result<(), RemoteError> {
            match call.callable.as_str() {
                "Echo" => {
                    let text = match call.args.first() {
                        Some(c3_core::CallValue::String(s)) => s.clone(),
                        _ => String::new(),
                    };
                    reply.resolve(ReturnValue::String(text));
                }
                "Fail" => reply.reject(RemoteError::rejected("boom")),
                _ => self.held.lock().push(reply),
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Screen {
        lines: Mutex<Vec<String>>,
    }

    impl ConsoleHost for Screen {
        fn print(&self, text: String) {
            self.lines.lock().push(text);
        }

        fn close_input(&self) {}
    }

    fn decl() -> CommandDecl {
        serde_json::from_value(serde_json::json!({
            "name": "c3",
            "script": "C3Commands",
            "subs": [
                { "name": "echo", "func": "Echo", "args": [{ "name": "text", "type": "string" }] },
                { "name": "fail", "func": "Fail" },
                { "name": "wait", "func": "Wait" }
            ]
        }))
        .unwrap()
    }

    fn config(width: usize) -> C3Config {
        let mut config = C3Config::default();
        config.commands.directories.clear();
        config.display.width = width;
        config
    }

    fn build(scripts: Arc<Scripts>, screen: Arc<Screen>, width: usize) -> C3Runtime {
        C3Runtime::builder()
            .config(config(width))
            .without_logging()
            .script_runtime(scripts)
            .host(screen)
            .declaration(decl())
            .build()
            .unwrap()
    }

    #[test]
    fn test_missing_collaborators() {
        let result = C3Runtime::builder()
            .config(config(80))
            .without_logging()
            .host(Arc::new(Screen::default()))
            .build();
        assert!(matches!(result, Err(RuntimeError::MissingScriptRuntime)));
    }

    #[tokio::test]
    async fn test_unregistered_lines_pass_through() {
        let screen = Arc::new(Screen::default());
        let runtime = build(Arc::default(), Arc::clone(&screen), 80);
        assert!(!runtime.owns_executor());

        assert!(!runtime.submit("tgm", None));
        assert!(!runtime.submit("   ", None));
        assert!(screen.lines.lock().is_empty());
    }

    #[tokio::test]
    async fn test_result_printed_in_chunks() {
        let screen = Arc::new(Screen::default());
        let runtime = build(Arc::default(), Arc::clone(&screen), 4);

        assert!(runtime.submit(r#"c3 echo "abcdef""#, None));
        runtime.wait_idle().await;

        assert_eq!(*screen.lines.lock(), vec!["abcd", "ef\n"]);
    }

    #[tokio::test]
    async fn test_diagnostics_printed_immediately() {
        let screen = Arc::new(Screen::default());
        let runtime = build(Arc::default(), Arc::clone(&screen), 1024);

        assert!(runtime.submit("c3 nope", None));
        assert!(runtime.submit("c3 echo -h", None));
        let lines = screen.lines.lock();
        assert!(lines[0].starts_with("ERROR c3: unrecognized subcommand nope."));
        assert!(lines[1].starts_with("usage: c3 echo <text>"));
    }

    #[tokio::test]
    async fn test_remote_failure_printed() {
        let screen = Arc::new(Screen::default());
        let runtime = build(Arc::default(), Arc::clone(&screen), 1024);

        runtime.submit("c3 fail", None);
        runtime.wait_idle().await;
        assert_eq!(
            *screen.lines.lock(),
            vec!["ERROR c3 fail: call rejected: boom.\nUse c3 fail -h for usage information.\n"]
        );
    }

    #[tokio::test]
    async fn test_shutdown_cancels_outstanding_results() {
        let scripts = Arc::new(Scripts::default());
        let screen = Arc::new(Screen::default());
        let runtime = build(Arc::clone(&scripts), Arc::clone(&screen), 1024);

        runtime.submit("c3 wait", None);
        assert_eq!(runtime.pending(), 1);

        runtime.shutdown().await;
        assert_eq!(runtime.pending(), 0);

        // A late answer reaches nobody.
        for slot in scripts.held.lock().drain(..) {
            slot.resolve(ReturnValue::Bool(true));
        }
        assert!(screen.lines.lock().is_empty());
    }

    #[test]
    fn test_owned_executor_without_ambient_runtime() {
        let screen = Arc::new(Screen::default());
        let runtime = build(Arc::default(), Arc::clone(&screen), 1024);
        assert!(runtime.owns_executor());

        assert!(runtime.submit("c3 echo hi", None));
        runtime.handle().block_on(runtime.wait_idle());
        assert_eq!(*screen.lines.lock(), vec!["hi\n"]);

        runtime.shutdown_blocking();
        assert_eq!(runtime.pending(), 0);

        // Results of lines submitted after shutdown are dropped.
        assert!(runtime.submit("c3 echo late", None));
        assert_eq!(runtime.pending(), 0);
        assert_eq!(*screen.lines.lock(), vec!["hi\n"]);
    }

    #[test]
    fn test_directories_and_issues() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.json"),
            r#"{ "name": "c3", "script": "Other" }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("b.json"), "{").unwrap();

        let runtime = C3Runtime::builder()
            .config(config(80))
            .without_logging()
            .script_runtime(Arc::new(Scripts::default()))
            .host(Arc::new(Screen::default()))
            .directory(dir.path())
            .declaration(decl())
            .build()
            .unwrap();

        // The directory copy of `c3` registers first, the programmatic one collides.
        assert_eq!(runtime.registry().get("c3").unwrap().script, "Other");
        assert_eq!(runtime.load_failures().len(), 1);
        assert!(matches!(
            runtime.registration_issues(),
            [RegistrationError::NameCollision { .. }]
        ));
    }
}
