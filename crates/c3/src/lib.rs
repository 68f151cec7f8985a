//! # C3
//!
//! Declarative console commands for scripted hosts.
//!
//! ## Overview
//!
//! Commands are declared in YAML, TOML or JSON files: a command maps to a
//! namespace of the host's scripting runtime, each subcommand maps to one
//! callable in it, and each argument is typed. Typed lines are tokenized,
//! bound to the declared arguments, coerced and submitted to the script
//! runtime; the result is printed back into the host console.
//!
//! ```text
//! ┌──────────┐  line   ┌───────────┐  bind   ┌────────────┐  invoke  ┌────────────────┐
//! │  Host    │────────▶│  Console  │────────▶│ Dispatcher │─────────▶│ Script runtime │
//! │ console  │◀────────│ (registry)│         └────────────┘          └────────────────┘
//! └──────────┘  print  └───────────┘◀───────────── reply ─────────────────────┘
//! ```
//!
//! - **c3-core**: schema, registry, tokenizer, binder, dispatcher (no I/O)
//! - **c3-runtime**: configuration, logging, declaration loading, `C3Runtime`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use c3::prelude::*;
//!
//! let runtime = C3Runtime::builder()
//!     .script_runtime(Arc::new(MyScripts))
//!     .host(Arc::new(MyConsole))
//!     .build()?;
//!
//! runtime.submit("c3 heal 25", None);
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration and declarations
//! - `yaml-config` *(default)*: YAML configuration and declarations
//! - `json-log`: JSON log output

pub use c3_core as core;
pub use c3_runtime as runtime;

/// Prelude module for convenient imports.
pub mod prelude {
    // Runtime - main entry point
    pub use c3_runtime::{C3Config, C3Runtime, ConfigLoader, RuntimeBuilder};

    // Host collaborators
    pub use c3_core::{ConsoleHost, ObjectResolver, RemoteCall, ReplySlot, ScriptRuntime};

    // Values crossing the host boundary
    pub use c3_core::{CallValue, ObjectHandle, ObjectRef, ReturnValue, Target};

    // Lower-level pipeline access
    pub use c3_core::{CommandDecl, CommandRegistry, Console, Execution, NoObjects};

    pub use c3_core::{DispatchError, ParseError, RemoteError};
}
