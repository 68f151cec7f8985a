//! C3 Core - declarative console commands backed by a script runtime.
//!
//! This crate provides:
//! - Command schemas and their declaration format (`Command`, `CommandDecl`)
//! - The command registry with alias lookup (`CommandRegistry`)
//! - Quote-aware tokenizing and schema-driven argument binding
//! - Type coercion and asynchronous dispatch (`Dispatcher`, `DispatchHandle`)
//! - Help rendering and width-bounded output chunking
//!
//! Nothing in this crate performs I/O or owns an executor. The script
//! runtime, the object resolver and the console host are supplied by the
//! embedding application through the [`ScriptRuntime`], [`ObjectResolver`]
//! and [`ConsoleHost`] traits.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use c3_core::prelude::*;
//!
//! let registry = Arc::new(CommandRegistry::from_declarations(&decls));
//! let console = Console::new(
//!     registry,
//!     Dispatcher::new(runtime, Arc::new(NoObjects), host),
//! );
//!
//! match console.execute("c3 spawn lydia --count 2", None) {
//!     Execution::Dispatched(pending) => println!("{}", pending.output().await),
//!     Execution::Help(text) | Execution::Failed(text) => println!("{text}"),
//!     Execution::NotHandled => { /* let the host run the line */ }
//! }
//! ```

pub mod binder;
pub mod console;
pub mod dispatcher;
pub mod error;
pub mod help;
pub mod host;
pub mod output;
pub mod registry;
pub mod schema;
pub mod tokenizer;
pub mod value;

// Re-exports
pub use binder::{Binding, bind};
pub use console::{Console, Execution, Parsed, ParsedCommand, PendingCall};
pub use dispatcher::{
    DispatchHandle, Dispatcher, NoObjects, ObjectResolver, RemoteCall, ReplySlot, ScriptRuntime,
};
pub use error::{
    BindError, BindResult, DeclarationError, DispatchError, DispatchResult, ParseError,
    ParseResult, RegistrationError, RemoteError,
};
pub use help::{command_help, subcommand_help};
pub use host::ConsoleHost;
pub use output::{DEFAULT_SEPARATOR, split_output};
pub use registry::{CommandRegistry, RegistryBuilder};
pub use schema::{ArgType, Argument, Command, CommandDecl, Subcommand};
pub use tokenizer::tokenize;
pub use value::{CallValue, ObjectHandle, ObjectRef, ReturnValue, Target};

/// Commonly used items.
pub mod prelude {
    pub use crate::console::{Console, Execution, PendingCall};
    pub use crate::dispatcher::{
        DispatchHandle, Dispatcher, NoObjects, ObjectResolver, RemoteCall, ReplySlot,
        ScriptRuntime,
    };
    pub use crate::error::{DispatchError, ParseError, RemoteError};
    pub use crate::host::ConsoleHost;
    pub use crate::registry::CommandRegistry;
    pub use crate::schema::CommandDecl;
    pub use crate::value::{CallValue, ObjectHandle, ObjectRef, ReturnValue, Target};
}
