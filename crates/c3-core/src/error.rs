//! Error types for the C3 command core.
//!
//! Load-time problems ([`DeclarationError`], [`RegistrationError`]) are
//! reported and the offending declaration is skipped. Line-time problems
//! ([`ParseError`], [`BindError`], [`DispatchError`]) are rendered into a
//! diagnostic for the host display; none of them are fatal.

use thiserror::Error;

use crate::schema::ArgType;

// =============================================================================
// Load-time Errors
// =============================================================================

/// A declaration that cannot be turned into a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    /// A required field is absent or empty.
    #[error("{entity} declaration is missing required field '{field}'")]
    MissingField {
        /// `"command"`, `"subcommand"` or `"argument"`.
        entity: &'static str,
        /// Field name as written in the declaration format.
        field: &'static str,
    },

    /// A `selected` argument was declared without a flag marker.
    #[error("argument '{argument}' of '{subcommand}' is selected but positional")]
    SelectedPositional {
        subcommand: String,
        argument: String,
    },

    /// Two arguments of one subcommand share a name.
    #[error("argument '{argument}' is declared twice in '{subcommand}'")]
    DuplicateArgument {
        subcommand: String,
        argument: String,
    },
}

impl DeclarationError {
    pub(crate) fn missing(entity: &'static str, field: &'static str) -> Self {
        Self::MissingField { entity, field }
    }
}

/// A command that could not be added to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The command name is already registered; the command is skipped.
    #[error("command '{name}' is already registered")]
    NameCollision { name: String },

    /// The alias is already registered; only the alias entry is skipped.
    #[error("alias '{alias}' of command '{name}' is already registered")]
    AliasCollision { name: String, alias: String },

    /// The declaration itself is malformed.
    #[error(transparent)]
    Declaration(#[from] DeclarationError),
}

// =============================================================================
// Line-time Errors
// =============================================================================

/// Classification failures from the argument binder.
///
/// At most one category is reported per bind, ranked
/// unrecognized > invalid > missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// Unknown flag tokens, or positional tokens beyond the declared ones.
    #[error("unrecognized arguments: {}", .0.join(" "))]
    Unrecognized(Vec<String>),

    /// Flags that take a value but were given none.
    #[error("expected a value for: {}", .0.join(" "))]
    Invalid(Vec<String>),

    /// Required arguments that were not supplied.
    #[error("missing required arguments: {}", .0.join(" "))]
    Missing(Vec<String>),
}

/// Failures turning one input line into a bound subcommand call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line is blank.
    #[error("empty command line")]
    Empty,

    /// The first token names no registered command.
    #[error("unrecognized command {0}")]
    UnknownCommand(String),

    /// The command token is not followed by a subcommand token.
    #[error("missing subcommand")]
    MissingSubcommand { command: String },

    /// The subcommand token names no subcommand of the command.
    #[error("unrecognized subcommand {subcommand}")]
    UnknownSubcommand { command: String, subcommand: String },

    /// The argument tokens do not satisfy the subcommand schema.
    #[error("{source}")]
    Bind {
        command: String,
        subcommand: String,
        #[source]
        source: BindError,
    },
}

/// Error reported by the remote script runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The namespace or callable does not exist on the remote side.
    #[error("function {namespace}.{callable} not found")]
    NotFound { namespace: String, callable: String },

    /// The runtime refused or failed the call.
    #[error("call rejected: {0}")]
    Rejected(String),
}

impl RemoteError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}

/// Failures of the dispatch stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// A bound value is not a valid literal for its declared type. No call
    /// is made.
    #[error("invalid {kind} value '{value}' for {argument}")]
    Coercion {
        argument: String,
        value: String,
        kind: ArgType,
    },

    /// The bound values do not line up one-to-one with the argument slots.
    /// No call is made.
    #[error("expected {expected} argument values, got {actual}")]
    Arity { expected: usize, actual: usize },

    /// The remote runtime failed the call.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The runtime dropped the reply slot without answering.
    #[error("call was abandoned by the script runtime")]
    Abandoned,
}

impl DispatchError {
    pub(crate) fn coercion(argument: &str, value: &str, kind: ArgType) -> Self {
        Self::Coercion {
            argument: argument.to_string(),
            value: value.to_string(),
            kind,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for binding operations.
pub type BindResult<T> = Result<T, BindError>;

/// Result type for line parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
