//! Immutable command schema model.
//!
//! A [`Command`] groups [`Subcommand`]s under one remote script namespace, and
//! each subcommand owns an ordered list of [`Argument`]s together with two
//! lookup indices:
//!
//! - `all`: argument name → slot in the bound value vector (one entry per
//!   argument);
//! - `flags`: flag token (name and alias) → slot, non-positional arguments only.
//!
//! Schemas are built once from [`declaration`]s at load time and never
//! mutated afterwards.

pub mod declaration;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

pub use declaration::{ArgumentDecl, CommandDecl, SubcommandDecl};

use crate::error::DeclarationError;

/// Prefix that marks a token (or an argument name) as a flag.
pub const FLAG_MARKER: char = '-';

/// Tokens that request help wherever they appear.
pub const HELP_MARKERS: [&str; 2] = ["-h", "--help"];

/// Returns `true` if the token is one of the help markers.
pub fn is_help_marker(token: &str) -> bool {
    HELP_MARKERS.contains(&token)
}

// =============================================================================
// Argument
// =============================================================================

/// Primitive kind an argument is coerced to before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArgType {
    Int,
    Bool,
    Float,
    String,
    /// Opaque host object, resolved through an
    /// [`ObjectResolver`](crate::dispatcher::ObjectResolver).
    #[default]
    Object,
}

impl ArgType {
    /// Parses a declared type name, case-insensitively.
    ///
    /// Anything that is not one of the four primitive names is an object
    /// type; the raw name is kept separately as the resolver's subtype tag.
    pub fn from_declared(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "int" => Self::Int,
            "bool" => Self::Bool,
            "float" => Self::Float,
            "string" => Self::String,
            _ => Self::Object,
        }
    }

    /// Textual default used when an optional argument is omitted.
    pub fn default_literal(self) -> &'static str {
        match self {
            Self::Int => "0",
            Self::Bool => "false",
            Self::Float => "0.0",
            Self::String => "",
            Self::Object => "none",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::String => "string",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared parameter of a subcommand.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub alias: Option<String>,
    pub help: String,
    pub kind: ArgType,
    /// Declared type name as written, e.g. `"actor"`. Only the object
    /// resolver looks at it.
    pub raw_type: String,
    pub default: Option<String>,
    /// Presence alone means `true`; no value token is consumed.
    pub flag: bool,
    pub required: bool,
    /// Auto-filled from the host's currently selected target.
    pub selected: bool,
}

impl Argument {
    /// Positional arguments are the ones whose name carries no flag marker.
    pub fn is_positional(&self) -> bool {
        !self.name.starts_with(FLAG_MARKER)
    }

    /// Value assigned when a non-positional argument is omitted.
    pub fn default_value(&self) -> &str {
        self.default
            .as_deref()
            .unwrap_or_else(|| self.kind.default_literal())
    }

    /// Name without its leading flag markers, for diagnostics and help.
    pub fn display_name(&self) -> &str {
        self.name.trim_start_matches(FLAG_MARKER)
    }
}

// =============================================================================
// Subcommand
// =============================================================================

/// One invocable operation, bound to a single remote callable.
#[derive(Debug, Clone)]
pub struct Subcommand {
    pub name: String,
    pub alias: Option<String>,
    pub help: String,
    /// Remote callable name inside the command's script namespace.
    pub func: String,
    /// Dismiss the host's input surface when invoked.
    pub close: bool,
    args: Vec<Argument>,
    all: HashMap<String, usize>,
    flags: HashMap<String, usize>,
}

impl Subcommand {
    /// Builds a subcommand and its indices.
    ///
    /// Argument names must be unique; flag tokens are first-wins, so an alias
    /// that collides with an already indexed token is dropped with a warning.
    pub(crate) fn new(
        name: String,
        alias: Option<String>,
        help: String,
        func: String,
        close: bool,
        args: Vec<Argument>,
    ) -> Result<Self, DeclarationError> {
        let mut all = HashMap::with_capacity(args.len());
        let mut flags = HashMap::new();

        for (slot, arg) in args.iter().enumerate() {
            if all.insert(arg.name.clone(), slot).is_some() {
                return Err(DeclarationError::DuplicateArgument {
                    subcommand: name,
                    argument: arg.name.clone(),
                });
            }
        }

        for (slot, arg) in args.iter().enumerate() {
            if arg.is_positional() {
                continue;
            }
            if flags.contains_key(&arg.name) {
                warn!(subcommand = %name, flag = %arg.name, "Flag token already indexed, skipping");
            } else {
                flags.insert(arg.name.clone(), slot);
            }
            if let Some(alias) = &arg.alias {
                if flags.contains_key(alias) {
                    warn!(subcommand = %name, alias = %alias, "Flag alias collides, skipping");
                } else {
                    flags.insert(alias.clone(), slot);
                }
            }
        }

        Ok(Self {
            name,
            alias,
            help,
            func,
            close,
            args,
            all,
            flags,
        })
    }

    /// Arguments in declaration order; index = value-vector slot.
    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    /// Looks up an argument by its declared name.
    pub fn arg(&self, name: &str) -> Option<&Argument> {
        self.all.get(name).map(|&slot| &self.args[slot])
    }

    /// Value-vector slot of the named argument.
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.all.get(name).copied()
    }

    /// Resolves a flag token (name or alias) to its slot.
    pub fn flag_slot(&self, token: &str) -> Option<usize> {
        self.flags.get(token).copied()
    }

    /// Number of flag tokens indexed.
    pub fn flag_count(&self) -> usize {
        self.flags.len()
    }

    /// The argument filled from the host's selection, if any.
    pub fn selected_arg(&self) -> Option<(usize, &Argument)> {
        self.args.iter().enumerate().find(|(_, arg)| arg.selected)
    }
}

// =============================================================================
// Command
// =============================================================================

/// A top-level command: a named group of subcommands in one script namespace.
#[derive(Debug, Clone)]
pub struct Command {
    pub name: String,
    pub alias: Option<String>,
    pub help: String,
    /// Remote namespace the subcommands' callables live in.
    pub script: String,
    subs: Vec<Arc<Subcommand>>,
    lookup: HashMap<String, usize>,
}

impl Command {
    pub(crate) fn new(
        name: String,
        alias: Option<String>,
        help: String,
        script: String,
    ) -> Self {
        Self {
            name,
            alias,
            help,
            script,
            subs: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Adds a subcommand under its name and alias.
    ///
    /// Returns `false` (and adds nothing) if the name is taken. A colliding
    /// alias is skipped while the name registration stands.
    pub(crate) fn insert_sub(&mut self, sub: Subcommand) -> bool {
        if self.lookup.contains_key(&sub.name) {
            warn!(command = %self.name, subcommand = %sub.name, "Subcommand name already registered, skipping");
            return false;
        }

        let index = self.subs.len();
        self.lookup.insert(sub.name.clone(), index);
        if let Some(alias) = &sub.alias {
            if self.lookup.contains_key(alias) {
                warn!(command = %self.name, alias = %alias, "Subcommand alias collides, skipping alias");
            } else {
                self.lookup.insert(alias.clone(), index);
            }
        }
        self.subs.push(Arc::new(sub));
        true
    }

    /// Finds a subcommand by name or alias.
    pub fn sub(&self, token: &str) -> Option<&Arc<Subcommand>> {
        self.lookup.get(token).map(|&index| &self.subs[index])
    }

    /// Subcommands in declaration order.
    pub fn subs(&self) -> &[Arc<Subcommand>] {
        &self.subs
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn arg(name: &str, kind: ArgType) -> Argument {
        Argument {
            name: name.to_string(),
            alias: None,
            help: String::new(),
            kind,
            raw_type: kind.as_str().to_string(),
            default: None,
            flag: false,
            required: false,
            selected: false,
        }
    }

    pub(crate) fn sub(args: Vec<Argument>) -> Subcommand {
        Subcommand::new(
            "sub".into(),
            None,
            String::new(),
            "Func".into(),
            false,
            args,
        )
        .unwrap()
    }

    #[test]
    fn test_type_names_case_insensitive() {
        assert_eq!(ArgType::from_declared("INT"), ArgType::Int);
        assert_eq!(ArgType::from_declared("Float"), ArgType::Float);
        assert_eq!(ArgType::from_declared("actor"), ArgType::Object);
        assert_eq!(ArgType::from_declared(""), ArgType::Object);
    }

    #[test]
    fn test_positional_derived_from_name() {
        assert!(arg("target", ArgType::String).is_positional());
        assert!(!arg("--count", ArgType::Int).is_positional());
        assert!(!arg("-c", ArgType::Int).is_positional());
    }

    #[test]
    fn test_indices() {
        let mut count = arg("--count", ArgType::Int);
        count.alias = Some("-c".into());
        let s = sub(vec![arg("target", ArgType::String), count]);

        assert_eq!(s.slot("target"), Some(0));
        assert_eq!(s.slot("--count"), Some(1));
        assert_eq!(s.flag_slot("--count"), Some(1));
        assert_eq!(s.flag_slot("-c"), Some(1));
        assert_eq!(s.flag_slot("target"), None);
        assert_eq!(s.flag_count(), 2);
    }

    #[test]
    fn test_duplicate_argument_name_rejected() {
        let err = Subcommand::new(
            "sub".into(),
            None,
            String::new(),
            "Func".into(),
            false,
            vec![arg("--x", ArgType::Int), arg("--x", ArgType::Bool)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            DeclarationError::DuplicateArgument {
                subcommand: "sub".into(),
                argument: "--x".into(),
            }
        );
    }

    #[test]
    fn test_colliding_flag_alias_is_first_wins() {
        let first = arg("--force", ArgType::Bool);
        let mut second = arg("--fast", ArgType::Bool);
        second.alias = Some("--force".into());
        let s = sub(vec![first, second]);

        assert_eq!(s.flag_slot("--force"), Some(0));
        assert_eq!(s.flag_slot("--fast"), Some(1));
    }

    #[test]
    fn test_default_value() {
        let mut count = arg("--count", ArgType::Int);
        assert_eq!(count.default_value(), "0");
        count.default = Some("1".into());
        assert_eq!(count.default_value(), "1");
        assert_eq!(arg("--who", ArgType::Object).default_value(), "none");
        assert_eq!(arg("--msg", ArgType::String).default_value(), "");
    }

    #[test]
    fn test_command_sub_lookup_by_alias() {
        let mut cmd = Command::new("c3".into(), None, String::new(), "C3Script".into());
        let mut s = sub(vec![]);
        s.alias = Some("s".into());
        assert!(cmd.insert_sub(s.clone()));
        assert!(!cmd.insert_sub(s));

        assert!(cmd.sub("sub").is_some());
        assert!(cmd.sub("s").is_some());
        assert_eq!(cmd.subs().len(), 1);
    }
}
