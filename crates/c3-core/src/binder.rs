//! Argument binder.
//!
//! Turns the tokens that follow a subcommand into one string value per
//! declared argument, in declaration order. Binding is purely textual; typed
//! coercion happens later in the [`Dispatcher`](crate::dispatcher::Dispatcher).
//!
//! Classification, token by token:
//!
//! 1. `-h` / `--help` stops binding and requests help.
//! 2. A token starting with `-` that is not a numeric literal is a flag
//!    token. Known no-value flags record `"true"`; known value flags consume
//!    the next token unless it is itself a flag token; unknown ones are
//!    collected as unrecognized.
//! 3. Everything else is positional, in order of appearance.
//!
//! The host's selected target, when supplied and the schema has a `selected`
//! argument, is injected before any token is looked at, so an explicit flag
//! always overrides it.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::error::{BindError, BindResult};
use crate::schema::{FLAG_MARKER, Subcommand, is_help_marker};

static NUMERIC_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?([0-9]+|[0-9]*\.[0-9]+)$").expect("numeric literal regex should compile")
});

/// Returns `true` for signed integer or decimal literals such as `-5` or `-.5`.
pub fn is_numeric_literal(token: &str) -> bool {
    NUMERIC_LITERAL.is_match(token)
}

/// Returns `true` if the token should be looked up as a flag.
pub fn is_flag_token(token: &str) -> bool {
    token.starts_with(FLAG_MARKER) && !is_numeric_literal(token)
}

/// Result of a successful bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A help marker was found; nothing was validated.
    Help,
    /// One value per argument slot.
    Values(Vec<String>),
}

/// Binds `tokens` against `sub`.
///
/// `selected` is the textual identifier of the host's current target, if any.
pub fn bind(sub: &Subcommand, tokens: &[String], selected: Option<&str>) -> BindResult<Binding> {
    let mut named: HashMap<usize, String> = HashMap::new();
    let mut positional: Vec<String> = Vec::new();
    let mut unrecognized: Vec<String> = Vec::new();
    let mut invalid: Vec<String> = Vec::new();

    if let (Some((slot, arg)), Some(value)) = (sub.selected_arg(), selected) {
        trace!(argument = %arg.name, value = %value, "Injecting selected target");
        if arg.is_positional() {
            positional.push(value.to_string());
        } else {
            named.insert(slot, value.to_string());
        }
    }

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();

        if is_help_marker(token) {
            return Ok(Binding::Help);
        }

        if !is_flag_token(token) {
            positional.push(token.to_string());
            i += 1;
            continue;
        }

        match sub.flag_slot(token) {
            Some(slot) => {
                let arg = &sub.args()[slot];
                if arg.flag {
                    named.insert(slot, "true".to_string());
                } else {
                    match tokens.get(i + 1) {
                        Some(value) if !is_flag_token(value) => {
                            named.insert(slot, value.clone());
                            i += 1;
                        }
                        _ => invalid.push(arg.display_name().to_string()),
                    }
                }
            }
            None => unrecognized.push(token.to_string()),
        }
        i += 1;
    }

    let declared = sub.args().iter().filter(|a| a.is_positional()).count();
    if positional.len() > declared {
        unrecognized.extend(positional.drain(declared..));
    }

    if !unrecognized.is_empty() {
        return Err(BindError::Unrecognized(unrecognized));
    }
    if !invalid.is_empty() {
        return Err(BindError::Invalid(invalid));
    }

    let mut values = Vec::with_capacity(sub.args().len());
    let mut missing = Vec::new();
    let mut positional = positional.into_iter();

    for (slot, arg) in sub.args().iter().enumerate() {
        let value = if arg.is_positional() {
            positional.next()
        } else if let Some(value) = named.remove(&slot) {
            Some(value)
        } else if !arg.required {
            Some(arg.default_value().to_string())
        } else {
            None
        };

        match value {
            Some(value) => values.push(value),
            None => {
                missing.push(arg.display_name().to_string());
                values.push(String::new());
            }
        }
    }

    if !missing.is_empty() {
        return Err(BindError::Missing(missing));
    }

    Ok(Binding::Values(values))
}
