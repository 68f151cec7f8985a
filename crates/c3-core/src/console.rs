//! Line-level front end: tokenize, look up, bind, dispatch.
//!
//! ```text
//! raw line ──▶ tokenize ──▶ registry lookup ──▶ bind ──▶ dispatch ──▶ PendingCall
//! ```
//!
//! Every failure is turned into a short diagnostic that points at the
//! relevant help text; nothing here is fatal and the console is ready for the
//! next line as soon as [`Console::execute`] returns.

use std::sync::Arc;

use tracing::{debug, error, trace};

use crate::binder::{Binding, bind};
use crate::dispatcher::{DispatchHandle, Dispatcher};
use crate::error::{DispatchError, ParseError, ParseResult};
use crate::help::{command_help, subcommand_help};
use crate::registry::CommandRegistry;
use crate::schema::{Command, Subcommand, is_help_marker};
use crate::tokenizer::tokenize;
use crate::value::Target;

/// A line that bound successfully and is ready to dispatch.
#[derive(Debug, Clone)]
pub struct ParsedCommand {
    pub command: Arc<Command>,
    pub sub: Arc<Subcommand>,
    /// One value per argument slot of `sub`.
    pub values: Vec<String>,
}

/// Outcome of the synchronous half of processing a line.
#[derive(Debug, Clone)]
pub enum Parsed {
    /// Help was requested; the rendered text.
    Help(String),
    Call(ParsedCommand),
}

/// A dispatched call waiting for its result.
#[derive(Debug)]
pub struct PendingCall {
    pub command: String,
    pub subcommand: String,
    pub handle: DispatchHandle,
}

impl PendingCall {
    /// Waits for the call and renders either its result or a diagnostic.
    pub async fn output(self) -> String {
        match self.handle.await {
            Ok(text) => text,
            Err(e) => {
                error!(command = %self.command, subcommand = %self.subcommand, error = %e, "Remote call failed");
                render_subcommand_error(&self.command, &self.subcommand, &e.to_string())
            }
        }
    }
}

/// What happened to one console line.
#[derive(Debug)]
pub enum Execution {
    /// Not a registered command; the host should handle the line itself.
    NotHandled,
    Help(String),
    /// Rendered diagnostic for the host display.
    Failed(String),
    Dispatched(PendingCall),
}

impl Execution {
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::NotHandled)
    }
}

/// `ERROR <cmd>: <msg>.` plus a pointer to the command help.
pub fn render_command_error(command: &str, message: &str) -> String {
    format!("ERROR {command}: {message}.\nUse {command} -h for usage information.")
}

/// `ERROR <cmd> <sub>: <msg>.` plus a pointer to the subcommand help.
pub fn render_subcommand_error(command: &str, subcommand: &str, message: &str) -> String {
    let combined = format!("{command} {subcommand}");
    format!("ERROR {combined}: {message}.\nUse {combined} -h for usage information.")
}

/// Parses and dispatches console lines against one registry.
#[derive(Debug, Clone)]
pub struct Console {
    registry: Arc<CommandRegistry>,
    dispatcher: Dispatcher,
}

impl Console {
    pub fn new(registry: Arc<CommandRegistry>, dispatcher: Dispatcher) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Tokenizes, looks up and binds `line` without dispatching it.
    pub fn parse(&self, line: &str, target: Option<&Target>) -> ParseResult<Parsed> {
        let tokens = tokenize(line);
        trace!(?tokens, "Tokenized console line");

        let Some(first) = tokens.first() else {
            return Err(ParseError::Empty);
        };
        let command = self
            .registry
            .get(first)
            .ok_or_else(|| ParseError::UnknownCommand(first.clone()))?;

        let Some(second) = tokens.get(1) else {
            return Err(ParseError::MissingSubcommand {
                command: command.name.clone(),
            });
        };
        if is_help_marker(second) {
            return Ok(Parsed::Help(command_help(command)));
        }
        let Some(sub) = command.sub(second) else {
            // A help marker after an unknown subcommand still asks for help.
            if tokens[2..].iter().any(|t| is_help_marker(t)) {
                return Ok(Parsed::Help(command_help(command)));
            }
            return Err(ParseError::UnknownSubcommand {
                command: command.name.clone(),
                subcommand: second.clone(),
            });
        };

        let selected = target.map(|t| t.identifier.as_str());
        match bind(sub, &tokens[2..], selected) {
            Ok(Binding::Help) => Ok(Parsed::Help(subcommand_help(command, sub))),
            Ok(Binding::Values(values)) => Ok(Parsed::Call(ParsedCommand {
                command: Arc::clone(command),
                sub: Arc::clone(sub),
                values,
            })),
            Err(source) => Err(ParseError::Bind {
                command: command.name.clone(),
                subcommand: sub.name.clone(),
                source,
            }),
        }
    }

    /// Dispatches an already parsed call.
    pub fn dispatch(
        &self,
        parsed: &ParsedCommand,
        target: Option<&Target>,
    ) -> Result<PendingCall, DispatchError> {
        let handle = self.dispatcher.dispatch(
            &parsed.command.script,
            &parsed.sub,
            &parsed.values,
            target,
        )?;
        Ok(PendingCall {
            command: parsed.command.name.clone(),
            subcommand: parsed.sub.name.clone(),
            handle,
        })
    }

    /// Processes one console line end to end.
    pub fn execute(&self, line: &str, target: Option<&Target>) -> Execution {
        let parsed = match self.parse(line, target) {
            Ok(Parsed::Help(text)) => return Execution::Help(text),
            Ok(Parsed::Call(parsed)) => parsed,
            Err(ParseError::Empty | ParseError::UnknownCommand(_)) => {
                return Execution::NotHandled;
            }
            Err(ParseError::MissingSubcommand { command }) => {
                return match self.registry.get(&command) {
                    Some(cmd) => Execution::Help(command_help(cmd)),
                    None => Execution::NotHandled,
                };
            }
            Err(e) => {
                debug!(error = %e, "Console line rejected");
                return Execution::Failed(render_parse_error(&e));
            }
        };

        match self.dispatch(&parsed, target) {
            Ok(pending) => Execution::Dispatched(pending),
            Err(e) => {
                debug!(error = %e, "Dispatch failed");
                Execution::Failed(render_subcommand_error(
                    &parsed.command.name,
                    &parsed.sub.name,
                    &e.to_string(),
                ))
            }
        }
    }
}

/// Renders a parse failure for the host display.
pub fn render_parse_error(error: &ParseError) -> String {
    match error {
        ParseError::Empty => error.to_string(),
        ParseError::UnknownCommand(name) => render_command_error(name, &error.to_string()),
        ParseError::MissingSubcommand { command }
        | ParseError::UnknownSubcommand { command, .. } => {
            render_command_error(command, &error.to_string())
        }
        ParseError::Bind {
            command,
            subcommand,
            source,
        } => render_subcommand_error(command, subcommand, &source.to_string()),
    }
}
