//! Command registry.
//!
//! The registry maps command names and aliases to [`Command`]s. It is filled
//! in a single load pass through [`RegistryBuilder`] and is read-only
//! afterwards, so it can be shared freely (`Arc<CommandRegistry>`) without
//! locking.
//!
//! Collisions never overwrite: a command whose name is taken is skipped, and
//! an alias that is taken is skipped while the command itself stays
//! registered under its name.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::RegistrationError;
use crate::schema::{Command, CommandDecl};

/// Read-only lookup from command name/alias to command.
#[derive(Debug, Default, Clone)]
pub struct CommandRegistry {
    commands: Vec<Arc<Command>>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Starts a load pass.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Builds a registry from declarations, logging every rejected entry.
    pub fn from_declarations<'a, I>(decls: I) -> Self
    where
        I: IntoIterator<Item = &'a CommandDecl>,
    {
        let mut builder = Self::builder();
        for decl in decls {
            let _ = builder.add(decl);
        }
        builder.build()
    }

    /// Finds a command by name or alias.
    pub fn get(&self, token: &str) -> Option<&Arc<Command>> {
        self.index.get(token).map(|&i| &self.commands[i])
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Registered commands in load order.
    pub fn commands(&self) -> &[Arc<Command>] {
        &self.commands
    }

    /// Number of distinct commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Builder for the single registry load pass.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: CommandRegistry,
    issues: Vec<RegistrationError>,
}

impl RegistryBuilder {
    /// Decodes and registers one declaration.
    ///
    /// Failures are logged, remembered in [`issues`](Self::issues) and
    /// returned; they never poison the builder.
    pub fn add(&mut self, decl: &CommandDecl) -> Result<(), RegistrationError> {
        let result = decl
            .decode()
            .map_err(RegistrationError::from)
            .and_then(|command| self.insert(command));

        if let Err(e) = &result {
            warn!(error = %e, "Command declaration skipped");
            self.issues.push(e.clone());
        }
        result
    }

    /// Registers an already decoded command.
    ///
    /// An alias collision is recorded but is not an error for the command.
    pub fn insert(&mut self, command: Command) -> Result<(), RegistrationError> {
        let registry = &mut self.registry;
        if registry.index.contains_key(&command.name) {
            return Err(RegistrationError::NameCollision { name: command.name });
        }

        let position = registry.commands.len();
        registry.index.insert(command.name.clone(), position);

        if let Some(alias) = &command.alias {
            if registry.index.contains_key(alias) {
                let issue = RegistrationError::AliasCollision {
                    name: command.name.clone(),
                    alias: alias.clone(),
                };
                warn!(error = %issue, "Alias registration skipped");
                self.issues.push(issue);
            } else {
                registry.index.insert(alias.clone(), position);
            }
        }

        debug!(
            command = %command.name,
            subcommands = command.subs().len(),
            "Registered command"
        );
        registry.commands.push(Arc::new(command));
        Ok(())
    }

    /// Problems seen so far in this load pass.
    pub fn issues(&self) -> &[RegistrationError] {
        &self.issues
    }

    /// Finishes the load pass.
    pub fn build(self) -> CommandRegistry {
        info!(
            commands = self.registry.len(),
            issues = self.issues.len(),
            "Command registry loaded"
        );
        self.registry
    }

    /// Finishes the load pass and hands back the recorded problems too.
    pub fn finish(self) -> (CommandRegistry, Vec<RegistrationError>) {
        let issues = self.issues.clone();
        (self.build(), issues)
    }
}
