use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::{BoxedCommand, Command};
use crate::error::RegistryError;

/// Name and alias lookup for registered commands.
///
/// Extensions register commands while the process initializes, concurrently
/// with dispatch, so the table is behind a lock.
#[derive(Default)]
pub struct CommandRegistry {
    by_name: RwLock<HashMap<String, BoxedCommand>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `command` under its name and aliases.
    ///
    /// Nothing is registered if any of the names is taken.
    pub fn register(&self, command: impl Command + 'static) -> Result<(), RegistryError> {
        self.register_arc(Arc::new(command))
    }

    /// Registers an already shared command.
    pub fn register_arc(&self, command: BoxedCommand) -> Result<(), RegistryError> {
        let names: Vec<String> = std::iter::once(command.name())
            .chain(command.aliases().iter().map(String::as_str))
            .map(str::to_string)
            .collect();

        if let Some(bad) = names
            .iter()
            .find(|n| n.is_empty() || n.contains(char::is_whitespace))
        {
            return Err(RegistryError::InvalidName(bad.clone()));
        }

        let mut table = self.by_name.write();
        if let Some(taken) = names.iter().find(|n| table.contains_key(n.as_str())) {
            return Err(RegistryError::Duplicate(taken.clone()));
        }

        debug!(command = command.name(), aliases = names.len() - 1, "Registered command");
        for name in names {
            table.insert(name, Arc::clone(&command));
        }
        Ok(())
    }

    /// Looks up a command by exact name or alias.
    pub fn get(&self, name: &str) -> Option<BoxedCommand> {
        self.by_name.read().get(name).cloned()
    }

    /// Looks up the command a user invoked.
    ///
    /// Falls back to the name with `-` replaced by `_`, so `club-set`
    /// finds `club_set`.
    pub fn resolve(&self, invoked: &str) -> Option<BoxedCommand> {
        self.get(invoked).or_else(|| {
            invoked
                .contains('-')
                .then(|| invoked.replace('-', "_"))
                .and_then(|fallback| self.get(&fallback))
        })
    }

    /// Number of registered names, aliases included.
    pub fn len(&self) -> usize {
        self.by_name.read().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.read().is_empty()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.by_name.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("CommandRegistry")
            .field("names", &names)
            .finish()
    }
}
