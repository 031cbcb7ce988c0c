//! Handler registry.
//!
//! The registry maps command tokens to a single handler each and keeps an
//! ordered list of generic handlers. It is owned by one bot instance and
//! shared with the dispatcher behind an `Arc`.
//!
//! Registration may happen while the polling loop is running, so both maps
//! sit behind a `parking_lot::RwLock`. Readers clone the `Arc`s they need and
//! release the lock before any handler runs.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::command::{COMMAND_PREFIX, command_key};
use crate::handler::{BoxedHandler, CommandHandler, GenericHandler, Handler};

#[derive(Default)]
struct Handlers {
    commands: HashMap<String, CommandHandler>,
    generic: Vec<GenericHandler>,
}

/// Command and generic handlers of one bot.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<Handlers>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a generic handler.
    ///
    /// Generic handlers run in registration order. Registering the same
    /// handler twice makes it run twice.
    pub fn register_generic<H: Handler>(&self, handler: H) {
        self.register_generic_boxed(Arc::new(handler));
    }

    /// Appends an already type-erased generic handler.
    pub fn register_generic_boxed(&self, handler: BoxedHandler) {
        let mut handlers = self.handlers.write();
        handlers.generic.push(handler);
        debug!(count = handlers.generic.len(), "Generic handler registered");
    }

    /// Registers `handler` for the command `name`, given without the prefix.
    ///
    /// A later registration under the same name replaces the earlier one.
    /// Returns `true` if a handler was replaced.
    pub fn register_command<H: Handler>(&self, name: impl Into<String>, handler: H) -> bool {
        self.register_command_boxed(name, Arc::new(handler))
    }

    /// Registers an already type-erased command handler.
    pub fn register_command_boxed(&self, name: impl Into<String>, handler: BoxedHandler) -> bool {
        let name = name.into();
        if name.starts_with(COMMAND_PREFIX) {
            warn!(
                command = %name,
                "Command name already starts with '{COMMAND_PREFIX}'; it will be stored as '{}'",
                command_key(&name)
            );
        }
        if name.contains(char::is_whitespace) {
            warn!(command = %name, "Command name contains whitespace and can never match");
        }

        let key = command_key(&name);
        let replaced = self
            .handlers
            .write()
            .commands
            .insert(key.clone(), handler)
            .is_some();

        if replaced {
            debug!(command = %key, "Command handler replaced");
        } else {
            debug!(command = %key, "Command handler registered");
        }
        replaced
    }

    /// Looks up the handler for an exact command token, prefix included.
    pub fn lookup_command(&self, token: &str) -> Option<CommandHandler> {
        self.handlers.read().commands.get(token).cloned()
    }

    /// Snapshot of the generic handlers in registration order.
    pub fn generic_handlers(&self) -> Vec<GenericHandler> {
        self.handlers.read().generic.clone()
    }

    /// Number of registered commands.
    pub fn command_count(&self) -> usize {
        self.handlers.read().commands.len()
    }

    /// Number of registered generic handlers.
    pub fn generic_count(&self) -> usize {
        self.handlers.read().generic.len()
    }

    /// Registered command tokens, sorted.
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.handlers.read().commands.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        let handlers = self.handlers.read();
        handlers.commands.is_empty() && handlers.generic.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("commands", &self.command_names())
            .field("generic_count", &self.generic_count())
            .finish()
    }
}
