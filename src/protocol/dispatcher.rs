//! Dispatcher
//!
//! Maps a tokenized request onto the verb table.

use std::collections::HashMap;

use crate::pubsub::ClientHandle;
use crate::store::Store;

use super::command::{CommandSpec, COMMANDS};
use super::response::{sanitize, ERROR, UNKNOWN_COMMAND};

/// Verb lookup over `COMMANDS`
pub struct Dispatcher {
    table: HashMap<&'static str, CommandSpec>,
}

impl Dispatcher {
    /// Build the lookup table
    pub fn new() -> Self {
        let table = COMMANDS.iter().map(|spec| (spec.verb, *spec)).collect();
        Self { table }
    }

    /// Look up a verb
    pub fn command(&self, verb: &str) -> Option<&CommandSpec> {
        self.table.get(verb)
    }

    /// Run one request and produce its reply line
    ///
    /// Order of checks:
    /// 1. Fewer than 2 tokens → `ERROR`
    /// 2. Unknown verb → `Unknown command`
    /// 3. Fewer arguments than the verb needs → `ERROR`
    pub fn dispatch(&self, store: &Store, tokens: &[String], client: &ClientHandle) -> String {
        let Some((verb, args)) = tokens.split_first() else {
            return ERROR.to_string();
        };
        if args.is_empty() {
            return ERROR.to_string();
        }

        let Some(spec) = self.command(verb) else {
            return UNKNOWN_COMMAND.to_string();
        };
        if args.len() < spec.min_args {
            return ERROR.to_string();
        }

        sanitize((spec.handler)(store, args, client))
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
