//! Command definitions
//!
//! The verb table. Each entry names its verb, the minimum number of
//! arguments after the verb, and the handler that runs it against the store.

use crate::pubsub::ClientHandle;
use crate::store::{ScalarValue, Store};

use super::response::{bool_reply, OK};

/// Runs one verb; `args` excludes the verb and has at least `min_args` items
pub type Handler = fn(&Store, &[String], &ClientHandle) -> String;

/// One row of the verb table
#[derive(Clone, Copy)]
pub struct CommandSpec {
    /// Verb, matched case-sensitively
    pub verb: &'static str,

    /// Minimum number of arguments after the verb
    pub min_args: usize,

    /// Handler invoked once arity is satisfied
    pub handler: Handler,
}

impl CommandSpec {
    pub const fn new(verb: &'static str, min_args: usize, handler: Handler) -> Self {
        Self {
            verb,
            min_args,
            handler,
        }
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("verb", &self.verb)
            .field("min_args", &self.min_args)
            .finish()
    }
}

/// Every supported verb
pub static COMMANDS: &[CommandSpec] = &[
    // Scalars
    CommandSpec::new("SET", 2, set),
    CommandSpec::new("GET", 1, get),
    CommandSpec::new("DEL", 1, del),
    CommandSpec::new("SETSTR", 2, set),
    CommandSpec::new("GETSTR", 1, get_str),
    CommandSpec::new("SETNUM", 2, set_num),
    CommandSpec::new("GETNUM", 1, get_num),
    CommandSpec::new("INCR", 1, incr),
    CommandSpec::new("DECR", 1, decr),
    CommandSpec::new("INCRBY", 2, incr_by),
    CommandSpec::new("DECRBY", 2, decr_by),
    // Lists
    CommandSpec::new("LPUSH", 2, lpush),
    CommandSpec::new("RPUSH", 2, rpush),
    CommandSpec::new("LPOP", 1, lpop),
    CommandSpec::new("RPOP", 1, rpop),
    CommandSpec::new("LLEN", 1, llen),
    CommandSpec::new("LINDEX", 2, lindex),
    // Sets
    CommandSpec::new("SADD", 2, sadd),
    CommandSpec::new("SREM", 2, srem),
    CommandSpec::new("SMEMBERS", 1, smembers),
    CommandSpec::new("SISMEMBER", 2, sismember),
    // Pub/Sub
    CommandSpec::new("SUBSCRIBE", 1, subscribe),
    CommandSpec::new("PUBLISH", 2, publish),
];

/// Everything after the first argument, rejoined with single spaces
fn rest(args: &[String]) -> String {
    args[1..].join(" ")
}

/// Lenient integer argument: anything unparsable counts as 0
fn int_arg(arg: &str) -> i64 {
    arg.parse().unwrap_or(0)
}

// =============================================================================
// Scalar handlers
// =============================================================================

fn set(store: &Store, args: &[String], _: &ClientHandle) -> String {
    store.set(&args[0], ScalarValue::Str(rest(args)));
    OK.to_string()
}

fn get(store: &Store, args: &[String], _: &ClientHandle) -> String {
    store
        .get(&args[0])
        .map(|v| v.to_string())
        .unwrap_or_default()
}

fn del(store: &Store, args: &[String], _: &ClientHandle) -> String {
    store.del(&args[0]);
    OK.to_string()
}

fn get_str(store: &Store, args: &[String], _: &ClientHandle) -> String {
    store.get_str(&args[0])
}

fn set_num(store: &Store, args: &[String], _: &ClientHandle) -> String {
    // Non-numeric values leave the key untouched
    if let Ok(n) = args[1].parse::<i64>() {
        store.set(&args[0], ScalarValue::Int(n));
    }
    OK.to_string()
}

fn get_num(store: &Store, args: &[String], _: &ClientHandle) -> String {
    store.get_num(&args[0]).to_string()
}

fn incr(store: &Store, args: &[String], _: &ClientHandle) -> String {
    store.incr(&args[0]).to_string()
}

fn decr(store: &Store, args: &[String], _: &ClientHandle) -> String {
    store.decr(&args[0]).to_string()
}

fn incr_by(store: &Store, args: &[String], _: &ClientHandle) -> String {
    store.incr_by(&args[0], int_arg(&args[1])).to_string()
}

fn decr_by(store: &Store, args: &[String], _: &ClientHandle) -> String {
    store.decr_by(&args[0], int_arg(&args[1])).to_string()
}

// =============================================================================
// List handlers
// =============================================================================

fn lpush(store: &Store, args: &[String], _: &ClientHandle) -> String {
    store.lpush(&args[0], &args[1]).to_string()
}

fn rpush(store: &Store, args: &[String], _: &ClientHandle) -> String {
    store.rpush(&args[0], &args[1]).to_string()
}

fn lpop(store: &Store, args: &[String], _: &ClientHandle) -> String {
    store.lpop(&args[0]).unwrap_or_default()
}

fn rpop(store: &Store, args: &[String], _: &ClientHandle) -> String {
    store.rpop(&args[0]).unwrap_or_default()
}

fn llen(store: &Store, args: &[String], _: &ClientHandle) -> String {
    store.llen(&args[0]).to_string()
}

fn lindex(store: &Store, args: &[String], _: &ClientHandle) -> String {
    store
        .lindex(&args[0], int_arg(&args[1]))
        .unwrap_or_default()
}

// =============================================================================
// Set handlers
// =============================================================================

fn sadd(store: &Store, args: &[String], _: &ClientHandle) -> String {
    bool_reply(store.sadd(&args[0], &args[1]))
}

fn srem(store: &Store, args: &[String], _: &ClientHandle) -> String {
    bool_reply(store.srem(&args[0], &args[1]))
}

fn smembers(store: &Store, args: &[String], _: &ClientHandle) -> String {
    store.smembers(&args[0]).join(" ")
}

fn sismember(store: &Store, args: &[String], _: &ClientHandle) -> String {
    bool_reply(store.sismember(&args[0], &args[1]))
}

// =============================================================================
// Pub/Sub handlers
// =============================================================================

fn subscribe(store: &Store, args: &[String], client: &ClientHandle) -> String {
    store.subscribe(&args[0], client.clone());
    OK.to_string()
}

fn publish(store: &Store, args: &[String], _: &ClientHandle) -> String {
    let delivered = store.publish(&args[0], &rest(args));
    tracing::trace!("Published to {} ({} deliveries)", args[0], delivered);
    OK.to_string()
}
