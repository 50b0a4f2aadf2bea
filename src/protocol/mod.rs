//! Protocol Module
//!
//! Line-delimited text protocol and the verb dispatcher.
//!
//! ## Request Format
//! ```text
//! VERB arg1 arg2 ...\n
//! ```
//! Tokens are separated by whitespace; token 0 is the verb (case-sensitive).
//! `SET`, `SETSTR` and `PUBLISH` rejoin every token after their first
//! argument with single spaces, so values may contain spaces.
//!
//! ## Reply Format
//! Exactly one line per request. Pushed pub/sub messages arrive on the same
//! stream at arbitrary times, prefixed with `+`.
//!
//! ### Fixed Replies
//! - `OK`              - mutation accepted
//! - `ERROR`           - too few tokens for the verb
//! - `Unknown command` - verb not in the table

mod command;
mod response;
mod codec;
mod dispatcher;

pub use command::{CommandSpec, Handler, COMMANDS};
pub use response::{bool_reply, sanitize, ERROR, OK, UNKNOWN_COMMAND};
pub use codec::{read_request, tokenize, write_line, MAX_LINE_SIZE};
pub use dispatcher::Dispatcher;
