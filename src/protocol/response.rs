//! Reply definitions
//!
//! Fixed reply strings and reply formatting helpers.

/// Mutation accepted
pub const OK: &str = "OK";

/// Request has too few tokens
pub const ERROR: &str = "ERROR";

/// Verb not recognized
pub const UNKNOWN_COMMAND: &str = "Unknown command";

/// Render a boolean the way clients expect it
pub fn bool_reply(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

/// Make a reply safe to send as a single line
///
/// Line terminators would split one reply into several records, so they are
/// replaced with spaces.
pub fn sanitize(reply: String) -> String {
    if reply.contains(['\n', '\r']) {
        reply.replace(['\n', '\r'], " ")
    } else {
        reply
    }
}
