//! Tests for the Dispatcher and line codec
//!
//! These tests verify:
//! - Arity checks and unknown verbs
//! - Reply text for every verb family
//! - Multi-word values for SET / PUBLISH
//! - Soft failures on bad numeric arguments
//! - Request line reading

use std::io::Cursor;

use cairnkv::protocol::{
    read_request, tokenize, Dispatcher, COMMANDS, ERROR, MAX_LINE_SIZE, OK, UNKNOWN_COMMAND,
};
use cairnkv::pubsub::{ClientHandle, Outbound};
use cairnkv::{CairnError, Store};
use crossbeam::channel::Receiver;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct Harness {
    _temp: TempDir,
    store: Store,
    dispatcher: Dispatcher,
    client: ClientHandle,
    outbound: Receiver<Outbound>,
}

impl Harness {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let store = Store::open_path(temp.path()).unwrap();
        let (client, outbound) = ClientHandle::channel("test");
        Self {
            _temp: temp,
            store,
            dispatcher: Dispatcher::new(),
            client,
            outbound,
        }
    }

    fn run(&self, line: &str) -> String {
        self.dispatcher
            .dispatch(&self.store, &tokenize(line), &self.client)
    }
}

// =============================================================================
// Table Tests
// =============================================================================

#[test]
fn test_every_verb_is_registered_once() {
    let dispatcher = Dispatcher::new();

    for spec in COMMANDS {
        assert!(dispatcher.command(spec.verb).is_some(), "{} missing", spec.verb);
        assert_eq!(COMMANDS.iter().filter(|s| s.verb == spec.verb).count(), 1);
    }
}

#[test]
fn test_verbs_are_case_sensitive() {
    let h = Harness::new();

    assert_eq!(h.run("set k v"), UNKNOWN_COMMAND);
    assert!(h.dispatcher.command("get").is_none());
}

// =============================================================================
// Arity Tests
// =============================================================================

#[test]
fn test_too_few_tokens() {
    let h = Harness::new();

    assert_eq!(h.run(""), ERROR);
    assert_eq!(h.run("GET"), ERROR);
    assert_eq!(h.run("BOGUS"), ERROR);
    assert_eq!(h.run("SET k"), ERROR);
    assert_eq!(h.run("PUBLISH ch"), ERROR);
    assert_eq!(h.run("LINDEX l"), ERROR);
}

#[test]
fn test_unknown_command() {
    let h = Harness::new();

    assert_eq!(h.run("FLUSHALL now"), UNKNOWN_COMMAND);
}

// =============================================================================
// Scalar Verb Tests
// =============================================================================

#[test]
fn test_set_get_del() {
    let h = Harness::new();

    assert_eq!(h.run("SET k v"), OK);
    assert_eq!(h.run("GET k"), "v");
    assert_eq!(h.run("DEL k"), OK);
    assert_eq!(h.run("GET k"), "");
    assert_eq!(h.run("DEL k"), OK);
}

#[test]
fn test_set_rejoins_value_tokens() {
    let h = Harness::new();

    assert_eq!(h.run("SET k value   with spaces"), OK);
    assert_eq!(h.run("GET k"), "value with spaces");
}

#[test]
fn test_typed_scalars() {
    let h = Harness::new();

    assert_eq!(h.run("SETSTR s text"), OK);
    assert_eq!(h.run("SETNUM n 17"), OK);

    assert_eq!(h.run("GETSTR s"), "text");
    assert_eq!(h.run("GETNUM s"), "0");
    assert_eq!(h.run("GETNUM n"), "17");
    assert_eq!(h.run("GETSTR n"), "");
    assert_eq!(h.run("GET n"), "17");
}

#[test]
fn test_setnum_ignores_non_numeric_value() {
    let h = Harness::new();

    assert_eq!(h.run("SETNUM n 5"), OK);
    assert_eq!(h.run("SETNUM n five"), OK);
    assert_eq!(h.run("GETNUM n"), "5");
}

#[test]
fn test_incr_family() {
    let h = Harness::new();

    assert_eq!(h.run("INCR c"), "1");
    assert_eq!(h.run("INCRBY c 10"), "11");
    assert_eq!(h.run("DECRBY c 4"), "7");
    assert_eq!(h.run("DECR c"), "6");
    assert_eq!(h.run("GETNUM c"), "6");
}

#[test]
fn test_incrby_bad_amount_is_zero() {
    let h = Harness::new();

    h.run("SETNUM c 3");

    assert_eq!(h.run("INCRBY c lots"), "3");
    assert_eq!(h.run("DECRBY c 1.5"), "3");
}

// =============================================================================
// List Verb Tests
// =============================================================================

#[test]
fn test_list_verbs() {
    let h = Harness::new();

    assert_eq!(h.run("LPUSH l a"), "1");
    assert_eq!(h.run("RPUSH l b"), "2");
    assert_eq!(h.run("LLEN l"), "2");
    assert_eq!(h.run("LINDEX l 0"), "a");
    assert_eq!(h.run("LINDEX l 1"), "b");
    assert_eq!(h.run("LPOP l"), "a");
    assert_eq!(h.run("LLEN l"), "1");
    assert_eq!(h.run("RPOP l"), "b");
    assert_eq!(h.run("RPOP l"), "");
}

#[test]
fn test_lindex_soft_failures() {
    let h = Harness::new();

    h.run("RPUSH l first");

    assert_eq!(h.run("LINDEX l 5"), "");
    assert_eq!(h.run("LINDEX l -1"), "");
    assert_eq!(h.run("LINDEX l x"), "first");
    assert_eq!(h.run("LINDEX missing 0"), "");
    assert_eq!(h.run("LLEN missing"), "0");
}

// =============================================================================
// Set Verb Tests
// =============================================================================

#[test]
fn test_set_verbs() {
    let h = Harness::new();

    assert_eq!(h.run("SADD s x"), "true");
    assert_eq!(h.run("SADD s x"), "false");
    assert_eq!(h.run("SISMEMBER s x"), "true");
    assert_eq!(h.run("SREM s x"), "true");
    assert_eq!(h.run("SISMEMBER s x"), "false");
    assert_eq!(h.run("SREM s x"), "false");
}

#[test]
fn test_smembers_space_joined() {
    let h = Harness::new();

    h.run("SADD s a");
    h.run("SADD s b");

    let reply = h.run("SMEMBERS s");
    let mut members: Vec<&str> = reply.split(' ').collect();
    members.sort();

    assert_eq!(members, vec!["a", "b"]);
    assert_eq!(h.run("SMEMBERS missing"), "");
}

// =============================================================================
// Pub/Sub Verb Tests
// =============================================================================

#[test]
fn test_subscribe_then_publish() {
    let h = Harness::new();

    assert_eq!(h.run("SUBSCRIBE news"), OK);
    assert_eq!(h.run("PUBLISH news breaking story"), OK);

    assert_eq!(
        h.outbound.try_recv().unwrap(),
        Outbound::Line("+breaking story".to_string())
    );
}

#[test]
fn test_publish_to_empty_channel() {
    let h = Harness::new();

    assert_eq!(h.run("PUBLISH nobody hello"), OK);
    assert!(h.outbound.try_recv().is_err());
}

// =============================================================================
// Codec Tests
// =============================================================================

#[test]
fn test_tokenize_whitespace() {
    assert_eq!(tokenize("  SET\tk  v \r\n"), vec!["SET", "k", "v"]);
    assert!(tokenize("\r\n").is_empty());
}

#[test]
fn test_read_request_lines() {
    let mut input = Cursor::new(b"GET a\r\nSET b c\nLLEN l".to_vec());

    assert_eq!(read_request(&mut input).unwrap(), Some(vec!["GET".to_string(), "a".to_string()]));
    assert_eq!(
        read_request(&mut input).unwrap(),
        Some(vec!["SET".to_string(), "b".to_string(), "c".to_string()])
    );
    assert_eq!(read_request(&mut input).unwrap(), Some(vec!["LLEN".to_string(), "l".to_string()]));
    assert_eq!(read_request(&mut input).unwrap(), None);
}

#[test]
fn test_read_request_decodes_invalid_utf8_lossily() {
    let mut input = Cursor::new(b"SET k \xff\xfe\nGET k\n".to_vec());

    let tokens = read_request(&mut input).unwrap().unwrap();

    assert_eq!(tokens, vec!["SET", "k", "\u{FFFD}\u{FFFD}"]);
    assert_eq!(read_request(&mut input).unwrap(), Some(vec!["GET".to_string(), "k".to_string()]));
}

#[test]
fn test_read_request_accepts_line_at_limit() {
    let mut bytes = vec![b'a'; MAX_LINE_SIZE];
    bytes.push(b'\n');
    let mut input = Cursor::new(bytes);

    let tokens = read_request(&mut input).unwrap().unwrap();

    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].len(), MAX_LINE_SIZE);
}

#[test]
fn test_read_request_skips_oversized_line() {
    let mut bytes = vec![b'a'; MAX_LINE_SIZE + 1];
    bytes.extend_from_slice(b"bbbb\nGET k\n");
    let mut input = Cursor::new(bytes);

    assert!(matches!(read_request(&mut input), Err(CairnError::Protocol(_))));
    assert_eq!(read_request(&mut input).unwrap(), Some(vec!["GET".to_string(), "k".to_string()]));
    assert_eq!(read_request(&mut input).unwrap(), None);
}

#[test]
fn test_read_request_oversized_line_at_end_of_stream() {
    let mut input = Cursor::new(vec![b'a'; MAX_LINE_SIZE + 10]);

    assert!(matches!(read_request(&mut input), Err(CairnError::Protocol(_))));
    assert_eq!(read_request(&mut input).unwrap(), None);
}
