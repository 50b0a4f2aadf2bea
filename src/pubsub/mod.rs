//! Pub/Sub Module
//!
//! Subscriber handles and best-effort fan-out.
//!
//! ## Delivery Model
//! - Each connection owns an outbound queue drained by its writer thread
//! - A `ClientHandle` is the sending side of that queue
//! - SUBSCRIBE clones the handle into the registry; it is never removed
//! - PUBLISH enqueues a `+`-prefixed line per handle and ignores failures
//!
//! Once a connection closes its writer drops the receiver, so later sends to
//! its stale handles fail immediately instead of blocking the publisher.

mod handle;

pub use handle::{ClientHandle, Outbound, PUSH_PREFIX};
