//! Client handles
//!
//! The store-facing side of a connection's outbound queue.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::channel::{self, Receiver, Sender};

/// Marker distinguishing pushed messages from command replies
pub const PUSH_PREFIX: char = '+';

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// A line queued for a connection's writer thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Write this text followed by a newline
    Line(String),

    /// Stop the writer; the connection is going away
    Close,
}

/// Handle to one connection's outbound queue
///
/// Cheap to clone; every clone feeds the same writer.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: u64,
    peer: String,
    tx: Sender<Outbound>,
}

impl ClientHandle {
    /// Create a handle plus the receiver its writer should drain
    pub fn channel(peer: impl Into<String>) -> (Self, Receiver<Outbound>) {
        let (tx, rx) = channel::unbounded();
        let handle = Self {
            id: NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed),
            peer: peer.into(),
            tx,
        };
        (handle, rx)
    }

    /// Process-unique connection id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Peer address, for logging
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Queue a command reply
    pub fn reply(&self, line: String) -> bool {
        self.tx.send(Outbound::Line(line)).is_ok()
    }

    /// Queue a pushed pub/sub message
    ///
    /// Returns `false` if the connection is gone. Never blocks.
    pub fn push(&self, message: &str) -> bool {
        let mut line = String::with_capacity(message.len() + 1);
        line.push(PUSH_PREFIX);
        line.push_str(message);
        self.tx.send(Outbound::Line(line)).is_ok()
    }

    /// Ask the writer to shut down
    pub fn close(&self) {
        let _ = self.tx.send(Outbound::Close);
    }
}
