//! Store Module
//!
//! Owns every in-memory namespace and implements one operation per verb.
//!
//! ## Namespaces
//! Scalars, lists and sets are separate maps: the same key string may name
//! a scalar, a list and a set at once without collision.
//!
//! ## Concurrency Model
//! - One `RwLock` guards all namespaces together
//! - Mutations (set/del/incr/push/pop/sadd/srem/subscribe) take the write guard
//! - Pure reads (get/llen/lindex/smembers/sismember) take the read guard
//! - PUBLISH takes the read guard; delivery is a non-blocking enqueue
//! - Scalar mutations write the snapshot before releasing the write guard,
//!   so every snapshot is a consistent point-in-time image

mod value;

pub use value::ScalarValue;

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::Result;
use crate::pubsub::ClientHandle;
use crate::snapshot::{ScalarMap, Snapshotter};

/// All mutable state, guarded as a unit
#[derive(Default)]
struct Namespaces {
    scalars: ScalarMap,
    lists: HashMap<String, VecDeque<String>>,
    sets: HashMap<String, HashSet<String>>,
    subscribers: HashMap<String, Vec<ClientHandle>>,
}

/// The shared key-value store
///
/// Constructed once and shared between connections through `Arc<Store>`.
pub struct Store {
    state: RwLock<Namespaces>,
    snapshotter: Snapshotter,
}

impl Store {
    /// Open the store described by `config`
    ///
    /// Creates the data directory and loads the scalar snapshot. A missing
    /// or unreadable snapshot, or a data directory that cannot be created,
    /// yields an empty scalar namespace; only invalid settings fail.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;

        if let Err(e) = fs::create_dir_all(&config.data_dir) {
            tracing::warn!(
                "Cannot create data directory {}, snapshots will fail: {}",
                config.data_dir.display(),
                e
            );
        }

        Ok(Self::with_snapshotter(Snapshotter::new(config.snapshot_path())))
    }

    /// Open with a data directory and default settings
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(&config)
    }

    /// Build a store around an explicit snapshotter
    pub fn with_snapshotter(snapshotter: Snapshotter) -> Self {
        let scalars = snapshotter.load_or_empty();

        Self {
            state: RwLock::new(Namespaces {
                scalars,
                ..Namespaces::default()
            }),
            snapshotter,
        }
    }

    // =========================================================================
    // Scalars
    // =========================================================================

    /// Store a scalar, overwriting any previous value, and snapshot
    pub fn set(&self, key: &str, value: ScalarValue) -> ScalarValue {
        let mut state = self.state.write();
        state.scalars.insert(key.to_string(), value.clone());
        self.persist(&state.scalars);
        value
    }

    /// Read a scalar
    pub fn get(&self, key: &str) -> Option<ScalarValue> {
        self.state.read().scalars.get(key).cloned()
    }

    /// Read a string scalar; integers and absent keys yield `""`
    pub fn get_str(&self, key: &str) -> String {
        self.state
            .read()
            .scalars
            .get(key)
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    /// Read an integer scalar; strings and absent keys yield `0`
    pub fn get_num(&self, key: &str) -> i64 {
        match self.state.read().scalars.get(key) {
            Some(ScalarValue::Int(n)) => *n,
            _ => 0,
        }
    }

    /// Remove a scalar and snapshot
    ///
    /// Returns whether the key existed. Deleting an absent key is a no-op
    /// apart from the snapshot write.
    pub fn del(&self, key: &str) -> bool {
        let mut state = self.state.write();
        let existed = state.scalars.remove(key).is_some();
        self.persist(&state.scalars);
        existed
    }

    /// Add 1 to the integer view of `key`
    pub fn incr(&self, key: &str) -> i64 {
        self.incr_by(key, 1)
    }

    /// Subtract 1 from the integer view of `key`
    pub fn decr(&self, key: &str) -> i64 {
        self.incr_by(key, -1)
    }

    /// Subtract `delta` from the integer view of `key`
    pub fn decr_by(&self, key: &str, delta: i64) -> i64 {
        self.incr_by(key, delta.saturating_neg())
    }

    /// Add `delta` to the integer view of `key`
    ///
    /// Absent or non-numeric values count as 0. The result is stored as an
    /// integer scalar; arithmetic saturates at the i64 bounds.
    pub fn incr_by(&self, key: &str, delta: i64) -> i64 {
        let mut state = self.state.write();
        let current = state
            .scalars
            .get(key)
            .and_then(ScalarValue::as_int)
            .unwrap_or(0);
        let next = current.saturating_add(delta);
        state.scalars.insert(key.to_string(), ScalarValue::Int(next));
        self.persist(&state.scalars);
        next
    }

    /// Number of keys in the scalar namespace
    pub fn scalar_count(&self) -> usize {
        self.state.read().scalars.len()
    }

    /// Location of the snapshot file
    pub fn snapshot_path(&self) -> &Path {
        self.snapshotter.path()
    }

    /// Write the snapshot; called with the write guard held
    fn persist(&self, scalars: &ScalarMap) {
        if let Err(e) = self.snapshotter.save(scalars) {
            tracing::warn!(
                "Snapshot to {} failed, in-memory state kept: {}",
                self.snapshotter.path().display(),
                e
            );
        }
    }

    // =========================================================================
    // Lists
    // =========================================================================

    /// Insert at the head; returns the new length
    pub fn lpush(&self, key: &str, value: &str) -> usize {
        let mut state = self.state.write();
        let list = state.lists.entry(key.to_string()).or_default();
        list.push_front(value.to_string());
        list.len()
    }

    /// Append at the tail; returns the new length
    pub fn rpush(&self, key: &str, value: &str) -> usize {
        let mut state = self.state.write();
        let list = state.lists.entry(key.to_string()).or_default();
        list.push_back(value.to_string());
        list.len()
    }

    /// Remove and return the head
    pub fn lpop(&self, key: &str) -> Option<String> {
        self.state
            .write()
            .lists
            .get_mut(key)
            .and_then(VecDeque::pop_front)
    }

    /// Remove and return the tail
    pub fn rpop(&self, key: &str) -> Option<String> {
        self.state
            .write()
            .lists
            .get_mut(key)
            .and_then(VecDeque::pop_back)
    }

    /// List length, 0 if absent
    pub fn llen(&self, key: &str) -> usize {
        self.state.read().lists.get(key).map_or(0, VecDeque::len)
    }

    /// Element at `index`; `None` outside `[0, len)`
    pub fn lindex(&self, key: &str, index: i64) -> Option<String> {
        let index = usize::try_from(index).ok()?;
        self.state
            .read()
            .lists
            .get(key)
            .and_then(|list| list.get(index).cloned())
    }

    // =========================================================================
    // Sets
    // =========================================================================

    /// Insert a member; `true` if it was not already present
    pub fn sadd(&self, key: &str, member: &str) -> bool {
        self.state
            .write()
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string())
    }

    /// Remove a member; `true` if it was present
    pub fn srem(&self, key: &str, member: &str) -> bool {
        self.state
            .write()
            .sets
            .get_mut(key)
            .map_or(false, |set| set.remove(member))
    }

    /// All members, in no particular order
    pub fn smembers(&self, key: &str) -> Vec<String> {
        self.state
            .read()
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Membership test
    pub fn sismember(&self, key: &str, member: &str) -> bool {
        self.state
            .read()
            .sets
            .get(key)
            .map_or(false, |set| set.contains(member))
    }

    // =========================================================================
    // Pub/Sub
    // =========================================================================

    /// Register `client` on `channel`
    ///
    /// Repeated calls append repeated entries; handles are never pruned.
    pub fn subscribe(&self, channel: &str, client: ClientHandle) {
        tracing::debug!("Client {} ({}) subscribed to {}", client.id(), client.peer(), channel);
        self.state
            .write()
            .subscribers
            .entry(channel.to_string())
            .or_default()
            .push(client);
    }

    /// Push `message` to every subscriber of `channel`
    ///
    /// Fire-and-forget: failed deliveries are skipped without affecting the
    /// rest. Returns how many deliveries were queued.
    pub fn publish(&self, channel: &str, message: &str) -> usize {
        let state = self.state.read();
        let Some(subscribers) = state.subscribers.get(channel) else {
            return 0;
        };

        let mut delivered = 0;
        for client in subscribers {
            if client.push(message) {
                delivered += 1;
            } else {
                tracing::trace!("Dropped push to closed client {} on {}", client.id(), channel);
            }
        }
        delivered
    }

    /// Number of registry entries for `channel`, stale ones included
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.state
            .read()
            .subscribers
            .get(channel)
            .map_or(0, Vec::len)
    }
}
