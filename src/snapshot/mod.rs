//! Snapshot Module
//!
//! Full-state persistence for the scalar namespace.
//!
//! ## Responsibilities
//! - Serialize the entire scalar namespace on every mutating scalar command
//! - Replace the previous snapshot in full (never append)
//! - Reload the namespace at startup
//!
//! Lists, sets and subscribers are never persisted.
//!
//! ## File Format
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────────┬─────────────────┐
//! │Magic (4) │Version(2)│ CRC (4)  │ Payload Len  │ Payload         │
//! │  "CKVS"  │          │          │     (8)      │ (bincode map)   │
//! └──────────┴──────────┴──────────┴──────────────┴─────────────────┘
//! ```

mod snapshotter;

pub use snapshotter::{Snapshotter, ScalarMap, HEADER_SIZE, MAGIC, VERSION};
