//! # CairnKV
//!
//! A networked key-value store with:
//! - Scalar (string / integer), list and set namespaces sharing one key space
//! - Best-effort publish/subscribe
//! - Full-state snapshot of the scalar namespace after every scalar write
//! - Line-delimited text protocol over TCP
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (thread per connection)                         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ tokens
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Dispatcher                               │
//! │                (verb → handler table)                        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Store                                  │
//! │   scalars │ lists │ sets │ subscribers   (one RwLock)        │
//! └──────┬──────────────────────────────────────┬───────────────┘
//!        │ every scalar write                   │ PUBLISH
//!        ▼                                      ▼
//!   ┌─────────────┐                     ┌───────────────┐
//!   │ Snapshotter │                     │ ClientHandles │
//!   │ (full file) │                     │ (+message)    │
//!   └─────────────┘                     └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod snapshot;
pub mod store;
pub mod pubsub;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CairnError, Result};
pub use config::Config;
pub use store::{ScalarValue, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of CairnKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
