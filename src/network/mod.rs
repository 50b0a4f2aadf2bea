//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread polling a shutdown flag
//! - One reader thread and one writer thread per connection
//! - Requests routed through the `Dispatcher` into the shared `Store`

mod server;
mod connection;

pub use server::Server;
pub use connection::Connection;
