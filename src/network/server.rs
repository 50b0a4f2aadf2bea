//! TCP Server
//!
//! Accepts connections and hands each one to its own thread.

use std::io::{ErrorKind, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::error::{CairnError, Result};
use crate::protocol::Dispatcher;
use crate::store::Store;

use super::Connection;

/// Pause after a failed accept (e.g. out of file descriptors)
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// TCP server for CairnKV
pub struct Server {
    config: Config,
    store: Arc<Store>,
    dispatcher: Arc<Dispatcher>,
    listener: TcpListener,
    shutdown: AtomicBool,
    active: Arc<AtomicUsize>,
}

impl Server {
    /// Bind the listening socket
    ///
    /// Failing to bind is the one unrecoverable startup error.
    pub fn bind(config: Config, store: Arc<Store>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            CairnError::Network(format!("Failed to bind {}: {}", config.listen_addr, e))
        })?;

        Ok(Self {
            config,
            store,
            dispatcher: Arc::new(Dispatcher::new()),
            listener,
            shutdown: AtomicBool::new(false),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Signal the server to stop accepting connections
    ///
    /// `run` blocks in `accept`, so a throwaway connection to our own
    /// listener wakes it up to see the flag.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);

        match self.wake_addr() {
            Ok(addr) => {
                if let Err(e) = TcpStream::connect(addr) {
                    tracing::warn!("Failed to wake accept loop at {}: {}", addr, e);
                }
            }
            Err(e) => tracing::warn!("Failed to resolve listener address: {}", e),
        }
    }

    /// Loopback form of the bound address, reachable for the wake-up connect
    fn wake_addr(&self) -> Result<SocketAddr> {
        let mut addr = self.local_addr()?;
        if addr.ip().is_unspecified() {
            let loopback = match addr.ip() {
                IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
                IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
            };
            addr.set_ip(loopback);
        }
        Ok(addr)
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Accept connections until shutdown (blocking)
    ///
    /// Open connections keep running after shutdown until their clients
    /// disconnect.
    pub fn run(&self) -> Result<()> {
        tracing::info!("Listening on {}", self.local_addr()?);

        loop {
            let accepted = self.listener.accept();

            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            match accepted {
                Ok((stream, peer)) => self.spawn_connection(stream, peer),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!("Failed to accept connection: {}", e);
                    thread::sleep(ACCEPT_ERROR_BACKOFF);
                }
            }
        }

        tracing::info!("Accept loop stopped");
        Ok(())
    }

    fn spawn_connection(&self, mut stream: TcpStream, peer: SocketAddr) {
        if self.active.fetch_add(1, Ordering::SeqCst) >= self.config.max_connections {
            self.active.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!("Rejecting {}: max connections reached", peer);
            let _ = writeln!(stream, "ERROR max connections reached");
            return;
        }

        let store = Arc::clone(&self.store);
        let dispatcher = Arc::clone(&self.dispatcher);
        let active = Arc::clone(&self.active);
        let read_timeout = self.config.read_timeout_ms;
        let write_timeout = self.config.write_timeout_ms;

        let spawned = thread::Builder::new()
            .name(format!("cairnkv-conn-{}", peer))
            .spawn(move || {
                match Connection::new(stream, store, dispatcher, read_timeout, write_timeout) {
                    Ok(mut conn) => {
                        if let Err(e) = conn.handle() {
                            tracing::warn!("Connection {} closed with error: {}", peer, e);
                        }
                    }
                    Err(e) => tracing::warn!("Failed to set up connection {}: {}", peer, e),
                }
                active.fetch_sub(1, Ordering::SeqCst);
            });

        if let Err(e) = spawned {
            self.active.fetch_sub(1, Ordering::SeqCst);
            tracing::error!("Failed to spawn thread for {}: {}", peer, e);
        }
    }
}
