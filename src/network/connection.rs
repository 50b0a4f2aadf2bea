//! Connection Handler
//!
//! Handles individual client connections.
//!
//! Each connection runs two threads: this reader, which dispatches one
//! request at a time, and a writer that drains the outbound queue shared by
//! replies and pushed pub/sub messages.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::Receiver;

use crate::error::{CairnError, Result};
use crate::protocol::{read_request, write_line, Dispatcher, ERROR};
use crate::pubsub::{ClientHandle, Outbound};
use crate::store::Store;

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// Sending side of this connection's outbound queue
    client: ClientHandle,

    /// Writer thread draining the outbound queue
    writer: Option<JoinHandle<()>>,

    /// Reference to the shared store
    store: Arc<Store>,

    /// Shared verb table
    dispatcher: Arc<Dispatcher>,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O, configures timeouts and spawns the writer.
    pub fn new(
        stream: TcpStream,
        store: Arc<Store>,
        dispatcher: Arc<Dispatcher>,
        read_timeout_ms: u64,
        write_timeout_ms: u64,
    ) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        if read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(read_timeout_ms)))?;
        }
        if write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(write_timeout_ms)))?;
        }

        let write_stream = stream.try_clone()?;
        let (client, outbound) = ClientHandle::channel(peer_addr);

        let writer = thread::Builder::new()
            .name(format!("cairnkv-writer-{}", client.id()))
            .spawn({
                let peer = client.peer().to_string();
                move || run_writer(write_stream, outbound, &peer)
            })?;

        Ok(Self {
            reader: BufReader::new(stream),
            client,
            writer: Some(writer),
            store,
            dispatcher,
        })
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads requests in a loop and queues one reply per request.
    /// Returns when the client disconnects or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.client.peer());
        let result = self.serve();
        self.shutdown();
        result
    }

    fn serve(&mut self) -> Result<()> {
        loop {
            let tokens = match read_request(&mut self.reader) {
                Ok(Some(tokens)) => tokens,
                Ok(None) => {
                    tracing::debug!("Client {} disconnected", self.client.peer());
                    return Ok(());
                }
                Err(CairnError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} went away: {}", self.client.peer(), e);
                    return Ok(());
                }
                Err(CairnError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    tracing::debug!("Read timeout for client {}", self.client.peer());
                    return Ok(());
                }
                Err(CairnError::Protocol(ref msg)) => {
                    // The offending line was consumed; keep serving
                    tracing::debug!("Rejected request from {}: {}", self.client.peer(), msg);
                    if !self.client.reply(ERROR.to_string()) {
                        return Ok(());
                    }
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.client.peer(), e);
                    return Err(e);
                }
            };

            tracing::trace!("Received from {}: {:?}", self.client.peer(), tokens);

            let reply = self.dispatcher.dispatch(&self.store, &tokens, &self.client);

            if !self.client.reply(reply) {
                // Writer already gone: the socket failed on a previous write
                tracing::debug!("Writer for {} closed, dropping connection", self.client.peer());
                return Ok(());
            }
        }
    }

    /// Stop the writer after it flushes everything queued so far
    fn shutdown(&mut self) {
        self.client.close();
        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                tracing::warn!("Writer thread for {} panicked", self.client.peer());
            }
        }
    }
}

/// Drain the outbound queue into the socket until told to stop
///
/// Returning drops the receiver, which makes every stale `ClientHandle`
/// in the subscriber registry fail fast.
fn run_writer(stream: TcpStream, outbound: Receiver<Outbound>, peer: &str) {
    let mut writer = BufWriter::new(stream);

    for message in outbound.iter() {
        match message {
            Outbound::Line(line) => {
                if let Err(e) = write_line(&mut writer, &line) {
                    match e {
                        CairnError::Io(ref io) if is_disconnect(io.kind()) => {
                            tracing::debug!("Client {} disconnected during write", peer);
                        }
                        _ => tracing::warn!("Error writing to {}: {}", peer, e),
                    }
                    return;
                }
            }
            Outbound::Close => return,
        }
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
    )
}
