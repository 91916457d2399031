use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{info, warn};

use super::input::PlayerIntent;
use super::snapshot::{decode_snapshot, WorldSnapshot};

const READ_CHUNK_BYTES: usize = 16 * 1024;
const MAX_PENDING_READ_BYTES: usize = 4 * 1024 * 1024;
const MAX_PENDING_WRITE_BYTES: usize = 64 * 1024;

/// Source of inbound snapshots and sink for outbound intents.
///
/// Polled from the event loop thread; implementations must never block.
pub trait SnapshotFeed {
    fn poll_snapshots(&mut self, out: &mut Vec<WorldSnapshot>);
    fn send_intent(&mut self, intent: PlayerIntent);
}

/// Newline-delimited JSON over a nonblocking TCP stream.
#[derive(Debug)]
pub struct TcpSnapshotFeed {
    mode: FeedMode,
}

#[derive(Debug)]
enum FeedMode {
    Disconnected,
    Connected(Connection),
}

#[derive(Debug)]
struct Connection {
    peer: SocketAddr,
    stream: TcpStream,
    read_buf: Vec<u8>,
    write_buf: Vec<u8>,
}

impl TcpSnapshotFeed {
    /// Connects once. Failure is logged and leaves the feed disconnected,
    /// so the client still runs and shows a neutral world.
    pub fn connect(server_addr: &str, timeout: Duration) -> Self {
        match open_stream(server_addr, timeout) {
            Ok(connection) => {
                info!(peer = %connection.peer, "feed_connected");
                Self {
                    mode: FeedMode::Connected(connection),
                }
            }
            Err(err) => {
                warn!(server_addr, error = %err, "feed_connect_failed");
                Self::disconnected()
            }
        }
    }

    pub fn disconnected() -> Self {
        Self {
            mode: FeedMode::Disconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.mode, FeedMode::Connected(_))
    }

    fn drop_connection(&mut self, reason: &'static str) {
        if let FeedMode::Connected(connection) = &self.mode {
            warn!(peer = %connection.peer, reason, "feed_disconnected");
        }
        self.mode = FeedMode::Disconnected;
    }
}

impl SnapshotFeed for TcpSnapshotFeed {
    fn poll_snapshots(&mut self, out: &mut Vec<WorldSnapshot>) {
        let FeedMode::Connected(connection) = &mut self.mode else {
            return;
        };
        let mut lines = Vec::new();
        let read_result = connection.read_available(&mut lines);
        let flush_result = connection.flush_pending();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            match decode_snapshot(&line) {
                Ok(snapshot) => out.push(snapshot),
                Err(err) => warn!(error = %err, "snapshot_decode_failed"),
            }
        }

        match (read_result, flush_result) {
            (Err(reason), _) | (_, Err(reason)) => self.drop_connection(reason),
            _ => {}
        }
    }

    fn send_intent(&mut self, intent: PlayerIntent) {
        let FeedMode::Connected(connection) = &mut self.mode else {
            return;
        };
        let line = match serde_json::to_string(&intent) {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "intent_encode_failed");
                return;
            }
        };
        if connection.write_buf.len().saturating_add(line.len() + 1) > MAX_PENDING_WRITE_BYTES {
            warn!(?intent, "intent_dropped_write_backlog");
            return;
        }
        connection.write_buf.extend_from_slice(&encode_line_payload(&line));
        if let Err(reason) = connection.flush_pending() {
            self.drop_connection(reason);
        }
    }
}

impl Connection {
    fn read_available(&mut self, out: &mut Vec<String>) -> Result<(), &'static str> {
        let mut chunk = [0u8; READ_CHUNK_BYTES];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => return Err("peer_closed"),
                Ok(bytes_read) => {
                    self.read_buf.extend_from_slice(&chunk[..bytes_read]);
                    drain_complete_lines(&mut self.read_buf, out);
                    if self.read_buf.len() > MAX_PENDING_READ_BYTES {
                        return Err("line_too_long");
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(error = %err, "feed_read_failed");
                    return Err("read_failed");
                }
            }
        }
    }

    fn flush_pending(&mut self) -> Result<(), &'static str> {
        while !self.write_buf.is_empty() {
            match self.stream.write(&self.write_buf) {
                Ok(0) => return Err("write_zero"),
                Ok(written) => {
                    self.write_buf.drain(..written);
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(error = %err, "feed_write_failed");
                    return Err("write_failed");
                }
            }
        }
        Ok(())
    }
}

fn open_stream(server_addr: &str, timeout: Duration) -> io::Result<Connection> {
    let mut last_error = None;
    for addr in server_addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_nonblocking(true)?;
                if let Err(err) = stream.set_nodelay(true) {
                    warn!(error = %err, "feed_nodelay_failed");
                }
                return Ok(Connection {
                    peer: addr,
                    stream,
                    read_buf: Vec::new(),
                    write_buf: Vec::new(),
                });
            }
            Err(err) => last_error = Some(err),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "address resolved to nothing")
    }))
}

fn drain_complete_lines(buffer: &mut Vec<u8>, out: &mut Vec<String>) {
    while let Some(newline_index) = buffer.iter().position(|byte| *byte == b'\n') {
        let mut line_bytes = buffer.drain(..=newline_index).collect::<Vec<u8>>();
        line_bytes.pop(); // newline
        if line_bytes.last().copied() == Some(b'\r') {
            line_bytes.pop();
        }

        match String::from_utf8(line_bytes) {
            Ok(line) => out.push(line),
            Err(err) => warn!(error = %err, "feed_invalid_utf8_line_dropped"),
        }
    }
}

fn encode_line_payload(line: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(line.len() + 1);
    payload.extend_from_slice(line.as_bytes());
    payload.push(b'\n');
    payload
}
