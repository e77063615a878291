//! Connection Manager
//!
//! Owns the TCP socket and buffered reader for a single client.
//!
//! The connection is lazily opened on the first command, authenticates
//! when a password is configured, and is torn down to `Disconnected` on
//! any socket or protocol failure. There is no retry loop at this layer:
//! a failed send surfaces to the caller, and the very next call performs
//! exactly one fresh connect attempt.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::config::Config;
use crate::error::{CinnabarError, Result};
use crate::protocol::{self, Reply};

/// Inbound buffer size for reply decoding
const READ_BUFFER_SIZE: usize = 16 * 1024;

/// Live socket handles, present only while connected
struct Live {
    /// Write half of the stream
    writer: TcpStream,

    /// Buffered read half of the stream
    reader: BufReader<TcpStream>,
}

/// Connection state: the socket exists only in the `Connected` variant,
/// so sending on a torn-down connection is unrepresentable
enum ConnectionState {
    Disconnected,
    Connected(Live),
}

/// Manages the single TCP connection to the server
///
/// Not safe for concurrent use; callers needing concurrency must
/// serialize access externally.
pub struct Connection {
    config: Config,
    state: ConnectionState,
}

impl Connection {
    /// Create a new connection in the `Disconnected` state
    ///
    /// No I/O happens until the first command is sent.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: ConnectionState::Disconnected,
        }
    }

    /// The endpoint configuration this connection was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the connection currently holds a live socket
    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Send a command frame, connecting first if necessary
    ///
    /// On a socket-level failure the connection is torn down to
    /// `Disconnected` and the failure is surfaced; the caller decides
    /// whether to issue another call.
    pub fn send(&mut self, frame: &[u8]) -> Result<()> {
        let live = self.ensure_connected()?;

        tracing::trace!("sending {} byte frame", frame.len());
        if let Err(e) = live.writer.write_all(frame) {
            self.reset();
            return Err(CinnabarError::Connection(format!("send failed: {}", e)));
        }
        Ok(())
    }

    /// Block reading one complete reply from the connection
    ///
    /// An I/O failure or protocol violation leaves the stream position
    /// unreliable, so the connection is torn down before the error
    /// surfaces. A server error reply leaves the connection usable.
    pub fn read_reply(&mut self) -> Result<Reply> {
        let live = match &mut self.state {
            ConnectionState::Connected(live) => live,
            ConnectionState::Disconnected => {
                return Err(CinnabarError::Connection(
                    "no reply pending on a disconnected connection".to_string(),
                ));
            }
        };

        match protocol::read_reply(&mut live.reader) {
            Ok(reply) => {
                tracing::trace!("received {} reply", reply.kind_name());
                Ok(reply)
            }
            Err(e) => {
                if matches!(e, CinnabarError::Io(_) | CinnabarError::Protocol(_)) {
                    self.reset();
                }
                Err(e)
            }
        }
    }

    /// Read one raw reply line verbatim, prefix byte included
    ///
    /// Used by the soft persistence/admin calls, which return whatever
    /// line the server produced instead of decoding it. End-of-stream
    /// mid-line yields the bytes read so far and tears the connection
    /// down, since the server side has gone away.
    pub fn read_raw_line(&mut self) -> Result<String> {
        let live = match &mut self.state {
            ConnectionState::Connected(live) => live,
            ConnectionState::Disconnected => {
                return Err(CinnabarError::Connection(
                    "no reply pending on a disconnected connection".to_string(),
                ));
            }
        };

        let mut buf = Vec::new();
        if let Err(e) = live.reader.read_until(b'\n', &mut buf) {
            tracing::debug!("raw reply line ended early: {}", e);
            self.reset();
        } else if buf.last() != Some(&b'\n') {
            self.reset();
        } else {
            buf.pop();
        }
        buf.retain(|&b| b != b'\r');

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Close the connection, best-effort sending a QUIT first
    ///
    /// Idempotent: closing an already-disconnected connection is a no-op.
    pub fn close(&mut self) {
        if let ConnectionState::Connected(live) = &mut self.state {
            let frame = protocol::encode_inline("QUIT", &[]);
            if let Err(e) = live.writer.write_all(&frame) {
                tracing::debug!("QUIT on close failed: {}", e);
            }
            tracing::debug!("connection to {} closed", self.config.addr());
            self.state = ConnectionState::Disconnected;
        }
    }

    /// Open the socket and run the AUTH handshake if configured
    fn ensure_connected(&mut self) -> Result<&mut Live> {
        if let ConnectionState::Disconnected = self.state {
            let live = self.open()?;
            self.state = ConnectionState::Connected(live);
        }
        match &mut self.state {
            ConnectionState::Connected(live) => Ok(live),
            ConnectionState::Disconnected => Err(CinnabarError::Connection(
                "connection unavailable".to_string(),
            )),
        }
    }

    fn open(&self) -> Result<Live> {
        let addr = self.config.addr();
        let stream = TcpStream::connect(&addr).map_err(|e| {
            CinnabarError::Connection(format!("connect to {} failed: {}", addr, e))
        })?;

        if self.config.send_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(self.config.send_timeout_ms)))?;
        }

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let mut live = Live {
            writer: stream,
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, read_stream),
        };

        if let Some(password) = &self.config.password {
            self.authenticate(&mut live, password)?;
        }

        tracing::debug!("connected to {}", addr);
        Ok(live)
    }

    /// Run the AUTH exchange; anything but a status reply is a failure
    fn authenticate(&self, live: &mut Live, password: &str) -> Result<()> {
        let frame = protocol::encode_inline("AUTH", &[password]);
        live.writer
            .write_all(&frame)
            .map_err(|e| CinnabarError::Connection(format!("authentication send failed: {}", e)))?;

        match protocol::read_reply(&mut live.reader) {
            Ok(Reply::Status(_)) => Ok(()),
            Ok(Reply::Error(e)) => Err(CinnabarError::Connection(format!(
                "authentication rejected: {}",
                e
            ))),
            Ok(other) => Err(CinnabarError::Connection(format!(
                "unexpected {} reply to AUTH",
                other.kind_name()
            ))),
            Err(e) => Err(CinnabarError::Connection(format!(
                "authentication failed: {}",
                e
            ))),
        }
    }

    /// Drop the socket without the QUIT courtesy, after a failure
    fn reset(&mut self) {
        if self.is_connected() {
            tracing::debug!("connection to {} reset", self.config.addr());
            self.state = ConnectionState::Disconnected;
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}
