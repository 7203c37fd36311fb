//! Transport Adapter
//!
//! Owns the single TCP connection to the controller.

use std::io::{ErrorKind, Read};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use crate::config::Config;
use crate::error::{ElipError, Result};
use crate::protocol::{decode_frame, read_frame_body, write_message, InboundMessage, OutboundMessage, HEADER_SIZE};

/// Connection primitives driven by the session loop
///
/// Implementations never retry: every failure is reported to the caller,
/// which owns the retry policy. After a failure the implementation must
/// report `is_connected() == false`.
pub trait Transport: Send + 'static {
    /// Establish the connection (blocking)
    fn connect(&mut self) -> Result<()>;

    /// Encode and write one message completely
    fn send(&mut self, message: &OutboundMessage) -> Result<()>;

    /// Poll for one inbound message
    ///
    /// `Ok(None)` means no data is available right now, or the frame was
    /// dropped as not addressed to us.
    fn receive(&mut self) -> Result<Option<InboundMessage>>;

    /// Orderly shutdown; no-op when not connected
    fn close(&mut self);

    fn is_connected(&self) -> bool;
}

/// TCP transport to an E-LIP controller
pub struct TcpTransport {
    /// Controller address, `host:port`
    address: String,

    /// Bound for finishing a frame once its first byte arrived
    frame_read_timeout: Duration,

    /// Live connection. Dropped on failure, never reused.
    stream: Option<TcpStream>,
}

impl TcpTransport {
    /// Create a disconnected transport for the configured controller
    pub fn new(config: &Config) -> Self {
        Self {
            address: config.address(),
            frame_read_timeout: config.frame_read_timeout,
            stream: None,
        }
    }

    /// Controller address for logging
    pub fn peer(&self) -> &str {
        &self.address
    }

    /// Tear the connection down after a failure
    fn reset(&mut self) {
        self.stream = None;
    }

    fn fail(&mut self, reason: String) -> ElipError {
        self.reset();
        ElipError::Transport(reason)
    }

    fn open_stream(&self) -> std::io::Result<TcpStream> {
        let stream = TcpStream::connect(&self.address)?;

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;
        stream.set_nonblocking(true)?;

        Ok(stream)
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        tracing::info!("Connecting to {}", self.address);

        match self.open_stream() {
            Ok(stream) => {
                self.stream = Some(stream);
                tracing::info!("Connected to {}", self.address);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed connecting to {} - {}", self.address, e);
                Err(self.fail(format!("connect to {}: {}", self.address, e)))
            }
        }
    }

    fn send(&mut self, message: &OutboundMessage) -> Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(ElipError::Transport("send while disconnected".to_string()));
        };

        // Writes block until the whole frame is out
        let written = stream
            .set_nonblocking(false)
            .map_err(ElipError::from)
            .and_then(|_| write_message(stream, message))
            .and_then(|_| stream.set_nonblocking(true).map_err(ElipError::from));

        match written {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!("Failed sending message: {} - {}", message, e);
                Err(self.fail(format!("send {}: {}", message, e)))
            }
        }
    }

    fn receive(&mut self) -> Result<Option<InboundMessage>> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(ElipError::Transport("receive while disconnected".to_string()));
        };

        let frame = match poll_frame(stream, self.frame_read_timeout) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!("No data received on socket");
                return Ok(None);
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                tracing::error!("Connection was closed by remote peer {}", self.address);
                return Err(self.fail("connection closed by remote peer".to_string()));
            }
            Err(e) => {
                tracing::error!("Failed receiving data from socket - {}", e);
                return Err(self.fail(format!("receive: {}", e)));
            }
        };

        // The stream may no longer be aligned on a frame boundary
        decode_frame(&frame).map_err(|e| {
            tracing::error!("Dropping connection after undecodable frame - {}", e);
            self.close();
            e
        })
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            tracing::info!("Disconnecting from {}", self.address);
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                tracing::debug!("Shutdown of {} failed: {}", self.address, e);
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

/// Read one frame if any data is waiting
///
/// The first read is non-blocking. Once a byte has arrived, the rest of the
/// header and the declared data length are read in blocking mode, bounded by
/// `timeout`. A zero-length read is reported as `UnexpectedEof`.
fn poll_frame(stream: &mut TcpStream, timeout: Duration) -> std::io::Result<Option<Vec<u8>>> {
    let mut header = [0u8; HEADER_SIZE];

    let received = match stream.read(&mut header) {
        Ok(0) => return Err(ErrorKind::UnexpectedEof.into()),
        Ok(n) => n,
        Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => {
            return Ok(None)
        }
        Err(e) => return Err(e),
    };

    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(timeout))?;

    let completed = stream
        .read_exact(&mut header[received..])
        .and_then(|_| read_frame_body(stream, &header).map_err(into_io_error));

    stream.set_nonblocking(true)?;

    completed.map(Some)
}

fn into_io_error(e: ElipError) -> std::io::Error {
    match e {
        ElipError::Io(io) => io,
        other => std::io::Error::new(ErrorKind::Other, other.to_string()),
    }
}
