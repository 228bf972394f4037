//! TCP transport with explicit frame boundaries
//!
//! The protocol itself has no length prefix (payload length is fixed by
//! the type code), but TCP is a byte stream, so this layer prepends a
//! single length byte to every frame. A length outside `1..=MAX_FRAME_LEN`
//! means the stream has desynchronized and the connection is torn down.

use super::{Connector, Transport};
use crate::error::{Error, Result};
use crate::protocol::MAX_FRAME_LEN;
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// Connects to the scoring server over TCP
pub struct TcpConnector {
    addr: String,
    read_timeout: Duration,
}

impl TcpConnector {
    /// Create a connector for the given server address
    pub fn new(addr: impl Into<String>, read_timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            read_timeout,
        }
    }
}

impl Connector for TcpConnector {
    fn connect(&mut self) -> Result<(Box<dyn Transport>, Box<dyn Transport>)> {
        let stream = TcpStream::connect(&self.addr).map_err(Error::Connection)?;
        stream
            .set_read_timeout(Some(self.read_timeout))
            .map_err(Error::Connection)?;
        if let Err(e) = stream.set_nodelay(true) {
            log::warn!("Failed to set TCP_NODELAY: {}", e);
        }
        let writer = stream.try_clone().map_err(Error::Connection)?;
        Ok((
            Box::new(TcpTransport { stream }),
            Box::new(TcpTransport { stream: writer }),
        ))
    }
}

/// One direction of an established TCP channel
pub struct TcpTransport {
    stream: TcpStream,
}

fn is_timeout(kind: ErrorKind) -> bool {
    kind == ErrorKind::WouldBlock || kind == ErrorKind::TimedOut
}

impl Transport for TcpTransport {
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        // Length prefix first; a timeout here just means no frame arrived
        let mut len_buf = [0u8; 1];
        match self.stream.read(&mut len_buf) {
            Ok(0) => return Err(Error::Closed),
            Ok(_) => {}
            Err(e) if is_timeout(e.kind()) => return Ok(0),
            Err(e) => return Err(Error::Read(e)),
        }

        let len = len_buf[0] as usize;
        if len == 0 || len > MAX_FRAME_LEN || len > buf.len() {
            // Stream desync, only recovery is a reconnect
            return Err(Error::Read(std::io::Error::new(
                ErrorKind::InvalidData,
                format!("frame length byte {}", len),
            )));
        }

        // A timeout mid-frame would also desync the stream, so any
        // failure past this point tears the connection down.
        self.stream
            .read_exact(&mut buf[..len])
            .map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => Error::Closed,
                _ => Error::Read(e),
            })?;
        Ok(len)
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        debug_assert!(!frame.is_empty() && frame.len() <= MAX_FRAME_LEN);
        let mut buf = Vec::with_capacity(frame.len() + 1);
        buf.push(frame.len() as u8);
        buf.extend_from_slice(frame);
        self.stream.write_all(&buf).map_err(Error::Write)?;
        Ok(())
    }
}
