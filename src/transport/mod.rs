//! Transport layer for channel I/O abstraction
//!
//! The link logic never touches sockets directly: the receive loop owns a
//! [`Connector`] for (re)establishing the channel, and each established
//! channel is a read handle plus an independent write handle so senders
//! never wait behind a blocking read.

use crate::error::Result;

pub mod mock;
mod tcp;

pub use tcp::TcpConnector;

/// One direction of an established channel.
///
/// The channel is record-oriented: one protocol frame per read or write.
pub trait Transport: Send {
    /// Read one frame into `buf`, returning its length.
    ///
    /// `Ok(0)` means the bounded read timeout elapsed with nothing to
    /// read; it is not a disconnect. An orderly remote close returns
    /// [`Error::Closed`](crate::error::Error::Closed), any other failure
    /// [`Error::Read`](crate::error::Error::Read).
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write one frame.
    ///
    /// Must fail fast on a broken channel rather than block; the receive
    /// loop owns reconnection.
    fn write_frame(&mut self, frame: &[u8]) -> Result<()>;
}

/// Channel factory used by the receive loop for connect and reconnect
pub trait Connector: Send {
    /// One connection attempt; returns the read and write handles of the
    /// established channel. Failure is never fatal, the receive loop
    /// retries on a fixed period.
    fn connect(&mut self) -> Result<(Box<dyn Transport>, Box<dyn Transport>)>;
}
