//! Byte transport seams.
//!
//! The protocol core never touches a device directly: it pulls bytes from a
//! [`ByteSource`] and pushes replies into a [`ByteSink`]. Opening and
//! configuring the underlying device (baud rate, line discipline) is the
//! caller's job.

mod io;

pub use io::IoPort;

use thiserror::Error;

pub trait ByteSource {
    /// Next byte from the transport, `None` once it is exhausted.
    fn read_byte(&mut self) -> Result<Option<u8>, PortError>;
}

pub trait ByteSink {
    /// Write every byte of `bytes` before returning.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), PortError>;
}

#[derive(Debug, Error)]
pub enum PortError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
