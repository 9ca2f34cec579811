//! Byte-stream transport capability.
//!
//! The protocol engine depends only on the [`ByteTransport`] trait,
//! never on a concrete transport; serial, TCP and in-memory mock
//! implementations are injected at engine construction.

use std::io;

use async_trait::async_trait;

pub mod mock;
pub mod serial;
pub mod tcp;

pub use mock::MockTransport;
pub use serial::SerialTransport;
pub use tcp::TcpTransport;

/// A point-to-point byte stream with explicit open/close lifetime.
///
/// Exactly one engine instance owns a transport for the lifetime of a
/// connection; there is no sharing or pooling.
#[async_trait]
pub trait ByteTransport: Send {
    /// Open the connection. Transport errors propagate verbatim.
    async fn open(&mut self) -> io::Result<()>;

    /// Close the connection, releasing the underlying resource.
    /// Closing an already-closed transport is a no-op.
    async fn close(&mut self);

    /// Write all of `bytes` to the stream.
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read exactly `buf.len()` bytes. May block until enough bytes
    /// arrive.
    async fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Number of bytes immediately readable without blocking.
    fn bytes_available(&mut self) -> usize;
}

pub(crate) fn not_open() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "transport is not open")
}
