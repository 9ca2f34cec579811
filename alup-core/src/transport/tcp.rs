//! TCP byte-stream transport.
//!
//! Wraps a tokio [`TcpStream`] with `TCP_NODELAY` enabled for fast
//! small-frame transmission. Received bytes are drained into a local
//! buffer so [`ByteTransport::bytes_available`] can report the count
//! immediately readable.

use std::io;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use super::{ByteTransport, not_open};

/// A [`ByteTransport`] over a TCP socket.
pub struct TcpTransport {
    addr: String,
    stream: Option<TcpStream>,
    rx: BytesMut,
}

impl TcpTransport {
    /// Create a transport targeting `addr` (`host:port`). The socket is
    /// not opened until [`ByteTransport::open`].
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            stream: None,
            rx: BytesMut::new(),
        }
    }

    /// The address this transport targets.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl ByteTransport for TcpTransport {
    async fn open(&mut self) -> io::Result<()> {
        let stream = TcpStream::connect(&self.addr).await?;
        stream.set_nodelay(true)?;
        debug!(addr = %self.addr, "tcp transport opened");
        self.stream = Some(stream);
        self.rx.clear();
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            // half-close first so queued data is flushed before the FIN
            let _ = stream.shutdown().await;
            debug!(addr = %self.addr, "tcp transport closed");
        }
        self.rx.clear();
    }

    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let stream = self.stream.as_mut().ok_or_else(not_open)?;
        stream.write_all(bytes).await
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        // drain the local buffer before touching the socket
        let buffered = self.rx.len().min(buf.len());
        if buffered > 0 {
            buf[..buffered].copy_from_slice(&self.rx.split_to(buffered));
        }
        if buffered < buf.len() {
            let stream = self.stream.as_mut().ok_or_else(not_open)?;
            stream.read_exact(&mut buf[buffered..]).await?;
        }
        Ok(())
    }

    fn bytes_available(&mut self) -> usize {
        if let Some(stream) = self.stream.as_mut() {
            let mut chunk = [0u8; 512];
            loop {
                match stream.try_read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => self.rx.extend_from_slice(&chunk[..n]),
                    Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => break,
                    Err(_) => break,
                }
            }
        }
        self.rx.len()
    }
}
