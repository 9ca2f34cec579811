//! Serial-port byte-stream transport.
//!
//! Wraps the `serialport` crate. Reads poll the port's receive count
//! with a short async sleep between polls, so a blocked device never
//! stalls the executor.

use std::io::{self, Read, Write};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{ByteTransport, not_open};

const READ_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A [`ByteTransport`] over a serial line.
pub struct SerialTransport {
    path: String,
    baud: u32,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialTransport {
    /// Create a transport for the port at `path` (`/dev/ttyUSB0`,
    /// `COM3`, …). `baud` must match the rate configured on the device
    /// firmware. The port is not opened until [`ByteTransport::open`].
    pub fn new(path: impl Into<String>, baud: u32) -> Self {
        Self {
            path: path.into(),
            baud,
            port: None,
        }
    }

    /// The port path this transport targets.
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl ByteTransport for SerialTransport {
    async fn open(&mut self) -> io::Result<()> {
        let port = serialport::new(&self.path, self.baud)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(io::Error::other)?;
        debug!(path = %self.path, baud = self.baud, "serial transport opened");
        self.port = Some(port);
        Ok(())
    }

    async fn close(&mut self) {
        if self.port.take().is_some() {
            debug!(path = %self.path, "serial transport closed");
        }
    }

    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let port = self.port.as_mut().ok_or_else(not_open)?;
        port.write_all(bytes)?;
        port.flush()
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let port = self.port.as_mut().ok_or_else(not_open)?;
            let available = port.bytes_to_read().map_err(io::Error::other)? as usize;
            if available == 0 {
                tokio::time::sleep(READ_POLL_INTERVAL).await;
                continue;
            }
            let want = (buf.len() - filled).min(available);
            port.read_exact(&mut buf[filled..filled + want])?;
            filled += want;
        }
        Ok(())
    }

    fn bytes_available(&mut self) -> usize {
        self.port
            .as_mut()
            .and_then(|port| port.bytes_to_read().ok())
            .unwrap_or(0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unopened_port_reports_nothing_available() {
        let mut transport = SerialTransport::new("/dev/null-port", 115_200);
        assert_eq!(transport.bytes_available(), 0);
        assert!(transport.write(&[0]).await.is_err());
    }

    #[tokio::test]
    async fn close_without_open_is_a_noop() {
        let mut transport = SerialTransport::new("/dev/null-port", 115_200);
        transport.close().await;
        assert_eq!(transport.path(), "/dev/null-port");
    }
}
