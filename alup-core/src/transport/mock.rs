//! Scripted in-memory transport for protocol tests.
//!
//! Receive bytes are pre-loaded (or pushed mid-test) through a cloned
//! handle; everything the engine writes is captured for inspection.
//! All clones share the same state, so a test keeps one clone and
//! hands another to the engine.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{ByteTransport, not_open};
use crate::convert;

#[derive(Default)]
struct Inner {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    open: bool,
    fail_open: bool,
}

/// A [`ByteTransport`] backed by in-memory buffers.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<Inner>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next [`ByteTransport::open`] fail.
    pub fn fail_next_open(&self) {
        self.lock().fail_open = true;
    }

    /// Queue raw bytes for the engine to receive.
    pub fn push_rx(&self, bytes: &[u8]) {
        self.lock().rx.extend(bytes);
    }

    /// Queue a null-terminated UTF-8 string.
    pub fn push_rx_string(&self, value: &str) {
        let mut inner = self.lock();
        inner.rx.extend(value.as_bytes());
        inner.rx.push_back(0x00);
    }

    /// Queue a 4-byte big-endian integer.
    pub fn push_rx_int(&self, value: i32) {
        self.lock().rx.extend(convert::int_to_bytes(value));
    }

    /// Everything the engine has written so far.
    pub fn written(&self) -> Vec<u8> {
        self.lock().tx.clone()
    }

    /// Forget captured writes, so the next assertion sees only new
    /// traffic.
    pub fn clear_written(&self) {
        self.lock().tx.clear();
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("mock transport lock poisoned")
    }
}

#[async_trait]
impl ByteTransport for MockTransport {
    async fn open(&mut self) -> io::Result<()> {
        let mut inner = self.lock();
        if inner.fail_open {
            inner.fail_open = false;
            return Err(io::Error::new(io::ErrorKind::NotFound, "scripted open failure"));
        }
        inner.open = true;
        Ok(())
    }

    async fn close(&mut self) {
        self.lock().open = false;
    }

    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut inner = self.lock();
        if !inner.open {
            return Err(not_open());
        }
        inner.tx.extend_from_slice(bytes);
        Ok(())
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        loop {
            {
                let mut inner = self.lock();
                if !inner.open {
                    return Err(not_open());
                }
                if inner.rx.len() >= buf.len() {
                    for slot in buf.iter_mut() {
                        *slot = inner.rx.pop_front().unwrap_or(0);
                    }
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    fn bytes_available(&mut self) -> usize {
        self.lock().rx.len()
    }
}
