//! Mock transport for testing
//!
//! Record-oriented like the real channel, with a scripted read side and
//! a scripted connect outcome sequence so tests can drive disconnects
//! and reconnection deterministically.

use super::{Connector, Transport};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What the mock's read side does next
pub enum ScriptedRead {
    /// Deliver one complete frame
    Frame(Vec<u8>),
    /// Behave like a read timeout
    Timeout,
    /// Orderly remote close
    Close,
    /// Read error
    Error,
}

#[derive(Default)]
struct MockInner {
    reads: VecDeque<ScriptedRead>,
    written: Vec<Vec<u8>>,
    write_fails: bool,
}

/// Mock transport for unit and integration testing
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockInner>>,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame to be read
    pub fn inject_frame(&self, frame: &[u8]) {
        self.inner
            .lock()
            .reads
            .push_back(ScriptedRead::Frame(frame.to_vec()));
    }

    /// Queue a scripted read outcome
    pub fn push_read(&self, read: ScriptedRead) {
        self.inner.lock().reads.push_back(read);
    }

    /// All frames written so far
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.inner.lock().written.clone()
    }

    /// Make subsequent writes fail
    pub fn set_write_fails(&self, fails: bool) {
        self.inner.lock().write_fails = fails;
    }
}

impl Transport for MockTransport {
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        let next = self.inner.lock().reads.pop_front();
        match next {
            Some(ScriptedRead::Frame(frame)) => {
                let len = frame.len().min(buf.len());
                buf[..len].copy_from_slice(&frame[..len]);
                Ok(len)
            }
            Some(ScriptedRead::Timeout) | None => {
                // Stand in for the bounded blocking read
                std::thread::sleep(Duration::from_millis(1));
                Ok(0)
            }
            Some(ScriptedRead::Close) => Err(Error::Closed),
            Some(ScriptedRead::Error) => Err(Error::Read(std::io::Error::new(
                ErrorKind::ConnectionReset,
                "scripted read error",
            ))),
        }
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.write_fails {
            return Err(Error::Write(std::io::Error::new(
                ErrorKind::BrokenPipe,
                "scripted write error",
            )));
        }
        inner.written.push(frame.to_vec());
        Ok(())
    }
}

/// Connector that fails a scripted number of attempts, then hands out
/// handles to one shared [`MockTransport`]
pub struct MockConnector {
    transport: MockTransport,
    failures_before_success: usize,
    attempts: Arc<AtomicUsize>,
}

impl MockConnector {
    /// Create a connector wrapping `transport` that fails the first
    /// `failures_before_success` attempts
    pub fn new(transport: MockTransport, failures_before_success: usize) -> Self {
        Self {
            transport,
            failures_before_success,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared connect-attempt counter
    pub fn attempts(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attempts)
    }
}

impl Connector for MockConnector {
    fn connect(&mut self) -> Result<(Box<dyn Transport>, Box<dyn Transport>)> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures_before_success {
            return Err(Error::Connection(std::io::Error::new(
                ErrorKind::ConnectionRefused,
                format!("scripted failure on attempt {}", attempt),
            )));
        }
        Ok((
            Box::new(self.transport.clone()),
            Box::new(self.transport.clone()),
        ))
    }
}
