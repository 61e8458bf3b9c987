//! Mock transport for testing

use super::Transport;
use crate::error::Result;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Mock transport for unit testing
///
/// Reads come from an injected byte queue; writes accumulate and can be
/// inspected. Cloning shares the underlying buffers, so a test can keep a
/// handle while the code under test owns the other.
#[derive(Clone)]
pub struct MockTransport {
    inner: Rc<RefCell<MockTransportInner>>,
}

struct MockTransportInner {
    read_buffer: VecDeque<u8>,
    write_buffer: Vec<u8>,
    /// Per-call cap on read sizes; lets tests force short reads
    max_read_chunk: usize,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        MockTransport {
            inner: Rc::new(RefCell::new(MockTransportInner {
                read_buffer: VecDeque::new(),
                write_buffer: Vec::new(),
                max_read_chunk: usize::MAX,
            })),
        }
    }

    /// Inject data to be read
    pub fn inject_read(&self, data: &[u8]) {
        self.inner.borrow_mut().read_buffer.extend(data);
    }

    /// Cap each read call at `n` bytes to exercise short-read accumulation
    pub fn set_max_read_chunk(&self, n: usize) {
        self.inner.borrow_mut().max_read_chunk = n;
    }

    /// Get all written data
    pub fn get_written(&self) -> Vec<u8> {
        self.inner.borrow().write_buffer.clone()
    }

    /// Clear written data
    pub fn clear_written(&self) {
        self.inner.borrow_mut().write_buffer.clear();
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.borrow_mut();
        let cap = inner.max_read_chunk.min(buffer.len());
        let available = inner.read_buffer.len().min(cap);

        for item in buffer.iter_mut().take(available) {
            *item = inner.read_buffer.pop_front().unwrap();
        }

        Ok(available)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.inner.borrow_mut().write_buffer.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn available(&mut self) -> Result<usize> {
        Ok(self.inner.borrow().read_buffer.len())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}
