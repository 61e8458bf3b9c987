//! Transport layer for the coordinator serial link

use crate::error::Result;

mod serial;
pub use serial::SerialTransport;

#[cfg(any(test, feature = "mock"))]
mod mock;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;

/// Transport trait for coordinator communication
pub trait Transport {
    /// Read data into buffer, returns number of bytes read
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Write data from buffer, returns number of bytes written
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Flush any pending writes (blocking until complete)
    fn flush(&mut self) -> Result<()>;

    /// Check if data is available to read
    fn available(&mut self) -> Result<usize> {
        Ok(0) // Default implementation
    }

    /// Write a complete buffer and flush it
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < data.len() {
            written += self.write(&data[written..])?;
        }
        self.flush()
    }
}
