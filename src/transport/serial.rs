//! Serial transport implementation

use super::Transport;
use crate::error::Result;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;

/// Serial transport for the UART link to the coordinator
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open a serial port
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyACM0")
    /// * `baud_rate` - Baud rate (e.g., 115200)
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(1))
            .open()?;

        log::info!("Opened serial port: {} at {} baud", path, baud_rate);

        Ok(SerialTransport { port })
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        match self.port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        Ok(self.port.write(data)?)
    }

    fn flush(&mut self) -> Result<()> {
        self.port.flush()?;
        Ok(())
    }

    fn available(&mut self) -> Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }
}
