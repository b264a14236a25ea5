use tracing::{debug, trace};

use super::{DeviceInterface, LinkParams};
use crate::constants::MAX_RESPONSE_SIZE;

use crate::error::{OvenError, OvenResult};
use std::io::{Read, Write};

/// Oven access through the `serialport` crate
#[derive(Default)]
pub struct SerialPortDevice {
    serial_port: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialPortDevice {
    pub fn new() -> SerialPortDevice {
        SerialPortDevice { serial_port: None }
    }

    fn port(&mut self) -> OvenResult<&mut Box<dyn serialport::SerialPort>> {
        self.serial_port
            .as_mut()
            .ok_or_else(|| OvenError::Io("Serial port is not open".to_string()))
    }
}

impl DeviceInterface for SerialPortDevice {
    fn open(&mut self, port: &str, link: &LinkParams) -> OvenResult<()> {
        if self.serial_port.is_some() {
            return Err(OvenError::Connection(format!(
                "A serial port is already open, cannot open {}",
                port
            )));
        }

        let serial_port = serialport::new(port, link.baud)
            .data_bits(link.data_bits)
            .stop_bits(link.stop_bits)
            .parity(link.parity)
            .flow_control(link.flow_control)
            .timeout(link.read_timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => {
                    OvenError::Connection(format!("Could not locate serial port {}: {}", port, e))
                }
                _ => OvenError::Connection(format!("Could not open serial port {}: {}", port, e)),
            })?;

        debug!("Opened {} at {} baud", port, link.baud);
        self.serial_port = Some(serial_port);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> OvenResult<()> {
        let serial_port = self.port()?;
        serial_port
            .write_all(bytes)
            .and_then(|_| serial_port.flush())
            .map_err(|e| OvenError::Io(format!("Write to oven failed: {:?}", e)))?;
        trace!("Sent bytes {:?}", bytes);
        Ok(())
    }

    fn read(&mut self) -> OvenResult<Vec<u8>> {
        let mut buffer = vec![0; MAX_RESPONSE_SIZE];

        let size = self
            .port()?
            .read(&mut buffer)
            // Timeout just means the oven has stopped talking
            .or_else(|e| {
                if e.kind() == std::io::ErrorKind::TimedOut {
                    Ok(0)
                } else {
                    Err(e)
                }
            })
            .map_err(|e| OvenError::Io(format!("Read from oven failed: {:?}", e)))?;

        buffer.truncate(size);
        trace!("Received bytes {:?}", buffer);
        Ok(buffer)
    }

    fn close(&mut self) {
        if self.serial_port.take().is_some() {
            debug!("Closed serial port");
        }
    }
}
