pub mod serialport;

use std::time::Duration;

use ::serialport::{DataBits, FlowControl, Parity, StopBits};

use crate::constants::{BAUD_RATE, SERIAL_TIMEOUT_MS};
use crate::error::OvenResult;

/// Link parameters the oven expects. Only the read timeout is meant to vary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkParams {
    pub baud: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,

    /// Bounded wait for a single read; a read that sees nothing within
    /// this window ends the current response burst
    pub read_timeout: Duration,
}

impl Default for LinkParams {
    fn default() -> Self {
        LinkParams {
            baud: BAUD_RATE,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
            read_timeout: Duration::from_millis(SERIAL_TIMEOUT_MS),
        }
    }
}

impl LinkParams {
    pub fn with_read_timeout(read_timeout: Duration) -> Self {
        LinkParams {
            read_timeout,
            ..Default::default()
        }
    }
}

/// User supplied connection settings. Anything left out is resolved
/// when the oven handle is created.
#[derive(Debug, Clone, Default)]
pub struct ComPortParams {
    /// Device path or descriptive name of the port
    pub port: Option<String>,

    /// Per-read wait in milliseconds
    pub read_timeout_ms: Option<u64>,
}

impl ComPortParams {
    pub fn link_params(&self) -> LinkParams {
        match self.read_timeout_ms {
            Some(ms) => LinkParams::with_read_timeout(Duration::from_millis(ms)),
            None => LinkParams::default(),
        }
    }
}

/// Byte level access to the oven. Adapters for different serial drivers
/// implement this; the protocol session only talks to this trait.
pub trait DeviceInterface {
    /// Open the named port with the given link parameters
    fn open(&mut self, port: &str, link: &LinkParams) -> OvenResult<()>;

    /// Send raw bytes to the oven
    fn write(&mut self, bytes: &[u8]) -> OvenResult<()>;

    /// Return whatever arrives within the bounded wait. An empty buffer
    /// means the oven has nothing more to send right now.
    fn read(&mut self) -> OvenResult<Vec<u8>>;

    /// Release the port. Must be safe to call repeatedly and after a
    /// failed open.
    fn close(&mut self);
}
