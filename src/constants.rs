pub(crate) const SERIAL_TIMEOUT_MS: u64 = 50;
pub(crate) const MAX_RESPONSE_SIZE: usize = 1024;

pub(crate) const BAUD_RATE: u32 = 115200;

/// Every command sent to the oven ends with this
pub(crate) const COMMAND_TERMINATOR: &str = "\n\r";

pub(crate) const IDENTITY_COMMAND: &str = "idn?";
pub(crate) const IDENTITY_TOKEN: &str = "SMT-Oven";

/// Descriptive names of oven serial ports start with this
pub(crate) const OVEN_PORT_PREFIX: &str = "T962a";

pub(crate) const ACK_PREFIX: &str = "OK";

/// Assumed oven temperature before and after a run (celsius)
pub(crate) const AMBIENT_TEMPERATURE: f32 = 25.0;

pub const NUM_THERMOCOUPLES: usize = 4;
