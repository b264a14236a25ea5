use serialport::{SerialPortInfo, SerialPortType};
use tracing::{debug, info};

use crate::{
    constants::OVEN_PORT_PREFIX,
    error::{OvenError, OvenResult},
    interface::ComPortParams,
};

/// A serial port as presented to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescriptor {
    /// Name used to open the port (e.g. "/dev/ttyACM0" or "COM3")
    pub port_name: String,

    /// Human readable name, USB product string when one is reported
    pub description: String,
}

impl From<SerialPortInfo> for PortDescriptor {
    fn from(info: SerialPortInfo) -> Self {
        let description = match &info.port_type {
            SerialPortType::UsbPort(usb) => match &usb.product {
                Some(product) => format!("{} ({})", product, info.port_name),
                None => info.port_name.clone(),
            },
            _ => info.port_name.clone(),
        };

        PortDescriptor {
            port_name: info.port_name,
            description,
        }
    }
}

/// List the serial ports currently attached
pub fn list_ports() -> OvenResult<Vec<PortDescriptor>> {
    let ports = serialport::available_ports().map_err(|e| {
        OvenError::Connection(format!("Could not get available ports. Err {:?}", e))
    })?;

    Ok(ports.into_iter().map(PortDescriptor::from).collect())
}

/// Pick the port most likely to be the oven: the first whose description
/// starts with the oven's USB name, otherwise the first port found
pub fn select_default_port(ports: &[PortDescriptor]) -> Option<&PortDescriptor> {
    ports
        .iter()
        .find(|p| p.description.starts_with(OVEN_PORT_PREFIX))
        .or_else(|| ports.first())
}

/// Turn the configured port (if any) into a name that can be opened.
/// A configured descriptive name is mapped back to its device name.
pub fn resolve_port(params: &ComPortParams, ports: &[PortDescriptor]) -> OvenResult<String> {
    if let Some(requested) = &params.port {
        let port = ports
            .iter()
            .find(|p| &p.description == requested)
            .map(|p| p.port_name.clone())
            .unwrap_or_else(|| requested.clone());
        debug!("Using configured port {}", port);
        return Ok(port);
    }

    match select_default_port(ports) {
        Some(port) => {
            info!("Selected port {}", port.description);
            Ok(port.port_name.clone())
        }
        None => Err(OvenError::Connection(
            "No serial ports found; specify the oven's serial port explicitly".to_string(),
        )),
    }
}
