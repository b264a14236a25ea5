use error::OvenResult;
use interface::{ComPortParams, DeviceInterface, LinkParams, serialport::SerialPortDevice};
use session::Session;
use tracing::{debug, info};

pub use constants::NUM_THERMOCOUPLES;
pub use records::{
    CurvePoint, PidParameters, PlotData, PlotPoint, ProfileFlags, RunStatus, SolderProfile,
    ThermocoupleSetting, ThermocoupleSettings,
};

pub mod codec;
pub(crate) mod constants;
pub mod error;
pub mod interface;
pub mod ports;
pub mod records;
pub mod session;

/// Handle to a reflow oven. Every call is a complete open, command, close
/// cycle, so nothing is held between calls.
pub struct Oven<D: DeviceInterface = SerialPortDevice> {
    session: Session<D>,
}

impl Oven<SerialPortDevice> {
    /// Connect through the `serialport` driver. If no port is configured
    /// one is picked from the ports currently attached.
    pub fn new(params: ComPortParams) -> OvenResult<Self> {
        let ports = match params.port {
            Some(_) => ports::list_ports().unwrap_or_else(|e| {
                debug!("Port listing failed, using the configured name as is: {}", e);
                Vec::new()
            }),
            None => ports::list_ports()?,
        };
        let port = ports::resolve_port(&params, &ports)?;
        info!("Using oven on {}", port);

        Ok(Self::with_device(
            SerialPortDevice::new(),
            port,
            params.link_params(),
        ))
    }
}

impl<D: DeviceInterface> Oven<D> {
    pub fn with_device(device: D, port: impl Into<String>, link: LinkParams) -> Self {
        Oven {
            session: Session::new(device, port, link),
        }
    }

    pub fn port(&self) -> &str {
        self.session.port()
    }

    pub fn session(&self) -> &Session<D> {
        &self.session
    }

    fn acknowledged(&mut self, command: &str) -> OvenResult<()> {
        let response = self.session.transaction(command)?;
        codec::check_acknowledge(command, &response)
    }

    /// Identity string reported by the oven
    pub fn identify(&mut self) -> OvenResult<String> {
        self.session.transaction(constants::IDENTITY_COMMAND)
    }

    /// Read the active profile
    pub fn get_profile(&mut self) -> OvenResult<SolderProfile> {
        let response = self.session.transaction(codec::PROFILE_QUERY)?;
        codec::parse_profile(&response)
    }

    /// Store `profile` in slot `index`. This is persistent in the oven.
    pub fn set_profile(&mut self, index: u32, profile: &SolderProfile) -> OvenResult<()> {
        profile.validate()?;
        self.acknowledged(&codec::profile_command(index, profile))
    }

    /// Make slot `index` the active profile
    pub fn select_profile(&mut self, index: u32) -> OvenResult<()> {
        self.acknowledged(&codec::select_profile_command(index))
    }

    /// Samples of the current or most recent run
    pub fn get_plot_values(&mut self) -> OvenResult<PlotData> {
        let response = self.session.transaction(codec::PLOT_QUERY)?;
        Ok(codec::parse_plot(&response))
    }

    pub fn start_reflow(&mut self) -> OvenResult<()> {
        self.acknowledged(codec::RUN_COMMAND)
    }

    pub fn abort_reflow(&mut self) -> OvenResult<()> {
        self.acknowledged(codec::ABORT_COMMAND)
    }

    pub fn run_status(&mut self) -> OvenResult<RunStatus> {
        let response = self.session.transaction(codec::RUN_STATUS_QUERY)?;
        codec::parse_run_status(&response)
    }

    pub fn get_pid_parameters(&mut self) -> OvenResult<PidParameters> {
        let response = self.session.transaction(codec::PID_QUERY)?;
        codec::parse_pid(&response)
    }

    /// Persistent in the oven
    pub fn set_pid_parameters(&mut self, pid: &PidParameters) -> OvenResult<()> {
        self.acknowledged(&codec::pid_command(pid))
    }

    pub fn get_thermocouples(&mut self) -> OvenResult<ThermocoupleSettings> {
        let response = self.session.transaction(codec::THERMOCOUPLE_QUERY)?;
        codec::parse_thermocouples(&response)
    }

    /// Persistent in the oven
    pub fn set_thermocouples(&mut self, settings: &ThermocoupleSettings) -> OvenResult<()> {
        self.acknowledged(&codec::thermocouples_command(settings))
    }
}
