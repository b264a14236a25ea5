//! One open → command → close cycle per call.
//!
//! The port is never held between calls. Opening performs the identity
//! handshake, and the returned [`OpenSession`] guard closes the port when it
//! goes out of scope, whichever way the call ends.

use tracing::{debug, info, trace};

use crate::{
    constants::{COMMAND_TERMINATOR, IDENTITY_COMMAND, IDENTITY_TOKEN},
    error::{OvenError, OvenResult},
    interface::{DeviceInterface, LinkParams},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Open,
    AwaitingResponse,
    Closing,
}

pub struct Session<D: DeviceInterface> {
    device: D,
    port: String,
    link: LinkParams,
    state: SessionState,
}

impl<D: DeviceInterface> Session<D> {
    pub fn new(device: D, port: impl Into<String>, link: LinkParams) -> Self {
        Session {
            device,
            port: port.into(),
            link,
            state: SessionState::Closed,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Open the port, send `command` and return the oven's reply with line
    /// terminators removed. The port is closed again before returning.
    pub fn transaction(&mut self, command: &str) -> OvenResult<String> {
        let mut session = self.open()?;
        session.command_response(command)
    }

    /// Open the port and check that an oven answers on it
    pub fn open(&mut self) -> OvenResult<OpenSession<'_, D>> {
        if self.state != SessionState::Closed {
            return Err(OvenError::protocol(format!(
                "Session on {} is already open",
                self.port
            )));
        }

        // From here on every exit path goes through the guard's close
        let session = OpenSession { session: self };
        session
            .session
            .device
            .open(&session.session.port, &session.session.link)?;
        session.session.set_state(SessionState::Open);

        let identity = session.session.exchange(IDENTITY_COMMAND)?;
        if !identity.starts_with(IDENTITY_TOKEN) {
            return Err(OvenError::Protocol {
                message: "oven failed to respond".to_string(),
                response: (!identity.is_empty()).then_some(identity),
            });
        }

        info!("Connected to {} on {}", identity, session.session.port);
        Ok(session)
    }

    fn set_state(&mut self, state: SessionState) {
        trace!("Session {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Write a command and gather reply fragments until a read comes back empty
    fn exchange(&mut self, command: &str) -> OvenResult<String> {
        match self.state {
            SessionState::Open => {}
            SessionState::AwaitingResponse => {
                return Err(OvenError::protocol(format!(
                    "Cannot send {:?} while another command is awaiting a response",
                    command
                )));
            }
            SessionState::Closed | SessionState::Closing => {
                return Err(OvenError::protocol(format!(
                    "Cannot send {:?}, session is not open",
                    command
                )));
            }
        }

        self.set_state(SessionState::AwaitingResponse);
        debug!("Sending {:?}", command);

        let mut wire = String::with_capacity(command.len() + COMMAND_TERMINATOR.len());
        wire.push_str(command);
        wire.push_str(COMMAND_TERMINATOR);
        self.device.write(wire.as_bytes())?;

        let mut received = Vec::new();
        loop {
            let fragment = self.device.read()?;
            if fragment.is_empty() {
                break;
            }
            received.extend_from_slice(&fragment);
        }

        let response: String = String::from_utf8_lossy(&received)
            .chars()
            .filter(|c| *c != '\n' && *c != '\r')
            .collect();
        debug!("Received {:?}", response);

        self.set_state(SessionState::Open);
        Ok(response)
    }

    fn close(&mut self) {
        self.set_state(SessionState::Closing);
        self.device.close();
        self.set_state(SessionState::Closed);
    }
}

/// An open port. Dropping it closes the port.
pub struct OpenSession<'a, D: DeviceInterface> {
    session: &'a mut Session<D>,
}

impl<D: DeviceInterface> OpenSession<'_, D> {
    pub fn command_response(&mut self, command: &str) -> OvenResult<String> {
        self.session.exchange(command)
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }
}

impl<D: DeviceInterface> Drop for OpenSession<'_, D> {
    fn drop(&mut self) {
        self.session.close();
    }
}
