#![allow(dead_code)]

use std::collections::VecDeque;

use smtoven::{
    Oven,
    error::{OvenError, OvenResult},
    interface::{DeviceInterface, LinkParams},
};

pub const IDENTITY: &str = "SMT-Oven 1.0.0.0\n\r";

enum Reply {
    Fragments { data: Vec<Vec<u8>>, then_fail: bool },
    WriteError,
}

fn to_bytes(fragments: &[&str]) -> Vec<Vec<u8>> {
    fragments.iter().map(|f| f.as_bytes().to_vec()).collect()
}

/// Device double that plays back a fixed script. Each write consumes the
/// next scripted reply, which is then handed out one fragment per read.
#[derive(Default)]
pub struct ScriptedDevice {
    script: VecDeque<Reply>,
    pending: VecDeque<Vec<u8>>,
    read_error: bool,
    refuse_open: bool,
    open: bool,

    pub written: Vec<String>,
    pub opens: usize,
    pub closes: usize,
}

impl ScriptedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to the next write with these fragments
    pub fn reply(mut self, fragments: &[&str]) -> Self {
        self.script.push_back(Reply::Fragments {
            data: to_bytes(fragments),
            then_fail: false,
        });
        self
    }

    /// A complete transaction: identity handshake followed by `fragments`
    pub fn answer(self, fragments: &[&str]) -> Self {
        self.reply(&[IDENTITY]).reply(fragments)
    }

    /// Hand out `fragments`, then fail the following read
    pub fn read_error_after(mut self, fragments: &[&str]) -> Self {
        self.script.push_back(Reply::Fragments {
            data: to_bytes(fragments),
            then_fail: true,
        });
        self
    }

    pub fn write_error(mut self) -> Self {
        self.script.push_back(Reply::WriteError);
        self
    }

    pub fn refuse_open(mut self) -> Self {
        self.refuse_open = true;
        self
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn into_oven(self) -> Oven<ScriptedDevice> {
        Oven::with_device(self, "scripted", LinkParams::default())
    }
}

impl DeviceInterface for ScriptedDevice {
    fn open(&mut self, port: &str, _link: &LinkParams) -> OvenResult<()> {
        self.opens += 1;
        if self.open {
            return Err(OvenError::Connection(format!("{} already open", port)));
        }
        if self.refuse_open {
            return Err(OvenError::Connection(format!("Could not open {}", port)));
        }
        self.open = true;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> OvenResult<()> {
        if !self.open {
            return Err(OvenError::Io("write to closed port".to_string()));
        }
        self.written.push(String::from_utf8_lossy(bytes).into_owned());
        self.pending.clear();
        self.read_error = false;

        match self.script.pop_front() {
            Some(Reply::Fragments { data, then_fail }) => {
                self.pending = data.into();
                self.read_error = then_fail;
            }
            Some(Reply::WriteError) => return Err(OvenError::Io("scripted write failure".to_string())),
            None => {}
        }
        Ok(())
    }

    fn read(&mut self) -> OvenResult<Vec<u8>> {
        match self.pending.pop_front() {
            Some(fragment) => Ok(fragment),
            None if self.read_error => Err(OvenError::Io("scripted read failure".to_string())),
            None => Ok(Vec::new()),
        }
    }

    fn close(&mut self) {
        self.closes += 1;
        self.open = false;
    }
}
