//! Typed records exchanged with the oven.
//!
//! Temperatures are celsius, times are whole seconds and slopes are
//! celsius per second.

use std::fmt;

use crate::{
    constants::{AMBIENT_TEMPERATURE, NUM_THERMOCOUPLES},
    error::{OvenError, OvenResult},
};

/// Profile flag bits as stored by the oven
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ProfileFlags(u8);

impl ProfileFlags {
    /// Profile may be modified from the remote interface
    pub const UNLOCKED: ProfileFlags = ProfileFlags(1 << 0);

    /// Profile is for lead-free solder
    pub const LEAD_FREE: ProfileFlags = ProfileFlags(1 << 1);

    pub const fn from_bits(bits: u8) -> Self {
        ProfileFlags(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: ProfileFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ProfileFlags {
    type Output = ProfileFlags;

    fn bitor(self, rhs: ProfileFlags) -> ProfileFlags {
        ProfileFlags(self.0 | rhs.0)
    }
}

/// A solder reflow profile
#[derive(Debug, Clone, PartialEq)]
pub struct SolderProfile {
    pub description: String,
    pub flags: ProfileFlags,
    pub liquidus: i32,

    /// Time to reach `soak_temp1` from ambient
    pub preheat_time: u32,
    pub soak_temp1: f32,
    pub soak_temp2: f32,
    pub soak_time: u32,

    /// Slope from `soak_temp2` up to `peak_temp`
    pub ramp_up_slope: f32,
    pub peak_temp: f32,
    pub peak_dwell: u32,

    /// Cooling slope after the peak, always negative
    pub ramp_down_slope: f32,
}

/// One corner of the temperature curve a profile describes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub time_s: f32,
    pub temperature: f32,
}

impl SolderProfile {
    /// Check the profile can be sent to the oven and plotted
    pub fn validate(&self) -> OvenResult<()> {
        if self
            .description
            .contains(|c: char| matches!(c, ',' | ';' | '\n' | '\r'))
        {
            return Err(OvenError::Format(format!(
                "Profile description {:?} contains a field delimiter",
                self.description
            )));
        }
        if self.ramp_up_slope == 0.0 || !self.ramp_up_slope.is_finite() {
            return Err(OvenError::Format(format!(
                "Ramp up slope must be non-zero, got {}",
                self.ramp_up_slope
            )));
        }
        if self.ramp_down_slope >= 0.0 || !self.ramp_down_slope.is_finite() {
            return Err(OvenError::Format(format!(
                "Ramp down slope must be negative, got {}",
                self.ramp_down_slope
            )));
        }
        Ok(())
    }

    /// Control points of the profile: ambient, soak start, soak end,
    /// peak start, peak end and back to ambient
    pub fn curve(&self) -> [CurvePoint; 6] {
        let ambient = AMBIENT_TEMPERATURE;
        let mut time = 0.0;
        let mut point = |advance: f32, temperature: f32| {
            time += advance;
            CurvePoint {
                time_s: time,
                temperature,
            }
        };

        [
            point(0.0, ambient),
            point(self.preheat_time as f32, self.soak_temp1),
            point(self.soak_time as f32, self.soak_temp2),
            point(
                (self.peak_temp - self.soak_temp2) / self.ramp_up_slope,
                self.peak_temp,
            ),
            point(self.peak_dwell as f32, self.peak_temp),
            point(
                (ambient - self.peak_temp) / self.ramp_down_slope,
                ambient,
            ),
        ]
    }

    /// Estimated length of a run in seconds
    pub fn duration(&self) -> f32 {
        self.curve()[5].time_s
    }
}

impl fmt::Display for SolderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Description     : {}", self.description)?;
        writeln!(
            f,
            "Flags           : {:02X}{}{}",
            self.flags.bits(),
            if self.flags.contains(ProfileFlags::UNLOCKED) {
                " unlocked"
            } else {
                " locked"
            },
            if self.flags.contains(ProfileFlags::LEAD_FREE) {
                " lead-free"
            } else {
                ""
            }
        )?;
        writeln!(f, "Liquidus        : {} C", self.liquidus)?;
        writeln!(f, "Preheat time    : {} s", self.preheat_time)?;
        writeln!(f, "Soak            : {:.1} C -> {:.1} C", self.soak_temp1, self.soak_temp2)?;
        writeln!(f, "Soak time       : {} s", self.soak_time)?;
        writeln!(f, "Ramp up slope   : {:.2} C/s", self.ramp_up_slope)?;
        writeln!(f, "Peak            : {:.1} C", self.peak_temp)?;
        writeln!(f, "Peak dwell      : {} s", self.peak_dwell)?;
        write!(f, "Ramp down slope : {:.2} C/s", self.ramp_down_slope)
    }
}

/// A single telemetry sample from a reflow run
#[derive(Debug, Clone, PartialEq)]
pub struct PlotPoint {
    pub state: String,
    pub time: u32,
    pub target_temp: f32,
    pub average_temp: f32,
    pub heater_percent: u8,
    pub fan_percent: u8,
    pub thermocouples: [f32; NUM_THERMOCOUPLES],
}

impl PlotPoint {
    /// Column headings matching the `Display` layout
    pub const TITLE: &'static str =
        "     State Time target average heat fan    TC1    TC2    TC3    TC4";
}

impl fmt::Display for PlotPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>10} {:>4} {:>6.1} {:>7.1} {:>4} {:>3}",
            self.state,
            self.time,
            self.target_temp,
            self.average_temp,
            self.heater_percent,
            self.fan_percent
        )?;
        for t in &self.thermocouples {
            write!(f, " {:>6.1}", t)?;
        }
        Ok(())
    }
}

/// Samples from one poll of the oven. A new poll replaces the whole set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotData {
    pub points: Vec<PlotPoint>,
}

impl PlotData {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&PlotPoint> {
        self.points.last()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidParameters {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl fmt::Display for PidParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[p={:.6}, i={:.6}, d={:.6}]", self.kp, self.ki, self.kd)
    }
}

/// Enable flag and calibration offset of one thermocouple channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThermocoupleSetting {
    pub enabled: bool,
    pub offset: f32,
}

pub type ThermocoupleSettings = [ThermocoupleSetting; NUM_THERMOCOUPLES];

/// Progress of the profile the oven is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Complete,
    Failed,
    Running,
}
