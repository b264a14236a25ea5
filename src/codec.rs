//! Conversion between oven response text and typed records.
//!
//! Responses are positional: fields are separated by `,` and records by `;`.
//! Parsing is strict about field counts, with the single exception of plot
//! data where a damaged sample is dropped and the rest of the poll is kept.

use std::{fmt::Display, str::FromStr};

use tracing::warn;

use crate::{
    constants::{ACK_PREFIX, NUM_THERMOCOUPLES},
    error::{OvenError, OvenResult},
    records::{
        PidParameters, PlotData, PlotPoint, ProfileFlags, RunStatus, SolderProfile,
        ThermocoupleSetting, ThermocoupleSettings,
    },
};

pub(crate) const PROFILE_QUERY: &str = "prof?";
pub(crate) const PLOT_QUERY: &str = "plot?";
pub(crate) const PID_QUERY: &str = "pid?";
pub(crate) const THERMOCOUPLE_QUERY: &str = "therm?";
pub(crate) const RUN_COMMAND: &str = "run";
pub(crate) const ABORT_COMMAND: &str = "abort";
pub(crate) const RUN_STATUS_QUERY: &str = "run?";

const PROFILE_FIELDS: usize = 12;
const PLOT_POINT_FIELDS: usize = 10;
const PID_FIELDS: usize = 3;
const THERMOCOUPLE_FIELDS: usize = 2 * NUM_THERMOCOUPLES;

fn parse_field<T>(name: &str, value: &str) -> OvenResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| OvenError::Format(format!("Invalid {} {:?}: {}", name, value, e)))
}

/// Drop the record terminator left on the last field of a response
fn strip_terminator(field: &str) -> &str {
    field.trim_end_matches([';', '\n', '\r'])
}

fn split_fields<'a>(what: &str, response: &'a str, expected: usize) -> OvenResult<Vec<&'a str>> {
    let fields: Vec<&str> = response.split(',').collect();
    if fields.len() != expected {
        return Err(OvenError::protocol_with_response(
            format!(
                "Invalid oven response to {} query, expected {} fields but got {}",
                what,
                expected,
                fields.len()
            ),
            response,
        ));
    }
    Ok(fields)
}

/// Parse the reply to `prof?`
pub fn parse_profile(response: &str) -> OvenResult<SolderProfile> {
    let fields = split_fields("profile", response, PROFILE_FIELDS)?;

    // fields[0] echoes the profile index
    let flags = u8::from_str_radix(fields[2].trim(), 16).map_err(|e| {
        OvenError::Format(format!("Invalid profile flags {:?}: {}", fields[2], e))
    })?;

    Ok(SolderProfile {
        description: fields[1].to_string(),
        flags: ProfileFlags::from_bits(flags),
        liquidus: parse_field("liquidus", fields[3])?,
        preheat_time: parse_field("preheat time", fields[4])?,
        soak_temp1: parse_field("soak start temperature", fields[5])?,
        soak_temp2: parse_field("soak end temperature", fields[6])?,
        soak_time: parse_field("soak time", fields[7])?,
        ramp_up_slope: parse_field("ramp up slope", fields[8])?,
        peak_temp: parse_field("peak temperature", fields[9])?,
        peak_dwell: parse_field("peak dwell", fields[10])?,
        ramp_down_slope: parse_field("ramp down slope", strip_terminator(fields[11]))?,
    })
}

/// Command storing `profile` in the oven's slot `index`
pub fn profile_command(index: u32, profile: &SolderProfile) -> String {
    format!(
        "PROF {},{},{:02X},{},{},{:.1},{:.1},{},{:.6},{:.1},{},{:.6}",
        index,
        profile.description,
        profile.flags.bits(),
        profile.liquidus,
        profile.preheat_time,
        profile.soak_temp1,
        profile.soak_temp2,
        profile.soak_time,
        profile.ramp_up_slope,
        profile.peak_temp,
        profile.peak_dwell,
        profile.ramp_down_slope
    )
}

/// Command making slot `index` the active profile
pub fn select_profile_command(index: u32) -> String {
    format!("PROF {}", index)
}

fn parse_plot_point(point: &str) -> OvenResult<PlotPoint> {
    let values = split_fields("plot point", point, PLOT_POINT_FIELDS)?;

    let mut thermocouples = [0.0; NUM_THERMOCOUPLES];
    for (channel, value) in thermocouples.iter_mut().zip(&values[6..]) {
        *channel = parse_field("thermocouple reading", value)?;
    }

    Ok(PlotPoint {
        state: values[0].trim().to_string(),
        time: parse_field("time", values[1])?,
        target_temp: parse_field("target temperature", values[2])?,
        average_temp: parse_field("average temperature", values[3])?,
        heater_percent: parse_field("heater percentage", values[4])?,
        fan_percent: parse_field("fan percentage", values[5])?,
        thermocouples,
    })
}

/// Parse the reply to `plot?`.
///
/// The first `;` separated entry is the oven's point count and is not a
/// sample. Samples that cannot be parsed are logged and left out.
pub fn parse_plot(response: &str) -> PlotData {
    let mut entries = response.split(';');
    let header = entries.next().unwrap_or_default();

    let points: Vec<PlotPoint> = entries
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(|entry| match parse_plot_point(entry) {
            Ok(point) => Some(point),
            Err(e) => {
                warn!("Skipping plot point {:?}: {}", entry, e);
                None
            }
        })
        .collect();

    match header.trim().parse::<usize>() {
        Ok(reported) if reported != points.len() => warn!(
            "Oven reported {} plot points but {} were usable",
            reported,
            points.len()
        ),
        Ok(_) => {}
        Err(_) => warn!("Plot reply does not start with a point count: {:?}", header),
    }

    PlotData { points }
}

/// Parse the reply to `pid?`
pub fn parse_pid(response: &str) -> OvenResult<PidParameters> {
    let fields = split_fields("PID", response, PID_FIELDS)?;

    Ok(PidParameters {
        kp: parse_field("proportional gain", fields[0])?,
        ki: parse_field("integral gain", fields[1])?,
        kd: parse_field("derivative gain", strip_terminator(fields[2]))?,
    })
}

pub fn pid_command(pid: &PidParameters) -> String {
    format!("PID {:.6},{:.6},{:.6}", pid.kp, pid.ki, pid.kd)
}

/// Parse the reply to `therm?`
pub fn parse_thermocouples(response: &str) -> OvenResult<ThermocoupleSettings> {
    let fields = split_fields(
        "thermocouple",
        strip_terminator(response),
        THERMOCOUPLE_FIELDS,
    )?;

    let mut settings = [ThermocoupleSetting::default(); NUM_THERMOCOUPLES];
    for (setting, pair) in settings.iter_mut().zip(fields.chunks(2)) {
        let enabled: i32 = parse_field("thermocouple enable", pair[0])?;
        setting.enabled = enabled != 0;
        setting.offset = parse_field("thermocouple offset", pair[1])?;
    }
    Ok(settings)
}

pub fn thermocouples_command(settings: &ThermocoupleSettings) -> String {
    let fields: Vec<String> = settings
        .iter()
        .map(|t| format!("{},{:.1}", u8::from(t.enabled), t.offset))
        .collect();
    format!("THERM {};", fields.join(","))
}

/// Check the oven accepted a command
pub fn check_acknowledge(command: &str, response: &str) -> OvenResult<()> {
    if response.starts_with(ACK_PREFIX) {
        Ok(())
    } else {
        Err(OvenError::protocol_with_response(
            format!("Oven rejected {:?}", command),
            response,
        ))
    }
}

/// Parse the reply to `run?`
pub fn parse_run_status(response: &str) -> OvenResult<RunStatus> {
    match response.trim() {
        r if r.starts_with(ACK_PREFIX) => Ok(RunStatus::Complete),
        "Failed" => Ok(RunStatus::Failed),
        "Running" => Ok(RunStatus::Running),
        _ => Err(OvenError::protocol_with_response(
            "Invalid oven response to run status query",
            response,
        )),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const PROFILE_RESPONSE: &str = "idx,4300 63SN/37PB-a,01,183,30,140,183,90,1.4,210,15,-3.0;";

    fn sample_profile() -> SolderProfile {
        SolderProfile {
            description: "4300 63SN/37PB-a".to_string(),
            flags: ProfileFlags::UNLOCKED,
            liquidus: 183,
            preheat_time: 30,
            soak_temp1: 140.0,
            soak_temp2: 183.0,
            soak_time: 90,
            ramp_up_slope: 1.4,
            peak_temp: 210.0,
            peak_dwell: 15,
            ramp_down_slope: -3.0,
        }
    }

    #[test]
    fn profile_fields_by_position() {
        assert_eq!(parse_profile(PROFILE_RESPONSE).unwrap(), sample_profile());
    }

    #[test]
    fn profile_field_count_is_enforced() {
        let err = parse_profile("4,Short,01,183,30;").unwrap_err();
        assert!(matches!(err, OvenError::Protocol { .. }));
        assert_eq!(err.response(), Some("4,Short,01,183,30;"));

        // Trailing separator adds a thirteenth field
        let err = parse_profile(&format!("{},", PROFILE_RESPONSE)).unwrap_err();
        assert!(matches!(err, OvenError::Protocol { .. }));
    }

    #[test]
    fn profile_bad_number() {
        let response = "0,Name,01,hot,30,140,183,90,1.4,210,15,-3.0;";
        assert!(matches!(parse_profile(response), Err(OvenError::Format(_))));

        let response = "0,Name,ZZ,183,30,140,183,90,1.4,210,15,-3.0;";
        assert!(matches!(parse_profile(response), Err(OvenError::Format(_))));
    }

    #[test]
    fn profile_survives_the_wire() {
        let mut profile = sample_profile();
        profile.flags = ProfileFlags::UNLOCKED | ProfileFlags::LEAD_FREE;
        profile.soak_temp1 = 150.5;
        profile.ramp_up_slope = 0.85;

        let command = profile_command(3, &profile);
        assert!(command.starts_with("PROF 3,4300 63SN/37PB-a,03,"));

        // The oven echoes the same layout back, minus the keyword
        let echoed = format!("{};", command.strip_prefix("PROF ").unwrap());
        let parsed = parse_profile(&echoed).unwrap();

        assert_eq!(parsed.description, profile.description);
        assert_eq!(parsed.flags, profile.flags);
        assert_eq!(parsed.liquidus, profile.liquidus);
        assert_eq!(parsed.preheat_time, profile.preheat_time);
        assert_eq!(parsed.soak_time, profile.soak_time);
        assert_eq!(parsed.peak_dwell, profile.peak_dwell);
        for (a, b) in [
            (parsed.soak_temp1, profile.soak_temp1),
            (parsed.soak_temp2, profile.soak_temp2),
            (parsed.ramp_up_slope, profile.ramp_up_slope),
            (parsed.peak_temp, profile.peak_temp),
            (parsed.ramp_down_slope, profile.ramp_down_slope),
        ] {
            assert!((a - b).abs() < 1e-4, "{} != {}", a, b);
        }
    }

    #[test]
    fn select_command() {
        assert_eq!(select_profile_command(7), "PROF 7");
    }

    #[test]
    fn plot_point() {
        let plot = parse_plot("1;RAMP,30,140.0,138.2,80,20,139.0,137.5,138.8,136.9;");

        assert_eq!(
            plot.points,
            vec![PlotPoint {
                state: "RAMP".to_string(),
                time: 30,
                target_temp: 140.0,
                average_temp: 138.2,
                heater_percent: 80,
                fan_percent: 20,
                thermocouples: [139.0, 137.5, 138.8, 136.9],
            }]
        );
    }

    #[test]
    fn damaged_plot_point_is_skipped() {
        let response = "4;\
            preheat,0,27.8,27.5,0,100,0.0,0.0,27.5,0.0;\
            preheat,1,27.8,27.5,0,100,0.0,27.5;\
            preheat,2,28.1,27.6,10,100,0.0,0.0,27.6,0.0;\
            soak,3,140.0,139.2,40,0,0.0,0.0,139.2,0.0;";

        let plot = parse_plot(response);

        assert_eq!(plot.len(), 3);
        let times: Vec<u32> = plot.points.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![0, 2, 3]);
    }

    #[test]
    fn unparsable_plot_value_is_skipped() {
        let response = "2;fail,0,0.0,27.8,100,30,0.0,0.0,27.8,0.0;fail,1,0.0,27.8,1x0,30,0.0,0.0,27.8,0.0;";
        assert_eq!(parse_plot(response).len(), 1);
    }

    #[test]
    fn empty_plot() {
        assert!(parse_plot("0;").is_empty());
        assert!(parse_plot("").is_empty());
    }

    #[test]
    fn pid() {
        let pid = parse_pid("2.500000,0.024000,23.4;").unwrap();
        assert_eq!(
            pid,
            PidParameters {
                kp: 2.5,
                ki: 0.024,
                kd: 23.4
            }
        );

        assert!(matches!(
            parse_pid("2.5,0.024"),
            Err(OvenError::Protocol { .. })
        ));
        assert!(matches!(
            parse_pid("2.5,abc,1"),
            Err(OvenError::Format(_))
        ));
        assert_eq!(
            pid_command(&pid),
            "PID 2.500000,0.024000,23.400000"
        );
    }

    #[test]
    fn thermocouples() {
        let settings = parse_thermocouples("1,0.0,1,-2.5,0,0.0,1,3.0;").unwrap();
        assert_eq!(
            settings,
            [
                ThermocoupleSetting { enabled: true, offset: 0.0 },
                ThermocoupleSetting { enabled: true, offset: -2.5 },
                ThermocoupleSetting { enabled: false, offset: 0.0 },
                ThermocoupleSetting { enabled: true, offset: 3.0 },
            ]
        );
        assert_eq!(
            thermocouples_command(&settings),
            "THERM 1,0.0,1,-2.5,0,0.0,1,3.0;"
        );

        assert!(matches!(
            parse_thermocouples("1,0.0,1,-2.5;"),
            Err(OvenError::Protocol { .. })
        ));
    }

    #[test]
    fn thermocouple_numbers_must_parse() {
        assert!(matches!(
            parse_thermocouples("1,x,1,0,0,0,1,0;"),
            Err(OvenError::Format(_))
        ));
        assert!(matches!(
            parse_thermocouples("y,0,1,0,0,0,1,0;"),
            Err(OvenError::Format(_))
        ));
    }

    #[test]
    fn plot_error_reply_has_no_points() {
        let plot = parse_plot("Failed - unrecognized command");
        assert!(plot.is_empty());
    }

    #[test]
    fn acknowledge() {
        assert!(check_acknowledge("run", "OK").is_ok());

        let err = check_acknowledge("run", "ERR busy").unwrap_err();
        assert!(matches!(err, OvenError::Protocol { .. }));
        assert_eq!(err.response(), Some("ERR busy"));
    }

    #[test]
    fn run_status() {
        assert_eq!(parse_run_status("OK").unwrap(), RunStatus::Complete);
        assert_eq!(parse_run_status("Failed").unwrap(), RunStatus::Failed);
        assert_eq!(parse_run_status("Running").unwrap(), RunStatus::Running);
        assert!(parse_run_status("Failed - Busy").is_err());
    }
}
