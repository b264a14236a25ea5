use clap::Parser;
use smtoven::{
    Oven, PidParameters, PlotPoint, ProfileFlags,
    error::OvenResult,
    ports::{list_ports, select_default_port},
};
use tracing::info;

fn parse_flags(value: &str) -> Result<ProfileFlags, String> {
    u8::from_str_radix(value.trim_start_matches("0x"), 16)
        .map(ProfileFlags::from_bits)
        .map_err(|e| format!("flags must be a hex byte: {}", e))
}

#[derive(Parser, Debug, Clone)]
pub(crate) struct SetProfileOptions {
    /// Profile slot to write
    index: u32,

    /// Starts from the oven's active profile; only the given fields change
    #[clap(long)]
    description: Option<String>,

    /// Flag byte in hex (01 unlocked, 02 lead-free)
    #[clap(long, value_parser = parse_flags)]
    flags: Option<ProfileFlags>,

    #[clap(long)]
    liquidus: Option<i32>,

    #[clap(long)]
    preheat_time: Option<u32>,

    #[clap(long)]
    soak_temp1: Option<f32>,

    #[clap(long)]
    soak_temp2: Option<f32>,

    #[clap(long)]
    soak_time: Option<u32>,

    #[clap(long)]
    ramp_up_slope: Option<f32>,

    #[clap(long)]
    peak_temp: Option<f32>,

    #[clap(long)]
    peak_dwell: Option<u32>,

    #[clap(long, allow_negative_numbers = true)]
    ramp_down_slope: Option<f32>,
}

#[derive(Parser, Debug, Clone)]
pub(crate) struct PidOptions {
    /// New gains
    #[clap(long, num_args = 3, value_names = ["KP", "KI", "KD"], allow_negative_numbers = true)]
    set: Option<Vec<f32>>,
}

#[derive(Parser, Debug, Clone)]
pub(crate) struct ThermOptions {
    /// Channel to modify
    #[clap(short, long, value_parser = clap::value_parser!(u8).range(0..4))]
    channel: Option<u8>,

    #[clap(long, requires = "channel")]
    enable: Option<bool>,

    /// Calibration offset in celsius
    #[clap(long, requires = "channel", allow_negative_numbers = true)]
    offset: Option<f32>,
}

pub(crate) fn handle_ports() -> OvenResult<()> {
    let ports = list_ports()?;
    let default = select_default_port(&ports).map(|p| p.port_name.clone());

    for port in &ports {
        let marker = if Some(&port.port_name) == default.as_ref() {
            "*"
        } else {
            " "
        };
        println!("{} {:<16} {}", marker, port.port_name, port.description);
    }

    Ok(())
}

pub(crate) fn handle_curve(oven: &mut Oven) -> OvenResult<()> {
    let profile = oven.get_profile()?;

    println!("{}", profile.description);
    for point in profile.curve() {
        println!("{:>7.1} s {:>6.1} C", point.time_s, point.temperature);
    }

    Ok(())
}

pub(crate) fn handle_set_profile(oven: &mut Oven, opts: SetProfileOptions) -> OvenResult<()> {
    let mut profile = oven.get_profile()?;

    if let Some(description) = opts.description {
        profile.description = description;
    }
    profile.flags = opts.flags.unwrap_or(profile.flags);
    profile.liquidus = opts.liquidus.unwrap_or(profile.liquidus);
    profile.preheat_time = opts.preheat_time.unwrap_or(profile.preheat_time);
    profile.soak_temp1 = opts.soak_temp1.unwrap_or(profile.soak_temp1);
    profile.soak_temp2 = opts.soak_temp2.unwrap_or(profile.soak_temp2);
    profile.soak_time = opts.soak_time.unwrap_or(profile.soak_time);
    profile.ramp_up_slope = opts.ramp_up_slope.unwrap_or(profile.ramp_up_slope);
    profile.peak_temp = opts.peak_temp.unwrap_or(profile.peak_temp);
    profile.peak_dwell = opts.peak_dwell.unwrap_or(profile.peak_dwell);
    profile.ramp_down_slope = opts.ramp_down_slope.unwrap_or(profile.ramp_down_slope);

    oven.set_profile(opts.index, &profile)?;
    info!("Stored profile {}", opts.index);
    println!("{}", profile);

    Ok(())
}

pub(crate) fn handle_plot(oven: &mut Oven) -> OvenResult<()> {
    let plot = oven.get_plot_values()?;

    println!("{}", PlotPoint::TITLE);
    for point in &plot.points {
        println!("{}", point);
    }

    Ok(())
}

pub(crate) fn handle_pid(oven: &mut Oven, opts: PidOptions) -> OvenResult<()> {
    if let Some(&[kp, ki, kd]) = opts.set.as_deref() {
        oven.set_pid_parameters(&PidParameters { kp, ki, kd })?;
    }

    println!("{}", oven.get_pid_parameters()?);
    Ok(())
}

pub(crate) fn handle_therm(oven: &mut Oven, opts: ThermOptions) -> OvenResult<()> {
    let mut settings = oven.get_thermocouples()?;

    if let Some(channel) = opts.channel {
        let setting = &mut settings[channel as usize];
        setting.enabled = opts.enable.unwrap_or(setting.enabled);
        setting.offset = opts.offset.unwrap_or(setting.offset);
        oven.set_thermocouples(&settings)?;
    }

    for (channel, setting) in settings.iter().enumerate() {
        println!(
            "T{} {:<8} {:>5.1} C",
            channel + 1,
            if setting.enabled { "enabled" } else { "disabled" },
            setting.offset
        );
    }

    Ok(())
}
