use clap::{ArgAction, Parser, Subcommand};
use smtoven::{Oven, error::OvenResult, interface::ComPortParams};

use commands::{PidOptions, SetProfileOptions, ThermOptions};
use monitor::WatchOptions;

mod commands;
mod monitor;

#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Serial port (device path or description shown by `ports`)
    #[clap(short, long, global = true)]
    port: Option<String>,

    /// Per-read timeout in milliseconds
    #[clap(long, global = true)]
    timeout_ms: Option<u64>,

    /// More logging, repeat for trace output
    #[clap(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// List serial ports
    Ports,

    /// Show the oven's identity string
    #[command(name = "identify", alias = "idn")]
    Identify,

    /// Show the active profile
    Profile,

    /// Show the control points of the active profile
    Curve,

    /// Modify a profile and store it in the oven
    SetProfile(SetProfileOptions),

    /// Make a stored profile the active one
    Select {
        /// Profile slot
        index: u32,
    },

    /// Show samples of the current or last run
    Plot,

    /// Start the active profile
    Run,

    /// Abort the running profile
    Abort,

    /// Show whether a run is in progress
    Status,

    /// Show or set PID gains
    Pid(PidOptions),

    /// Show or set thermocouple enables and offsets
    #[command(name = "therm", alias = "thermocouples")]
    Therm(ThermOptions),

    /// Follow a run until it finishes
    Watch(WatchOptions),
}

fn main() -> OvenResult<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let params = ComPortParams {
        port: cli.port,
        read_timeout_ms: cli.timeout_ms,
    };

    let connect = || Oven::new(params.clone());

    match cli.command {
        Command::Ports => commands::handle_ports()?,
        Command::Identify => println!("{}", connect()?.identify()?),
        Command::Profile => println!("{}", connect()?.get_profile()?),
        Command::Curve => commands::handle_curve(&mut connect()?)?,
        Command::SetProfile(opts) => commands::handle_set_profile(&mut connect()?, opts)?,
        Command::Select { index } => connect()?.select_profile(index)?,
        Command::Plot => commands::handle_plot(&mut connect()?)?,
        Command::Run => connect()?.start_reflow()?,
        Command::Abort => connect()?.abort_reflow()?,
        Command::Status => println!("{:?}", connect()?.run_status()?),
        Command::Pid(opts) => commands::handle_pid(&mut connect()?, opts)?,
        Command::Therm(opts) => commands::handle_therm(&mut connect()?, opts)?,
        Command::Watch(opts) => monitor::handle_watch(&mut connect()?, opts)?,
    }

    Ok(())
}
