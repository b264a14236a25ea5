use std::{thread, time::Duration};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use smtoven::{Oven, PlotPoint, RunStatus, error::OvenResult};
use tracing::{info, warn};

#[derive(Parser, Debug, Clone)]
pub(crate) struct WatchOptions {
    /// Start the active profile before watching
    #[clap(short, long, default_value_t = false)]
    start: bool,

    /// Delay between polls in milliseconds
    #[clap(short, long, default_value_t = 1000)]
    interval_ms: u64,
}

fn create_progress_bar(total_steps: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(total_steps);

    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "[{spinner:.green} {elapsed_precise}] {bar:40.cyan/blue} {pos}/{len}s ({percent}%) {msg}",
            )
            .expect("Failed to create progress bar")
            .progress_chars("#>-"),
    );
    pb.set_message(msg.to_owned());

    pb
}

fn describe(point: &PlotPoint) -> String {
    format!(
        "{} {:.1}C (target {:.1}C) heater {}% fan {}%",
        point.state, point.average_temp, point.target_temp, point.heater_percent, point.fan_percent
    )
}

pub(crate) fn handle_watch(oven: &mut Oven, opts: WatchOptions) -> OvenResult<()> {
    let profile = oven.get_profile()?;
    let expected = profile.duration().ceil().max(1.0) as u64;

    if opts.start {
        oven.start_reflow()?;
        info!("Started {}", profile.description);
    }

    let pb = create_progress_bar(expected, &profile.description);
    let status = loop {
        thread::sleep(Duration::from_millis(opts.interval_ms));

        // Each poll replaces everything shown so far
        let plot = oven.get_plot_values()?;
        if let Some(point) = plot.last() {
            if u64::from(point.time) > pb.length().unwrap_or(expected) {
                pb.set_length(u64::from(point.time));
            }
            pb.set_position(u64::from(point.time));
            pb.set_message(describe(point));
        }

        let status = oven.run_status()?;
        if status != RunStatus::Running {
            break status;
        }
    };

    match status {
        RunStatus::Complete => pb.finish_with_message("Run complete"),
        _ => {
            pb.abandon_with_message("Run failed");
            warn!("Oven reported a failed run");
        }
    }

    Ok(())
}
