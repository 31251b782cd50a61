use colored::{ColoredString, Colorize};
use env_logger::{Builder, Env};
use log::Level;
use std::io::Write;
use std::time::{Duration, SystemTimeError};

pub struct FormatElapsedTimeOptions {
    pub sec_yellow_threshold: u64,
    pub sec_red_threshold: u64,
    pub millis_yellow_threshold: u128,
    pub millis_red_threshold: u128,
}

impl Default for FormatElapsedTimeOptions {
    fn default() -> Self {
        Self {
            sec_yellow_threshold: 1,
            sec_red_threshold: 2,
            millis_yellow_threshold: 100,
            millis_red_threshold: 500,
        }
    }
}

/// Installs the global logger. `RUST_LOG` overrides the `info` default;
/// `quiet` drops everything below errors.
pub fn init_logging(quiet: bool) {
    let default_filter = if quiet { "error" } else { "info" };
    let logging_env = Env::default().filter_or("RUST_LOG", default_filter);

    Builder::from_env(logging_env)
        .format(|buf, record| {
            let target = record.target().to_ascii_lowercase();
            let target = match record.level() {
                Level::Error => target.bold().red(),
                Level::Warn => target.bold().yellow(),
                _ => target.bold().bright_yellow(),
            };

            writeln!(
                buf,
                "{} {} {}",
                chrono::Local::now().format("%H:%M:%S").to_string().dimmed(),
                target,
                record.args()
            )
        })
        .init();
}

pub fn format_elapsed_time(
    elapsed: Result<Duration, SystemTimeError>,
    options: &FormatElapsedTimeOptions,
) -> Result<ColoredString, SystemTimeError> {
    let elapsed = elapsed?;

    let result = match elapsed.as_secs() {
        secs if secs > options.sec_red_threshold => format!("{}s", secs).red(),
        secs if secs > options.sec_yellow_threshold => format!("{}s", secs).yellow(),
        secs if secs > 0 => format!("{}s", secs).normal(),
        _ => match elapsed.as_millis() {
            millis if millis > options.millis_red_threshold => format!("{}ms", millis).red(),
            millis if millis > options.millis_yellow_threshold => format!("{}ms", millis).yellow(),
            millis if millis > 0 => format!("{}ms", millis).normal(),
            _ => format!("{}μs", elapsed.as_micros()).normal(),
        },
    };

    Ok(result)
}
