use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod frame;
pub mod run;
pub mod sniff;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bridge MQTT control messages to the serial bus.
    Run(RunArgs),
    /// Encode a single bus message and print it.
    Frame(FrameArgs),
    /// Decode and print frames seen on a serial device.
    Sniff(SniffArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args),
        Command::Frame(args) => frame::run(args, format),
        Command::Sniff(args) => sniff::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Serial device the slaves are attached to.
    #[arg(long, env = "MLIGHT_DEVICE", default_value = "/dev/ttyUSB0")]
    pub device: PathBuf,
    /// Serial line speed.
    #[arg(long, default_value_t = mlight_transport::DEFAULT_BAUD_RATE)]
    pub baud_rate: u32,
    /// Pause between broadcast cycles (e.g. 100ms, 1s).
    #[arg(long, env = "MLIGHT_SEND_INTERVAL", default_value = "100ms")]
    pub send_interval: String,
    /// Pause after each byte written to the bus (0ms disables pacing).
    #[arg(long, default_value = "1ms")]
    pub byte_delay: String,
    /// Level a channel is switched on at when it has no saved level.
    #[arg(long, default_value_t = mlight_bus::DEFAULT_BRIGHTNESS,
          value_parser = clap::value_parser!(u8).range(0..=i64::from(mlight_bus::MAX_BRIGHTNESS)))]
    pub default_brightness: u8,
    /// MQTT broker host.
    #[arg(long, env = "MLIGHT_MQTT_HOST", default_value = "localhost")]
    pub mqtt_host: String,
    /// MQTT broker port.
    #[arg(long, env = "MLIGHT_MQTT_PORT", default_value_t = 1883)]
    pub mqtt_port: u16,
    /// MQTT username.
    #[arg(long, env = "MLIGHT_MQTT_USERNAME")]
    pub mqtt_username: Option<String>,
    /// MQTT password.
    #[arg(long, env = "MLIGHT_MQTT_PASSWORD", hide_env_values = true, requires = "mqtt_username")]
    pub mqtt_password: Option<String>,
    /// MQTT keep-alive interval (e.g. 30s).
    #[arg(long, default_value = "30s")]
    pub keep_alive: String,
    /// Topic prefix control messages are published under.
    #[arg(long, env = "MLIGHT_TOPIC_PREFIX", default_value = "mlight")]
    pub topic_prefix: String,
    /// MQTT client identifier.
    #[arg(long, env = "MLIGHT_CLIENT_ID", default_value = "mlight-bridge")]
    pub client_id: String,
    /// Write a readable dump of the state table to the device instead of frames.
    #[arg(long)]
    pub dump_state: bool,
    /// Interval between state dumps when --dump-state is set.
    #[arg(long, default_value = "5s")]
    pub dump_interval: String,
}

#[derive(Args, Debug)]
pub struct FrameArgs {
    /// Slave address.
    #[arg(long, short = 'a')]
    pub address: u8,
    /// Channel levels, comma-separated (exactly four).
    #[arg(long, short = 'c', value_delimiter = ',', required = true)]
    pub channels: Vec<u8>,
    /// Message nonce.
    #[arg(long, short = 'n', default_value_t = 0)]
    pub nonce: u8,
}

#[derive(Args, Debug)]
pub struct SniffArgs {
    /// Serial device to read from.
    #[arg(env = "MLIGHT_DEVICE", default_value = "/dev/ttyUSB0")]
    pub device: PathBuf,
    /// Serial line speed.
    #[arg(long, default_value_t = mlight_transport::DEFAULT_BAUD_RATE)]
    pub baud_rate: u32,
    /// Exit after printing N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500ms`, `5s` or a bare number of seconds.
pub fn parse_duration(input: &str, allow_zero: bool) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 && !allow_zero {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
