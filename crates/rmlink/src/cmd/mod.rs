use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use rmlink_session::{Frequency, LineColour, SessionConfig};
use rmlink_transport::{Endpoint, CONTROL_PORT, DIRECT_CONNECT_IP};

use crate::exit::{session_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;
use crate::Robot;

pub mod discover;
pub mod drive;
pub mod info;
pub mod send;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Wait for a robot to announce itself on the local network.
    Discover(DiscoverArgs),
    /// Connect and print firmware version, mode and chassis state.
    Info(InfoArgs),
    /// Send one raw command and print the reply.
    Send(SendArgs),
    /// Drive at a constant speed for a while, then stop.
    Drive(DriveArgs),
    /// Move the chassis by a relative offset.
    Move(MoveArgs),
    /// Enable a telemetry push and print readings as they arrive.
    Watch(WatchArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Discover(args) => discover::run(args, format).await,
        Command::Info(args) => info::run(args, format).await,
        Command::Send(args) => send::run(args, format).await,
        Command::Drive(args) => drive::run_drive(args, format).await,
        Command::Move(args) => drive::run_move(args, format).await,
        Command::Watch(args) => watch::run(args, format).await,
        Command::Version(args) => version::run(args),
    }
}

/// Where the robot is and how long to wait for it.
#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
    /// Robot address.
    #[arg(long, env = "RMLINK_HOST", default_value = DIRECT_CONNECT_IP)]
    pub host: String,
    /// Control port.
    #[arg(long, env = "RMLINK_PORT", default_value_t = CONTROL_PORT)]
    pub port: u16,
    /// Connect, handshake and per-command timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

impl ConnectArgs {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::for_host(self.host.as_str()).with_port(self.port)
    }

    pub async fn connect(&self) -> CliResult<Robot> {
        let timeout = parse_duration(&self.timeout)?;
        let config = SessionConfig::default().with_timeout(timeout);
        Robot::connect_with_config(self.endpoint(), config)
            .await
            .map_err(|err| session_error("connect failed", err))
    }
}

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// How long to listen (e.g. 10s).
    #[arg(long, default_value = "10s")]
    pub timeout: String,
    /// Local address to listen on.
    #[arg(long, value_name = "ADDR", default_value = "0.0.0.0:40926")]
    pub bind: std::net::SocketAddr,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Command tokens, e.g. `chassis speed ?`.
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

#[derive(Args, Debug)]
pub struct DriveArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Forwards speed in m/s.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub forwards: f64,
    /// Rightwards speed in m/s.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub right: f64,
    /// Clockwise rotation in degrees/s.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub clockwise: f64,
    /// How long to drive before stopping (e.g. 2s, 500ms).
    #[arg(long, default_value = "1s")]
    pub duration: String,
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Distance forwards in metres.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub forwards: f64,
    /// Distance right in metres.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub right: f64,
    /// Rotation clockwise in degrees.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub clockwise: f64,
    /// Travel speed in m/s. Robot default when omitted.
    #[arg(long)]
    pub speed: Option<f64>,
    /// Rotation speed in degrees/s. Robot default when omitted.
    #[arg(long)]
    pub rotation_speed: Option<f64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum WatchChannel {
    Position,
    Attitude,
    Status,
    Arm,
    Ir,
    Line,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Telemetry to watch.
    #[arg(value_enum)]
    pub channel: WatchChannel,
    /// Push rate in Hz (1, 5, 10, 20, 30, 50).
    #[arg(long, default_value = "10")]
    pub rate: Frequency,
    /// IR sensor number when watching `ir`.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub sensor: u8,
    /// Line colour to track when watching `line`.
    #[arg(long, default_value = "red")]
    pub colour: LineColour,
    /// Exit after N readings.
    #[arg(long)]
    pub count: Option<u64>,
    /// Print only the most recent reading, skipping any that arrive faster
    /// than they can be printed.
    #[arg(long)]
    pub latest: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `5s`, `150ms` or bare seconds. Zero is rejected.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
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
        .map_err(|_| CliError::new(USAGE, format!("invalid duration: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2").unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn parse_duration_millis() {
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
    }

    #[test]
    fn parse_duration_invalid() {
        assert_eq!(parse_duration("0s").unwrap_err().code, USAGE);
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn endpoint_uses_host_and_port() {
        let args = ConnectArgs {
            host: "10.0.0.7".to_string(),
            port: 5000,
            timeout: "1s".to_string(),
        };
        let endpoint = args.endpoint();
        assert_eq!(endpoint.host(), "10.0.0.7");
        assert_eq!(endpoint.port(), 5000);
    }
}
