mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

pub(crate) use rmlink::Robot;

#[derive(Parser, Debug)]
#[command(name = "rmlink", version, about = "RoboMaster SDK client")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "RMLINK_LOG",
        default_value = "info",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start runtime: {err}");
            std::process::exit(exit::INTERNAL);
        }
    };
    let result = runtime.block_on(cmd::run(cli.command, format));
    // Readers and pumps may still be parked on sockets.
    runtime.shutdown_background();

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::WatchChannel;
    use rmlink_session::Frequency;

    #[test]
    fn parses_send_with_negative_tokens() {
        let cli = Cli::try_parse_from([
            "rmlink", "send", "--host", "10.0.0.2", "chassis", "move", "x", "-0.5",
        ])
        .expect("send args should parse");

        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.connect.host, "10.0.0.2");
        assert_eq!(args.command, ["chassis", "move", "x", "-0.5"]);
    }

    #[test]
    fn send_requires_a_command() {
        let err = Cli::try_parse_from(["rmlink", "send"]).expect_err("missing command");
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn parses_watch_options() {
        let cli = Cli::try_parse_from([
            "rmlink", "watch", "ir", "--sensor", "3", "--rate", "20", "--latest", "--count", "5",
        ])
        .expect("watch args should parse");

        let Command::Watch(args) = cli.command else {
            panic!("expected watch");
        };
        assert_eq!(args.channel, WatchChannel::Ir);
        assert_eq!(args.sensor, 3);
        assert_eq!(args.rate, Frequency::Hz20);
        assert!(args.latest);
        assert_eq!(args.count, Some(5));
    }

    #[test]
    fn rejects_unsupported_rate_and_sensor() {
        assert!(Cli::try_parse_from(["rmlink", "watch", "position", "--rate", "7"]).is_err());
        assert!(Cli::try_parse_from(["rmlink", "watch", "ir", "--sensor", "5"]).is_err());
    }

    #[test]
    fn parses_drive_with_negative_speed() {
        let cli = Cli::try_parse_from([
            "rmlink",
            "drive",
            "--forwards",
            "-0.3",
            "--clockwise",
            "45",
            "--duration",
            "500ms",
        ])
        .expect("drive args should parse");
        let Command::Drive(args) = cli.command else {
            panic!("expected drive");
        };
        assert_eq!(args.forwards, -0.3);
        assert_eq!(args.clockwise, 45.0);
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from(["rmlink", "info", "--format", "json", "--log-level", "warn"])
            .expect("info args should parse");
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.log_level, LogLevel::Warn);
    }
}
