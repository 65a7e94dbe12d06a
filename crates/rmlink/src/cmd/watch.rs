use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use rmlink_feed::{DroppingFeed, Feed, FeedError};
use rmlink_session::Frequency;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cmd::{WatchArgs, WatchChannel};
use crate::exit::{session_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_reading, OutputFormat};
use crate::Robot;

type Readings<T> = Pin<Box<dyn Stream<Item = Result<T, FeedError>> + Send>>;

pub async fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    if args.rate == Frequency::Off {
        return Err(CliError::new(USAGE, "push rate must be above zero"));
    }
    let robot = args.connect.connect().await?;

    if let Err(err) = enable(&robot, &args, args.rate).await {
        robot.close().await;
        return Err(session_error("enabling push failed", err));
    }

    let telemetry = robot.telemetry();
    let result = match args.channel {
        WatchChannel::Position => consume(telemetry.position(), "position", &args, format).await,
        WatchChannel::Attitude => consume(telemetry.attitude(), "attitude", &args, format).await,
        WatchChannel::Status => consume(telemetry.status(), "status", &args, format).await,
        WatchChannel::Arm => consume(telemetry.arm(), "arm", &args, format).await,
        WatchChannel::Line => consume(telemetry.line(), "line", &args, format).await,
        WatchChannel::Ir => match telemetry.ir_distance(args.sensor) {
            Some(feed) => {
                let name = format!("ir{}", args.sensor);
                consume(feed, &name, &args, format).await
            }
            None => Err(CliError::new(USAGE, format!("no IR sensor {}", args.sensor))),
        },
    };

    if let Err(err) = enable(&robot, &args, Frequency::Off).await {
        debug!(error = %err, "disabling push failed");
    }
    robot.close().await;

    let printed = result?;
    info!(printed, "watch finished");
    Ok(SUCCESS)
}

/// Turn the push for the watched channel on at `rate`, or off for [`Frequency::Off`].
async fn enable(robot: &Robot, args: &WatchArgs, rate: Frequency) -> rmlink_session::Result<()> {
    let on = rate != Frequency::Off;
    match args.channel {
        WatchChannel::Position => robot.set_chassis_position_push_rate(rate).await,
        WatchChannel::Attitude => robot.set_chassis_attitude_push_rate(rate).await,
        WatchChannel::Status => robot.set_chassis_status_push_rate(rate).await,
        WatchChannel::Arm => robot.set_arm_push_rate(rate).await,
        WatchChannel::Ir => {
            if on {
                robot.set_ir_enabled(true).await?;
            }
            robot.set_ir_push_rate(rate).await
        }
        WatchChannel::Line => {
            if on {
                robot.set_line_recognition_colour(args.colour).await?;
            }
            robot.set_line_recognition_enabled(on).await
        }
    }
}

/// Print readings until the feed ends, `--count` is reached or Ctrl-C.
async fn consume<T>(
    feed: Feed<T>,
    name: &str,
    args: &WatchArgs,
    format: OutputFormat,
) -> CliResult<u64>
where
    T: Serialize + Send + 'static,
{
    let mut readings: Readings<T> = if args.latest {
        Box::pin(DroppingFeed::new(feed).into_stream())
    } else {
        Box::pin(feed.into_stream())
    };

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut printed = 0u64;
    loop {
        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
        let next = tokio::select! {
            _ = &mut shutdown => {
                debug!("interrupted");
                break;
            }
            next = readings.next() => next,
        };
        match next {
            Some(Ok(value)) => {
                printed += 1;
                print_reading(name, printed, &value, format);
            }
            Some(Err(err)) => {
                return Err(CliError::new(INTERNAL, format!("{name} feed failed: {err}")));
            }
            None => {
                warn!(channel = name, "feed ended");
                break;
            }
        }
    }
    Ok(printed)
}
