use serde::Serialize;
use tracing::{info, warn};

use crate::cmd::{parse_duration, DriveArgs, MoveArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_fields, print_json, schema_id, OutputFormat};

#[derive(Serialize)]
struct DriveOutput {
    schema_id: String,
    forwards: f64,
    right: f64,
    clockwise: f64,
    duration_ms: u128,
    interrupted: bool,
}

pub async fn run_drive(args: DriveArgs, format: OutputFormat) -> CliResult<i32> {
    let duration = parse_duration(&args.duration)?;
    let robot = args.connect.connect().await?;

    if let Err(err) = robot.set_speed(args.forwards, args.right, args.clockwise).await {
        robot.close().await;
        return Err(session_error("set speed failed", err));
    }
    info!(
        forwards = args.forwards,
        right = args.right,
        clockwise = args.clockwise,
        ?duration,
        "driving"
    );

    let interrupted = tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        warn!("interrupted; stopping");
    }

    let stopped = robot.stop().await;
    robot.close().await;
    stopped.map_err(|err| session_error("stop failed", err))?;

    let out = DriveOutput {
        schema_id: schema_id("drive-result"),
        forwards: args.forwards,
        right: args.right,
        clockwise: args.clockwise,
        duration_ms: duration.as_millis(),
        interrupted,
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Raw => {}
        _ => print_fields(
            "Drive",
            &[
                (
                    "speed",
                    format!(
                        "forwards={}m/s right={}m/s clockwise={}°/s",
                        out.forwards, out.right, out.clockwise
                    ),
                ),
                ("duration", format!("{}ms", out.duration_ms)),
                ("interrupted", out.interrupted.to_string()),
            ],
            format,
        ),
    }
    Ok(SUCCESS)
}

#[derive(Serialize)]
struct MoveOutput {
    schema_id: String,
    forwards: f64,
    right: f64,
    clockwise: f64,
    speed: Option<f64>,
    rotation_speed: Option<f64>,
    accepted: bool,
}

/// Start a relative move. Returns once the robot has accepted it.
pub async fn run_move(args: MoveArgs, format: OutputFormat) -> CliResult<i32> {
    let robot = args.connect.connect().await?;
    let result = robot
        .move_by(
            args.forwards,
            args.right,
            args.clockwise,
            args.speed,
            args.rotation_speed,
        )
        .await;
    robot.close().await;
    result.map_err(|err| session_error("move failed", err))?;

    let out = MoveOutput {
        schema_id: schema_id("move-accepted"),
        forwards: args.forwards,
        right: args.right,
        clockwise: args.clockwise,
        speed: args.speed,
        rotation_speed: args.rotation_speed,
        accepted: true,
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Raw => println!("ok"),
        _ => print_fields(
            "Move",
            &[
                (
                    "offset",
                    format!(
                        "forwards={}m right={}m clockwise={}°",
                        out.forwards, out.right, out.clockwise
                    ),
                ),
                ("accepted", out.accepted.to_string()),
            ],
            format,
        ),
    }
    Ok(SUCCESS)
}
