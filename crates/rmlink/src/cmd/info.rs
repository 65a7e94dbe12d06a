use rmlink_session::{ChassisAttitude, ChassisPosition, ChassisStatus, Mode};
use serde::Serialize;

use crate::cmd::InfoArgs;
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_fields, print_json, schema_id, OutputFormat};
use crate::Robot;

#[derive(Serialize)]
struct InfoOutput {
    schema_id: String,
    host: String,
    port: u16,
    link_mode: String,
    version: String,
    mode: Mode,
    position: ChassisPosition,
    attitude: ChassisAttitude,
    status: ChassisStatus,
    connected: bool,
}

pub async fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let robot = args.connect.connect().await?;
    let result = collect(&robot).await;
    robot.close().await;
    let out = result.map_err(|err| session_error("query failed", err))?;

    print_info(&out, format);
    Ok(SUCCESS)
}

async fn collect(robot: &Robot) -> rmlink_session::Result<InfoOutput> {
    let endpoint = robot.session().endpoint();
    Ok(InfoOutput {
        schema_id: schema_id("robot-info"),
        host: endpoint.host().to_string(),
        port: endpoint.port(),
        link_mode: endpoint.mode().to_string(),
        version: robot.version().await?,
        mode: robot.mode().await?,
        position: robot.position().await?,
        attitude: robot.attitude().await?,
        status: robot.status().await?,
        connected: true,
    })
}

fn print_info(out: &InfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Raw => println!("{}", out.version),
        OutputFormat::Table | OutputFormat::Pretty => {
            let heading = out
                .position
                .clockwise
                .map(|deg| format!("{deg:.1}°"))
                .unwrap_or_else(|| "-".to_string());
            let rows = [
                ("robot", format!("{}:{} ({})", out.host, out.port, out.link_mode)),
                ("version", out.version.clone()),
                ("mode", out.mode.to_string()),
                (
                    "position",
                    format!(
                        "forwards={:.3}m right={:.3}m heading={heading}",
                        out.position.forwards, out.position.right
                    ),
                ),
                (
                    "attitude",
                    format!(
                        "pitch={:.1}° roll={:.1}° yaw={:.1}°",
                        out.attitude.pitch, out.attitude.roll, out.attitude.yaw
                    ),
                ),
                (
                    "static",
                    if out.status.is_static { "yes" } else { "no" }.to_string(),
                ),
            ];
            print_fields("Robot Info", &rows, format);
        }
    }
}
