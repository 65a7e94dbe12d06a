use std::time::Instant;

use rmlink_frame::Command;
use serde::Serialize;
use tracing::debug;

use crate::cmd::SendArgs;
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_fields, print_json, schema_id, OutputFormat};

#[derive(Serialize)]
struct SendOutput {
    schema_id: String,
    command: String,
    reply: String,
    tokens: Vec<String>,
    latency_ms: f64,
}

pub async fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let command = Command::from_tokens(args.command.iter().flat_map(|arg| arg.split_whitespace()));
    let robot = args.connect.connect().await?;

    let started = Instant::now();
    let result = robot.execute(&command).await;
    let latency = started.elapsed();
    robot.close().await;

    let reply = result.map_err(|err| session_error("command failed", err))?;
    debug!(command = %command, ?latency, "reply received");

    let out = SendOutput {
        schema_id: schema_id("command-reply"),
        command: command.to_text(),
        reply: reply.text(),
        tokens: reply.tokens().to_vec(),
        latency_ms: (latency.as_secs_f64() * 1000.0 * 100.0).round() / 100.0,
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Raw => println!("{}", out.reply),
        OutputFormat::Table | OutputFormat::Pretty => print_fields(
            "Reply",
            &[
                ("command", out.command.clone()),
                ("reply", out.reply.clone()),
                ("latency", format!("{:.2}ms", out.latency_ms)),
            ],
            format,
        ),
    }
    Ok(SUCCESS)
}
