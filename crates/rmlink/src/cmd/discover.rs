use rmlink_transport::{discover, DiscoveryConfig};
use serde::Serialize;

use crate::cmd::{parse_duration, DiscoverArgs};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_fields, print_json, schema_id, OutputFormat};

#[derive(Serialize)]
struct DiscoverOutput {
    schema_id: String,
    host: String,
    port: u16,
    mode: String,
}

pub async fn run(args: DiscoverArgs, format: OutputFormat) -> CliResult<i32> {
    let config = DiscoveryConfig {
        bind_addr: args.bind,
        timeout: parse_duration(&args.timeout)?,
    };
    let endpoint = discover(&config)
        .await
        .map_err(|err| transport_error("discovery failed", err))?;

    let out = DiscoverOutput {
        schema_id: schema_id("robot-discovered"),
        host: endpoint.host().to_string(),
        port: endpoint.port(),
        mode: endpoint.mode().to_string(),
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Raw => println!("{}", out.host),
        _ => print_fields(
            "Robot",
            &[
                ("host", out.host.clone()),
                ("port", out.port.to_string()),
                ("mode", out.mode.clone()),
            ],
            format,
        ),
    }
    Ok(SUCCESS)
}
