use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("rmlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: rmlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("RMLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("control_port: {}", rmlink_transport::CONTROL_PORT);
    println!("broadcast_port: {}", rmlink_transport::BROADCAST_PORT);
    println!(
        "max_payload: {}",
        rmlink_frame::DEFAULT_MAX_PAYLOAD
    );
    println!(
        "features: cli=true, fake-device={}",
        cfg!(feature = "fake-device")
    );

    Ok(SUCCESS)
}
