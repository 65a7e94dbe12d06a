//! Drive a square against the in-process fake robot.
//!
//! Run with:
//!   cargo run --example drive-square --features fake-device
//!
//! Point `Robot::connect` at a real robot to drive it instead.

use rmlink::session::{FakeReply, FakeRobot};
use rmlink::Robot;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Report a heading so each corner has something to print.
    let fake = FakeRobot::with_responder(|cmd| match cmd {
        "chassis position ?" => FakeReply::Text("0.5 0 90".to_string()),
        other => rmlink::session::default_reply(other),
    })
    .await?;

    let robot = Robot::connect_with_config(fake.endpoint(), Default::default()).await?;
    eprintln!("[client] connected, firmware {}", robot.version().await?);

    for side in 1..=4 {
        robot.move_by(0.5, 0.0, 0.0, Some(0.5), None).await?;
        robot.move_by(0.0, 0.0, 90.0, None, Some(90.0)).await?;
        let position = robot.position().await?;
        eprintln!(
            "[client] side {side}: forwards={:.2} right={:.2} heading={:?}",
            position.forwards, position.right, position.clockwise
        );
    }

    robot.stop().await?;
    robot.close().await;

    for command in fake.received() {
        eprintln!("[robot] {command}");
    }
    Ok(())
}
