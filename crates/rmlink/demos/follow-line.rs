//! Steer along a recognized line using the latest reading only.
//!
//! The fake robot pushes line readings faster than the control loop runs;
//! a dropping feed hands the loop the newest one and discards the rest.
//!
//! Run with:
//!   cargo run --example follow-line --features fake-device

use std::sync::Arc;
use std::time::Duration;

use rmlink::frame::channel;
use rmlink::session::FakeRobot;
use rmlink::{DroppingFeed, LineColour, LineType, Robot};

const SPEED: f64 = 0.2;
const STEER_GAIN: f64 = 60.0;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let fake = Arc::new(FakeRobot::spawn().await?);
    let robot = Robot::connect_with_config(fake.endpoint(), Default::default()).await?;

    robot.set_line_recognition_colour(LineColour::Blue).await?;
    robot.set_line_recognition_enabled(true).await?;
    let line = DroppingFeed::new(robot.telemetry().line());

    // Line drifts right, then disappears.
    let camera = {
        let fake = Arc::clone(&fake);
        tokio::spawn(async move {
            for step in 0..40 {
                let tangent = f64::from(step) * 0.01;
                fake.push(channel::LINE, format!("1 0.5 0.1 {tangent} 0"));
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            fake.push(channel::LINE, "0");
        })
    };

    let mut steps = 0;
    while let Some(reading) = line.get_most_recent().await? {
        if reading.line_type == LineType::NoLine {
            eprintln!("[client] line lost after {steps} steps");
            break;
        }
        let Some(ahead) = reading.points.first() else {
            continue;
        };
        let clockwise = ahead.tangent * STEER_GAIN;
        robot.set_speed(SPEED, 0.0, clockwise).await?;
        steps += 1;
        eprintln!("[client] tangent={:.2} -> clockwise={clockwise:.1}", ahead.tangent);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    camera.await?;
    robot.stop().await?;
    robot.set_line_recognition_enabled(false).await?;
    robot.close().await;
    Ok(())
}
