//! Client for DJI RoboMaster robots over the plaintext SDK.
//!
//! rmlink connects to a robot, drives it with commands and exposes pushed
//! sensor data as ordered feeds.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP connection and UDP robot discovery
//! - [`frame`]: Checksummed framing, command builder and reply tokens
//! - [`feed`]: Ordered feeds and latest-value dropping feeds
//! - [`session`]: Handshake, command dispatch and telemetry routing
//! - [`Robot`]: The command catalogue over a session
//!
//! ```no_run
//! use rmlink::{Robot, DIRECT_CONNECT_IP};
//!
//! # async fn demo() -> rmlink::session::Result<()> {
//! let robot = Robot::connect(DIRECT_CONNECT_IP).await?;
//! robot.set_speed(0.3, 0.0, 0.0).await?;
//! let position = robot.position().await?;
//! println!("{position:?}");
//! robot.close().await;
//! # Ok(())
//! # }
//! ```

pub mod robot;

/// Re-export transport types.
pub mod transport {
    pub use rmlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use rmlink_frame::*;
}

/// Re-export feed types.
pub mod feed {
    pub use rmlink_feed::*;
}

/// Re-export session types.
pub mod session {
    pub use rmlink_session::*;
}

pub use rmlink_feed::{DroppingFeed, Feed};
pub use rmlink_session::{
    ArmPosition, ChassisAttitude, ChassisPosition, ChassisSpeed, ChassisStatus, Frequency,
    GripperStatus, Line, LineColour, LineType, Mode, Point, WheelSpeed,
};
pub use rmlink_transport::{Endpoint, DIRECT_CONNECT_IP};
pub use robot::Robot;
