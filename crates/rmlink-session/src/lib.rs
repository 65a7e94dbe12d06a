//! Sessions with a RoboMaster robot.
//!
//! A [`Session`] owns the control connection. It performs the SDK handshake,
//! serializes writes, matches replies to the commands that caused them and
//! routes pushed sensor data into per-channel [`Feed`](rmlink_feed::Feed)s.
//!
//! ```no_run
//! use rmlink_frame::Command;
//! use rmlink_session::{Session, SessionConfig};
//! use rmlink_transport::Endpoint;
//!
//! # async fn demo() -> rmlink_session::Result<()> {
//! let session = Session::connect(Endpoint::direct(), SessionConfig::default()).await?;
//! let version = session.issue(&Command::new("version ?")).await?;
//! println!("{}", version.text());
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod dispatcher;
pub mod error;
#[cfg(feature = "fake-device")]
pub mod fake;
pub mod session;
pub mod telemetry;

pub use config::SessionConfig;
pub use data::{
    ArmPosition, ChassisAttitude, ChassisPosition, ChassisSpeed, ChassisStatus, Frequency,
    FromResponse, GripperStatus, Line, LineColour, LineType, Mode, Point,
    UnknownToken, WheelSpeed,
};
pub use dispatcher::{Dispatcher, FrameSink};
pub use error::{ProtocolAnomaly, Result, SessionError};
#[cfg(feature = "fake-device")]
pub use fake::{default_reply, FakeReply, FakeRobot};
pub use session::{Session, SessionState, HANDSHAKE_COMMAND, QUIT_COMMAND};
pub use telemetry::Telemetry;
