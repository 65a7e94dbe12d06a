//! The RoboMaster command catalogue.
//!
//! Every method issues one command and waits for the robot to accept it.
//! Motion commands return as soon as the robot has started moving.

use std::time::Duration;

use rmlink_frame::{Command, Response};
use rmlink_session::{
    ArmPosition, ChassisAttitude, ChassisPosition, ChassisSpeed, ChassisStatus, Frequency,
    FromResponse, GripperStatus, LineColour, Mode, Result, Session, SessionConfig, Telemetry,
};
use rmlink_transport::Endpoint;
use tracing::debug;

/// A connected robot.
#[derive(Debug)]
pub struct Robot {
    session: Session,
}

impl Robot {
    /// Connect to the robot at `host` on the standard control port.
    ///
    /// Pass [`DIRECT_CONNECT_IP`](rmlink_transport::DIRECT_CONNECT_IP) when
    /// joined to the robot's own access point.
    pub async fn connect(host: &str) -> Result<Self> {
        Self::connect_with_config(Endpoint::for_host(host), SessionConfig::default()).await
    }

    pub async fn connect_with_config(endpoint: Endpoint, config: SessionConfig) -> Result<Self> {
        let session = Session::connect(endpoint, config).await?;
        Ok(Self { session })
    }

    pub fn from_session(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Pushed sensor feeds. Each stays empty until its push is enabled.
    pub fn telemetry(&self) -> &Telemetry {
        self.session.telemetry()
    }

    /// Leave SDK mode and disconnect.
    pub async fn close(&self) {
        self.session.close().await;
    }

    /// Send a raw command built from tokens and wait for its reply.
    pub async fn execute(&self, command: &Command) -> Result<Response> {
        debug!(command = %command, "execute");
        self.session.issue(command).await
    }

    /// Like [`execute`](Robot::execute) with an explicit deadline.
    pub async fn execute_with_timeout(
        &self,
        command: &Command,
        timeout: Duration,
    ) -> Result<Response> {
        self.session.issue_with_timeout(command, timeout).await
    }

    async fn query<T: FromResponse>(&self, command: Command) -> Result<T> {
        let reply = self.execute(&command).await?;
        Ok(T::from_response(&reply)?)
    }

    async fn acknowledged(&self, command: Command) -> Result<()> {
        let reply = self.execute(&command).await?;
        if !reply.is_ok() {
            debug!(command = %command, reply = %reply.text(), "unexpected acknowledgement");
        }
        Ok(())
    }

    /// SDK firmware version string.
    pub async fn version(&self) -> Result<String> {
        let reply = self.execute(&Command::new("version ?")).await?;
        Ok(reply.get_str(0)?.to_string())
    }

    pub async fn set_mode(&self, mode: Mode) -> Result<()> {
        self.acknowledged(Command::new("robot mode").arg(mode)).await
    }

    pub async fn mode(&self) -> Result<Mode> {
        let reply = self.execute(&Command::new("robot mode ?")).await?;
        Ok(reply.get_parsed(0)?)
    }

    /// Drive at the given speeds until told otherwise.
    ///
    /// `forwards` and `right` are in m/s, `clockwise` in degrees/s.
    pub async fn set_speed(&self, forwards: f64, right: f64, clockwise: f64) -> Result<()> {
        let cmd = Command::new("chassis speed")
            .param("x", forwards)
            .param("y", right)
            .param("z", clockwise);
        self.acknowledged(cmd).await
    }

    /// Set each wheel's speed in rpm.
    pub async fn set_wheel_speed(
        &self,
        front_right: f64,
        front_left: f64,
        back_left: f64,
        back_right: f64,
    ) -> Result<()> {
        let cmd = Command::new("chassis wheel")
            .param("w1", front_right)
            .param("w2", front_left)
            .param("w3", back_left)
            .param("w4", back_right);
        self.acknowledged(cmd).await
    }

    pub async fn set_left_right_wheel_speeds(&self, left: f64, right: f64) -> Result<()> {
        self.set_wheel_speed(right, left, left, right).await
    }

    pub async fn set_all_wheel_speeds(&self, speed: f64) -> Result<()> {
        self.set_wheel_speed(speed, speed, speed, speed).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.set_speed(0.0, 0.0, 0.0).await
    }

    pub async fn speed(&self) -> Result<ChassisSpeed> {
        self.query(Command::new("chassis speed ?")).await
    }

    /// Move by a relative offset, rotating while moving.
    ///
    /// Distances are in metres and `clockwise` in degrees. `speed` (m/s)
    /// and `rotation_speed` (degrees/s) fall back to the robot's defaults.
    /// Returns once the move has started, not when it finishes.
    pub async fn move_by(
        &self,
        forwards: f64,
        right: f64,
        clockwise: f64,
        speed: Option<f64>,
        rotation_speed: Option<f64>,
    ) -> Result<()> {
        let cmd = Command::new("chassis move")
            .param("x", forwards)
            .param("y", right)
            .param("z", clockwise)
            .opt_param("vxy", speed)
            .opt_param("vz", rotation_speed);
        self.acknowledged(cmd).await
    }

    pub async fn position(&self) -> Result<ChassisPosition> {
        self.query(Command::new("chassis position ?")).await
    }

    pub async fn attitude(&self) -> Result<ChassisAttitude> {
        self.query(Command::new("chassis attitude ?")).await
    }

    pub async fn status(&self) -> Result<ChassisStatus> {
        self.query(Command::new("chassis status ?")).await
    }

    /// Push rate for [`Telemetry::position`]. [`Frequency::Off`] disables it.
    pub async fn set_chassis_position_push_rate(&self, freq: Frequency) -> Result<()> {
        self.acknowledged(push_rate("chassis", "position", "pfreq", freq))
            .await
    }

    pub async fn set_chassis_attitude_push_rate(&self, freq: Frequency) -> Result<()> {
        self.acknowledged(push_rate("chassis", "attitude", "afreq", freq))
            .await
    }

    pub async fn set_chassis_status_push_rate(&self, freq: Frequency) -> Result<()> {
        self.acknowledged(push_rate("chassis", "status", "sfreq", freq))
            .await
    }

    pub async fn set_ir_enabled(&self, enabled: bool) -> Result<()> {
        self.acknowledged(Command::new("ir_distance_sensor measure").arg(enabled))
            .await
    }

    /// Distance in millimetres from IR sensor `sensor` (1-based).
    ///
    /// Measurement must be enabled first with [`set_ir_enabled`](Robot::set_ir_enabled).
    pub async fn ir_distance(&self, sensor: u8) -> Result<f64> {
        self.query(
            Command::new("ir_distance_sensor distance")
                .arg(sensor)
                .arg("?"),
        )
        .await
    }

    /// Push rate for the [`Telemetry::ir_distance`] feeds.
    pub async fn set_ir_push_rate(&self, freq: Frequency) -> Result<()> {
        self.acknowledged(push_rate("ir_distance_sensor", "distance", "dfreq", freq))
            .await
    }

    /// Move the arm relative to its current position, in device units.
    pub async fn move_arm(&self, x: f64, y: f64) -> Result<()> {
        let cmd = Command::new("robotic_arm move").param("x", x).param("y", y);
        self.acknowledged(cmd).await
    }

    /// Move the arm to an absolute position, in device units.
    ///
    /// The origin differs between robots; read [`arm_position`](Robot::arm_position)
    /// at the desired pose to find the values.
    pub async fn set_arm_position(&self, x: f64, y: f64) -> Result<()> {
        let cmd = Command::new("robotic_arm moveto").param("x", x).param("y", y);
        self.acknowledged(cmd).await
    }

    pub async fn arm_position(&self) -> Result<ArmPosition> {
        self.query(Command::new("robotic_arm position ?")).await
    }

    /// Push rate for [`Telemetry::arm`].
    pub async fn set_arm_push_rate(&self, freq: Frequency) -> Result<()> {
        self.acknowledged(push_rate("robotic_arm", "position", "pfreq", freq))
            .await
    }

    pub async fn open_gripper(&self) -> Result<()> {
        self.acknowledged(Command::new("robotic_gripper open").arg(1))
            .await
    }

    /// Close until resistance is met. Grips an object without damaging itself.
    pub async fn close_gripper(&self) -> Result<()> {
        self.acknowledged(Command::new("robotic_gripper close").arg(1))
            .await
    }

    pub async fn gripper_status(&self) -> Result<GripperStatus> {
        let reply = self.execute(&Command::new("robotic_gripper status ?")).await?;
        Ok(reply.get_parsed(0)?)
    }

    pub async fn set_line_recognition_colour(&self, colour: LineColour) -> Result<()> {
        let cmd = Command::new("AI attribute").param("line_color", colour);
        self.acknowledged(cmd).await
    }

    /// Toggle line recognition pushes into [`Telemetry::line`].
    pub async fn set_line_recognition_enabled(&self, enabled: bool) -> Result<()> {
        self.acknowledged(Command::new("AI push line").arg(enabled))
            .await
    }
}

/// `<topic> push <subject> on <key> <hz>`, or `... off` for [`Frequency::Off`].
fn push_rate(topic: &str, subject: &str, key: &str, freq: Frequency) -> Command {
    let cmd = Command::new(topic).arg("push").arg(subject);
    match freq {
        Frequency::Off => cmd.arg(false),
        freq => cmd.arg(true).param(key, freq),
    }
}

impl From<Session> for Robot {
    fn from(session: Session) -> Self {
        Self::from_session(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_rate_commands() {
        assert_eq!(
            push_rate("chassis", "position", "pfreq", Frequency::Hz10).to_text(),
            "chassis push position on pfreq 10"
        );
        assert_eq!(
            push_rate("chassis", "status", "sfreq", Frequency::Off).to_text(),
            "chassis push status off"
        );
    }
}
