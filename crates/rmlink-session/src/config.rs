use std::time::Duration;

use rmlink_frame::FrameConfig;

/// Configuration for a robot session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deadline for resolving and connecting. Default: 5s.
    pub connect_timeout: Duration,
    /// Deadline for the robot to acknowledge the SDK handshake. Default: 5s.
    pub handshake_timeout: Duration,
    /// Deadline for each command issued without an explicit timeout. Default: 5s.
    pub command_timeout: Duration,
    /// Deadline for the polite `quit` sent on close. Default: 1s.
    pub close_timeout: Duration,
    /// Frame limits for both directions.
    pub frame: FrameConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            handshake_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(5),
            close_timeout: Duration::from_secs(1),
            frame: FrameConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Use one deadline for connect, handshake and commands.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self.handshake_timeout = timeout;
        self.command_timeout = timeout;
        self
    }
}
