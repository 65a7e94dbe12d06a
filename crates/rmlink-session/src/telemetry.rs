//! Routing of pushed sensor data into per-channel feeds.

use rmlink_feed::Feed;
use rmlink_frame::{channel, Response};
use tracing::trace;

use crate::data::{ArmPosition, ChassisAttitude, ChassisPosition, ChassisStatus, FromResponse, Line};
use crate::error::ProtocolAnomaly;

const IR_SENSORS: usize = channel::IR_SENSOR_COUNT as usize;

/// One feed per sensor channel.
///
/// Each accessor hands out a handle to the same underlying feed, so at most
/// one consumer (or one [`DroppingFeed`](rmlink_feed::DroppingFeed)) should
/// read a given channel.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    line: Feed<Line>,
    position: Feed<ChassisPosition>,
    attitude: Feed<ChassisAttitude>,
    status: Feed<ChassisStatus>,
    arm: Feed<ArmPosition>,
    ir: [Feed<f64>; IR_SENSORS],
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Line recognition results. Enable with line recognition on.
    pub fn line(&self) -> Feed<Line> {
        self.line.clone()
    }

    pub fn position(&self) -> Feed<ChassisPosition> {
        self.position.clone()
    }

    pub fn attitude(&self) -> Feed<ChassisAttitude> {
        self.attitude.clone()
    }

    pub fn status(&self) -> Feed<ChassisStatus> {
        self.status.clone()
    }

    pub fn arm(&self) -> Feed<ArmPosition> {
        self.arm.clone()
    }

    /// Distance feed (mm) for IR sensor `index`, 1-based.
    pub fn ir_distance(&self, index: u8) -> Option<Feed<f64>> {
        channel::ir_distance(index)?;
        self.ir.get(usize::from(index) - 1).cloned()
    }

    /// Parse a push payload and produce it into its channel's feed.
    pub fn route(&self, channel_id: u16, payload: &[u8]) -> Result<(), ProtocolAnomaly> {
        if !channel::is_known(channel_id) {
            return Err(ProtocolAnomaly::UnknownChannel(channel_id));
        }
        let response = Response::parse(payload).map_err(|source| ProtocolAnomaly::BadPayload {
            channel: channel_id,
            source,
        })?;
        trace!(
            channel = channel::channel_name(channel_id),
            tokens = response.len(),
            "push received"
        );

        match channel_id {
            channel::LINE => produce(&self.line, channel_id, &response),
            channel::CHASSIS_POSITION => produce(&self.position, channel_id, &response),
            channel::CHASSIS_ATTITUDE => produce(&self.attitude, channel_id, &response),
            channel::CHASSIS_STATUS => produce(&self.status, channel_id, &response),
            channel::ARM_POSITION => produce(&self.arm, channel_id, &response),
            id => match channel::ir_index(id) {
                Some(index) => produce(&self.ir[usize::from(index) - 1], id, &response),
                None => Err(ProtocolAnomaly::UnknownChannel(id)),
            },
        }
    }

    /// End every feed. Queued readings stay available to consumers.
    pub fn terminate_all(&self) {
        self.line.terminate();
        self.position.terminate();
        self.attitude.terminate();
        self.status.terminate();
        self.arm.terminate();
        for feed in &self.ir {
            feed.terminate();
        }
    }
}

fn produce<T: FromResponse>(
    feed: &Feed<T>,
    channel: u16,
    response: &Response,
) -> Result<(), ProtocolAnomaly> {
    let value =
        T::from_response(response).map_err(|source| ProtocolAnomaly::BadPayload { channel, source })?;
    feed.produce(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LineType;

    #[tokio::test]
    async fn routes_to_matching_feed() {
        let telemetry = Telemetry::new();
        telemetry.route(channel::CHASSIS_ATTITUDE, b"1 2 3").unwrap();
        telemetry.route(channel::LINE, b"0").unwrap();

        let attitude = telemetry.attitude().next_value().await.unwrap().unwrap();
        assert_eq!(attitude.yaw, 3.0);
        let line = telemetry.line().next_value().await.unwrap().unwrap();
        assert_eq!(line.line_type, LineType::NoLine);
        assert!(line.points.is_empty());
    }

    #[tokio::test]
    async fn ir_channels_are_independent() {
        let telemetry = Telemetry::new();
        let ch2 = channel::ir_distance(2).unwrap();
        telemetry.route(ch2, b"153").unwrap();

        assert!(telemetry.ir_distance(1).unwrap().is_empty());
        let feed = telemetry.ir_distance(2).unwrap();
        assert_eq!(feed.next_value().await.unwrap(), Some(153.0));
        assert!(telemetry.ir_distance(0).is_none());
        assert!(telemetry.ir_distance(5).is_none());
    }

    #[test]
    fn unknown_channel_and_bad_payload_are_anomalies() {
        let telemetry = Telemetry::new();
        assert_eq!(
            telemetry.route(0x0999, b"1"),
            Err(ProtocolAnomaly::UnknownChannel(0x0999))
        );
        assert!(matches!(
            telemetry.route(channel::CHASSIS_POSITION, b"north"),
            Err(ProtocolAnomaly::BadPayload { channel: channel::CHASSIS_POSITION, .. })
        ));
        assert!(telemetry.position().is_empty());
    }

    #[test]
    fn unknown_channel_wins_over_unreadable_payload() {
        let telemetry = Telemetry::new();
        assert_eq!(
            telemetry.route(0x0100, &[0xff, 0xfe]),
            Err(ProtocolAnomaly::UnknownChannel(0x0100))
        );
        assert!(matches!(
            telemetry.route(channel::LINE, &[0xff, 0xfe]),
            Err(ProtocolAnomaly::BadPayload { channel: channel::LINE, .. })
        ));
    }

    #[tokio::test]
    async fn terminate_keeps_queued_readings() {
        let telemetry = Telemetry::new();
        telemetry.route(channel::ARM_POSITION, b"10 20").unwrap();
        telemetry.terminate_all();

        let arm = telemetry.arm();
        assert_eq!(
            arm.next_value().await.unwrap(),
            Some(ArmPosition { x: 10.0, y: 20.0 })
        );
        assert_eq!(arm.next_value().await.unwrap(), None);
    }
}
