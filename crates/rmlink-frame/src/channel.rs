//! Push channel IDs.
//!
//! A Push frame carries its sensor channel in the key field. IR distance
//! sensors occupy a small contiguous block, one channel per sensor index.

/// Line recognition results.
pub const LINE: u16 = 0x0001;

/// Chassis position (x, y, optional heading).
pub const CHASSIS_POSITION: u16 = 0x0002;

/// Chassis attitude (pitch, roll, yaw).
pub const CHASSIS_ATTITUDE: u16 = 0x0003;

/// Chassis status flags.
pub const CHASSIS_STATUS: u16 = 0x0004;

/// Robotic arm position.
pub const ARM_POSITION: u16 = 0x0005;

/// Channel of IR sensor index 0 (sensor indices start at 1).
pub const IR_DISTANCE_BASE: u16 = 0x0010;

/// Number of IR distance sensors the robot can carry.
pub const IR_SENSOR_COUNT: u8 = 4;

/// Channel for IR sensor `index` (1-based), if the index is in range.
pub fn ir_distance(index: u8) -> Option<u16> {
    if (1..=IR_SENSOR_COUNT).contains(&index) {
        Some(IR_DISTANCE_BASE + u16::from(index))
    } else {
        None
    }
}

/// IR sensor index carried by `channel`, if it is an IR channel.
pub fn ir_index(channel: u16) -> Option<u8> {
    let offset = channel.checked_sub(IR_DISTANCE_BASE)?;
    let index = u8::try_from(offset).ok()?;
    ir_distance(index).map(|_| index)
}

/// Returns a human-readable name for a channel ID.
pub fn channel_name(id: u16) -> &'static str {
    match id {
        LINE => "LINE",
        CHASSIS_POSITION => "CHASSIS_POSITION",
        CHASSIS_ATTITUDE => "CHASSIS_ATTITUDE",
        CHASSIS_STATUS => "CHASSIS_STATUS",
        ARM_POSITION => "ARM_POSITION",
        id if ir_index(id).is_some() => "IR_DISTANCE",
        _ => "UNKNOWN",
    }
}

/// Returns true if the channel ID is one the robot is known to push.
pub fn is_known(id: u16) -> bool {
    channel_name(id) != "UNKNOWN"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ir_channels_map_both_ways() {
        for index in 1..=IR_SENSOR_COUNT {
            let channel = ir_distance(index).unwrap();
            assert_eq!(ir_index(channel), Some(index));
            assert_eq!(channel_name(channel), "IR_DISTANCE");
        }
        assert_eq!(ir_distance(0), None);
        assert_eq!(ir_distance(IR_SENSOR_COUNT + 1), None);
        assert_eq!(ir_index(IR_DISTANCE_BASE), None);
        assert_eq!(ir_index(LINE), None);
    }

    #[test]
    fn names_and_known() {
        assert_eq!(channel_name(LINE), "LINE");
        assert_eq!(channel_name(ARM_POSITION), "ARM_POSITION");
        assert!(is_known(CHASSIS_STATUS));
        assert!(!is_known(0x0100));
    }
}
