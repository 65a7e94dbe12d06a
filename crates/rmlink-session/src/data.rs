//! Typed robot data parsed from reply and push payloads.

use std::fmt;
use std::str::FromStr;

use rmlink_frame::{CommandArg, DataError, Response};
use serde::{Deserialize, Serialize};

/// A token that matched no variant of a protocol enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{token}'")]
pub struct UnknownToken {
    pub kind: &'static str,
    pub token: String,
}

macro_rules! token_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $token:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire token for this value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $token, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownToken;

            fn from_str(token: &str) -> Result<Self, Self::Err> {
                match token {
                    $( $token => Ok($name::$variant), )+
                    _ => Err(UnknownToken {
                        kind: stringify!($name),
                        token: token.to_string(),
                    }),
                }
            }
        }

        impl CommandArg for $name {
            fn to_token(&self) -> String {
                self.as_str().to_string()
            }
        }
    };
}

token_enum! {
    /// Push rate for chassis telemetry.
    Frequency {
        Off => "0",
        Hz1 => "1",
        Hz5 => "5",
        Hz10 => "10",
        Hz20 => "20",
        Hz30 => "30",
        Hz50 => "50",
    }
}

token_enum! {
    /// How chassis and gimbal follow each other.
    Mode {
        ChassisLead => "chassis_lead",
        GimbalLead => "gimbal_lead",
        Free => "free",
    }
}

token_enum! {
    GripperStatus {
        Closed => "0",
        PartiallyOpen => "1",
        Open => "2",
    }
}

token_enum! {
    /// Shape of the line under the robot.
    LineType {
        NoLine => "0",
        Straight => "1",
        Fork => "2",
        Intersection => "3",
    }
}

token_enum! {
    /// Colour the line recognizer tracks.
    LineColour {
        Red => "red",
        Blue => "blue",
        Green => "green",
    }
}

/// Types that can be read out of a reply or push payload.
pub trait FromResponse: Sized {
    fn from_response(response: &Response) -> Result<Self, DataError>;
}

impl FromResponse for f64 {
    fn from_response(response: &Response) -> Result<Self, DataError> {
        response.get_float(0)
    }
}

/// Wheel speeds in rpm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelSpeed {
    pub front_right: f64,
    pub front_left: f64,
    pub back_left: f64,
    pub back_right: f64,
}

/// Chassis velocity: m/s forwards and right, degrees/s clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChassisSpeed {
    pub forwards: f64,
    pub right: f64,
    pub clockwise: f64,
    pub wheels: WheelSpeed,
}

impl FromResponse for ChassisSpeed {
    fn from_response(r: &Response) -> Result<Self, DataError> {
        Ok(Self {
            forwards: r.get_float(0)?,
            right: r.get_float(1)?,
            clockwise: r.get_float(2)?,
            wheels: WheelSpeed {
                front_right: r.get_float(3)?,
                front_left: r.get_float(4)?,
                back_left: r.get_float(5)?,
                back_right: r.get_float(6)?,
            },
        })
    }
}

/// Chassis position in metres relative to power-on; heading in degrees when reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChassisPosition {
    pub forwards: f64,
    pub right: f64,
    pub clockwise: Option<f64>,
}

impl FromResponse for ChassisPosition {
    fn from_response(r: &Response) -> Result<Self, DataError> {
        Ok(Self {
            forwards: r.get_float(0)?,
            right: r.get_float(1)?,
            clockwise: if r.len() >= 3 { Some(r.get_float(2)?) } else { None },
        })
    }
}

/// Chassis attitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChassisAttitude {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

impl FromResponse for ChassisAttitude {
    fn from_response(r: &Response) -> Result<Self, DataError> {
        Ok(Self {
            pitch: r.get_float(0)?,
            roll: r.get_float(1)?,
            yaw: r.get_float(2)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChassisStatus {
    pub is_static: bool,
    pub up_hill: bool,
    pub down_hill: bool,
    pub on_slope: bool,
    pub pick_up: bool,
    pub slip: bool,
    pub impact_x: bool,
    pub impact_y: bool,
    pub impact_z: bool,
    pub roll_over: bool,
    pub hill_static: bool,
}

impl FromResponse for ChassisStatus {
    fn from_response(r: &Response) -> Result<Self, DataError> {
        Ok(Self {
            is_static: r.get_bool(0)?,
            up_hill: r.get_bool(1)?,
            down_hill: r.get_bool(2)?,
            on_slope: r.get_bool(3)?,
            pick_up: r.get_bool(4)?,
            slip: r.get_bool(5)?,
            impact_x: r.get_bool(6)?,
            impact_y: r.get_bool(7)?,
            impact_z: r.get_bool(8)?,
            roll_over: r.get_bool(9)?,
            hill_static: r.get_bool(10)?,
        })
    }
}

/// One sampled point of a recognized line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub tangent: f64,
    pub curvature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub line_type: LineType,
    pub points: Vec<Point>,
}

impl FromResponse for Line {
    fn from_response(r: &Response) -> Result<Self, DataError> {
        let line_type = r.get_parsed::<LineType>(0)?;
        // Incomplete trailing points are ignored.
        let count = r.len().saturating_sub(1) / 4;
        let points = (0..count)
            .map(|i| {
                let base = 1 + i * 4;
                Ok(Point {
                    x: r.get_float(base)?,
                    y: r.get_float(base + 1)?,
                    tangent: r.get_float(base + 2)?,
                    curvature: r.get_float(base + 3)?,
                })
            })
            .collect::<Result<Vec<_>, DataError>>()?;
        Ok(Self { line_type, points })
    }
}

/// Robotic arm position in device units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmPosition {
    pub x: f64,
    pub y: f64,
}

impl FromResponse for ArmPosition {
    fn from_response(r: &Response) -> Result<Self, DataError> {
        Ok(Self {
            x: r.get_float(0)?,
            y: r.get_float(1)?,
        })
    }
}
