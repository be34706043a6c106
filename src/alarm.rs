use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// default decay rate of the asymptotic curve
pub const DEFAULT_DECAY: f64 = 5.0;
/// default steepness of the s-curve
pub const DEFAULT_SHARPNESS: f64 = 10.0;

/// represents an alarm as the controller sees it.
/// the record is owned by the alarm server, this is only the copy from the last poll
#[derive(Debug, Clone, PartialEq)]
pub struct Alarm {
    pub id: String,
    pub name: String,
    pub hour: u8,
    pub minute: u8,
    pub color: String,
    /// length of the ramp in minutes, at least one
    pub length: u32,
    pub curve: IntensityCurve,
    pub is_active: bool,
    pub recurrence: RecurrencePattern,
}

impl Alarm {
    /// the wall clock time the alarm goes off at
    #[must_use]
    pub fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }

    /// the ramp length in seconds
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        f64::from(self.length.max(1)) * 60.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrencePattern {
    Daily,
    /// weekdays with 0 being monday
    Weekly { days: BTreeSet<u8> },
    Custom { dates: BTreeSet<NaiveDate> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntensityCurve {
    pub start: f64,
    pub end: f64,
    pub shape: CurveShape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CurveShape {
    Linear,
    Asymptotic { decay: f64 },
    SCurve { sharpness: f64 },
    /// only the y values of the points shape the curve, see [`IntensityCurve::evaluate`]
    Custom { points: Vec<ControlPoint> },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub x: f64,
    pub y: f64,
}

impl ControlPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// why a wire record was not turned into an [`Alarm`]
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("alarm {id} has an invalid time {time:?}, expected HH:MM")]
    InvalidTime { id: String, time: String },
}

/// the alarm exactly as the server sends it
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAlarm {
    pub id: WireId,
    pub name: String,
    pub time: String,
    #[serde(default)]
    pub color: String,
    pub length: i64,
    pub intensity_curve: WireCurve,
    pub is_active: bool,
    pub recurrence: WireRecurrence,
}

/// the server has used both uuids and numbers as ids
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCurve {
    pub start_intensity: f64,
    pub end_intensity: f64,
    pub curve: String,
    pub hyper_parameter: Option<f64>,
    pub control_points: Option<Vec<WirePoint>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WirePoint {
    Pair([f64; 2]),
    Object { x: f64, y: f64 },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecurrence {
    #[serde(rename = "type")]
    pub kind: String,
    pub days: Option<Vec<i64>>,
    pub custom_dates: Option<Vec<String>>,
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Number(n) => n.to_string(),
            WireId::Text(s) => s,
        }
    }
}

impl From<WirePoint> for ControlPoint {
    fn from(point: WirePoint) -> Self {
        match point {
            WirePoint::Pair([x, y]) | WirePoint::Object { x, y } => Self { x, y },
        }
    }
}

/// a hyper parameter only counts if it is a usable positive number
fn positive_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(default)
}

impl From<WireCurve> for IntensityCurve {
    fn from(wire: WireCurve) -> Self {
        let shape = match wire.curve.as_str() {
            "linear" => CurveShape::Linear,
            "asymptotic" => CurveShape::Asymptotic {
                decay: positive_or(wire.hyper_parameter, DEFAULT_DECAY),
            },
            "s-curve" => CurveShape::SCurve {
                sharpness: positive_or(wire.hyper_parameter, DEFAULT_SHARPNESS),
            },
            "custom" => CurveShape::Custom {
                points: wire
                    .control_points
                    .unwrap_or_default()
                    .into_iter()
                    .map(ControlPoint::from)
                    .collect(),
            },
            other => {
                log::warn!("unknown curve {other:?}, falling back to linear");
                CurveShape::Linear
            }
        };
        Self {
            start: wire.start_intensity,
            end: wire.end_intensity,
            shape,
        }
    }
}

/// reads the date part of `YYYY-MM-DD` or a full iso timestamp
fn parse_date(text: &str) -> Option<NaiveDate> {
    let date = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

impl From<WireRecurrence> for RecurrencePattern {
    fn from(wire: WireRecurrence) -> Self {
        match wire.kind.as_str() {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly {
                days: wire
                    .days
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|d| u8::try_from(d).ok())
                    .filter(|d| *d <= 6)
                    .collect(),
            },
            "custom" => Self::Custom {
                dates: wire
                    .custom_dates
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|d| {
                        let date = parse_date(d);
                        if date.is_none() {
                            log::warn!("skipping unreadable custom date {d:?}");
                        }
                        date
                    })
                    .collect(),
            },
            other => {
                log::warn!("unknown recurrence {other:?}, falling back to daily");
                Self::Daily
            }
        }
    }
}

/// accepts `HH:MM` and `HH:MM:SS`, the seconds are dropped
fn parse_time(text: &str) -> Option<(u8, u8)> {
    let time = NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .ok()?;
    Some((
        u8::try_from(time.hour()).ok()?,
        u8::try_from(time.minute()).ok()?,
    ))
}

impl TryFrom<WireAlarm> for Alarm {
    type Error = DecodeError;

    fn try_from(wire: WireAlarm) -> Result<Self, Self::Error> {
        let id = String::from(wire.id);
        let Some((hour, minute)) = parse_time(&wire.time) else {
            return Err(DecodeError::InvalidTime {
                id,
                time: wire.time,
            });
        };
        Ok(Self {
            id,
            name: wire.name,
            hour,
            minute,
            color: wire.color,
            length: u32::try_from(wire.length.max(1)).unwrap_or(u32::MAX),
            curve: wire.intensity_curve.into(),
            is_active: wire.is_active,
            recurrence: wire.recurrence.into(),
        })
    }
}

/// turns server records into alarms, a record that can't be read is logged and skipped
pub fn decode_all(records: Vec<WireAlarm>) -> Vec<Alarm> {
    records
        .into_iter()
        .filter_map(|record| match Alarm::try_from(record) {
            Ok(alarm) => Some(alarm),
            Err(e) => {
                log::warn!("dropping alarm: {e}");
                None
            }
        })
        .collect()
}
