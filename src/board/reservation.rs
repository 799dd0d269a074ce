//! Reservation records as they arrive from the feed.
//!
//! The feed is untyped JSON, so decoding is forgiving: a field
//! with the wrong shape is treated as absent and shows up as a placeholder
//! on the board instead of failing the whole refresh.

use crate::feed::FetchError;
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reservation {
    pub license_plate: Option<String>,
    pub start_time: Option<OffsetDateTime>,
    pub end_time: Option<OffsetDateTime>,
    pub lane: Option<String>,
    pub remark: Option<String>,
    /// State of charge in percent, shown as-is.
    pub soc: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalStatus {
    Upcoming,
    Ongoing,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemarkKind {
    Charging,
    Idling,
    Other,
}

impl RemarkKind {
    /// `"charging"` must match exactly, idling only needs the prefix so
    /// remarks like `"idling - please move"` still count.
    pub fn parse(remark: Option<&str>) -> Self {
        let Some(remark) = remark else {
            return Self::Other;
        };
        let normalized = remark.trim().to_lowercase();
        if normalized == "charging" {
            Self::Charging
        } else if normalized.starts_with("idling") {
            Self::Idling
        } else {
            Self::Other
        }
    }

    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Charging | Self::Idling)
    }

    pub fn is_alert(self) -> bool {
        matches!(self, Self::Idling)
    }
}

impl Reservation {
    pub fn status_at(&self, now: OffsetDateTime) -> TemporalStatus {
        match (self.start_time, self.end_time) {
            (Some(start), _) if start > now => TemporalStatus::Upcoming,
            (Some(start), Some(end)) if start <= now && now <= end => TemporalStatus::Ongoing,
            _ => TemporalStatus::Expired,
        }
    }

    pub fn remark_kind(&self) -> RemarkKind {
        RemarkKind::parse(self.remark.as_deref())
    }

    /// Length of the reservation window, clamped at zero for records whose
    /// end precedes their start.
    pub fn duration(&self) -> Option<Duration> {
        let (start, end) = (self.start_time?, self.end_time?);
        Some((end - start).max(Duration::ZERO))
    }
}

/// Decode a feed payload. Anything other than a JSON array is rejected as a
/// whole; individual elements never fail.
pub fn decode_records(payload: &Value, offset: UtcOffset) -> Result<Vec<Reservation>, FetchError> {
    let items = payload.as_array().ok_or(FetchError::MalformedPayload)?;
    Ok(items.iter().map(|item| decode_record(item, offset)).collect())
}

pub fn decode_record(value: &Value, offset: UtcOffset) -> Reservation {
    let Some(fields) = value.as_object() else {
        return Reservation::default();
    };

    Reservation {
        license_plate: text_field(fields.get("licensePlate")),
        start_time: fields
            .get("startTime")
            .and_then(|value| parse_timestamp(value, offset)),
        end_time: fields
            .get("endTime")
            .and_then(|value| parse_timestamp(value, offset)),
        lane: text_field(fields.get("lane")),
        remark: text_field(fields.get("remark")),
        soc: soc_field(fields),
    }
}

fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn soc_field(fields: &Map<String, Value>) -> Option<f64> {
    let value = fields
        .get("soc")
        .filter(|value| !value.is_null())
        .or_else(|| fields.get("battery"))?;
    let soc: Option<f64> = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    };
    soc.filter(|soc| soc.is_finite())
}

/// Parse a feed timestamp: RFC 3339, a naive ISO date-time read in the
/// board's offset, or epoch milliseconds. The result is expressed in the
/// board's offset; an instant that has no representable local date there
/// is treated as absent.
pub fn parse_timestamp(value: &Value, offset: UtcOffset) -> Option<OffsetDateTime> {
    let instant = match value {
        Value::String(text) => parse_timestamp_str(text.trim(), offset)?,
        Value::Number(number) => {
            let millis = number.as_i64()?;
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()?
        }
        _ => return None,
    };
    instant.checked_to_offset(offset)
}

fn parse_timestamp_str(text: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
    if let Ok(instant) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(instant);
    }
    let naive = format_description!(
        "[year]-[month]-[day]T[hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
    );
    PrimitiveDateTime::parse(text, naive)
        .ok()
        .map(|local| local.assume_offset(offset))
}
