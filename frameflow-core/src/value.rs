//! Cell value types for decoded result tables.
//!
//! A [`Value`] is a loosely-typed cell: the variant is chosen by the column's
//! [`DataKind`] when the frame is decoded, and passes through the decoder and
//! record projector untouched.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use compact_str::CompactString;
use uuid::Uuid;

use crate::error::ProtocolError;
use crate::schema::DataKind;

/// Possible cell values.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null/missing value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Signed integer (both `int` and `long` columns)
    Int(i64),
    /// Floating point
    Real(f64),
    /// Decimal kept in its textual form
    Decimal(CompactString),
    /// String. Uses CompactString for small-string optimization.
    String(CompactString),
    /// UTC timestamp
    DateTime(DateTime<Utc>),
    /// Time interval
    TimeSpan(Duration),
    /// GUID
    Guid(Uuid),
    /// Arbitrary JSON (arrays, property bags)
    Dynamic(serde_json::Value),
}

/// One table row: values positionally aligned to the table's columns.
pub type Row = Vec<Value>;

impl Value {
    /// Decode a JSON cell for a column of the given kind.
    ///
    /// JSON `null` is `Null` for every kind. Anything else must match the
    /// kind's wire representation.
    pub fn decode(
        kind: DataKind,
        column: &str,
        json: &serde_json::Value,
    ) -> Result<Self, ProtocolError> {
        use serde_json::Value as Json;

        let invalid = || ProtocolError::InvalidValue {
            column: column.to_string(),
            kind: kind.type_name(),
            value: json.to_string(),
        };

        if json.is_null() {
            return Ok(Value::Null);
        }

        let value = match kind {
            DataKind::Bool => match json {
                Json::Bool(b) => Value::Bool(*b),
                Json::Number(n) => match n.as_i64() {
                    Some(0) => Value::Bool(false),
                    Some(1) => Value::Bool(true),
                    _ => return Err(invalid()),
                },
                _ => return Err(invalid()),
            },
            DataKind::Int => {
                let v = json.as_i64().ok_or_else(invalid)?;
                i32::try_from(v).map_err(|_| invalid())?;
                Value::Int(v)
            }
            DataKind::Long => Value::Int(json.as_i64().ok_or_else(invalid)?),
            DataKind::Real => match json {
                Json::Number(n) => Value::Real(n.as_f64().ok_or_else(invalid)?),
                Json::String(s) => match s.as_str() {
                    "NaN" => Value::Real(f64::NAN),
                    "Infinity" => Value::Real(f64::INFINITY),
                    "-Infinity" => Value::Real(f64::NEG_INFINITY),
                    _ => return Err(invalid()),
                },
                _ => return Err(invalid()),
            },
            DataKind::Decimal => match json {
                Json::String(s) => Value::Decimal(CompactString::new(s)),
                Json::Number(n) => Value::Decimal(CompactString::new(n.to_string())),
                _ => return Err(invalid()),
            },
            DataKind::String => match json {
                Json::String(s) => Value::String(CompactString::new(s)),
                _ => return Err(invalid()),
            },
            DataKind::DateTime => {
                let s = json.as_str().ok_or_else(invalid)?;
                Value::DateTime(parse_datetime(s).ok_or_else(invalid)?)
            }
            DataKind::TimeSpan => {
                let s = json.as_str().ok_or_else(invalid)?;
                Value::TimeSpan(parse_timespan(s).ok_or_else(invalid)?)
            }
            DataKind::Guid => {
                let s = json.as_str().ok_or_else(invalid)?;
                Value::Guid(Uuid::parse_str(s).map_err(|_| invalid())?)
            }
            DataKind::Dynamic => Value::Dynamic(json.clone()),
        };
        Ok(value)
    }

    /// Decode a JSON cell without a known column type.
    pub fn from_json(json: &serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Real).unwrap_or(Value::Null),
            },
            Json::String(s) => Value::String(CompactString::new(s)),
            other => Value::Dynamic(other.clone()),
        }
    }

    /// Convert to JSON for output.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Real(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or_else(|| Json::String(format_real(*f))),
            Value::Decimal(s) | Value::String(s) => Json::String(s.to_string()),
            Value::DateTime(_) | Value::TimeSpan(_) | Value::Guid(_) => {
                Json::String(self.to_string())
            }
            Value::Dynamic(v) => v.clone(),
        }
    }

    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64. Integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as str reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Decimal(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to get as a timestamp.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{}", format_real(*v)),
            Value::Decimal(s) | Value::String(s) => write!(f, "{s}"),
            Value::DateTime(dt) => {
                write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::TimeSpan(d) => write!(f, "{}", format_timespan(*d)),
            Value::Guid(g) => write!(f, "{g}"),
            Value::Dynamic(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(CompactString::new(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(CompactString::from(v))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

fn format_real(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "Infinity".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        v.to_string()
    }
}

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a timespan of the form `[-][d.]hh:mm:ss[.fffffff]`.
fn parse_timespan(s: &str) -> Option<Duration> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let mut parts = body.split(':');
    let (head, minutes, seconds) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let (days, hours) = match head.split_once('.') {
        Some((d, h)) => (d.parse::<i64>().ok()?, h.parse::<i64>().ok()?),
        None => (0, head.parse::<i64>().ok()?),
    };
    let minutes = minutes.parse::<i64>().ok()?;

    let (secs, nanos) = match seconds.split_once('.') {
        Some((whole, frac)) => {
            if frac.is_empty() || frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let scale = 10i64.pow(9 - frac.len() as u32);
            (whole.parse::<i64>().ok()?, frac.parse::<i64>().ok()? * scale)
        }
        None => (seconds.parse::<i64>().ok()?, 0),
    };

    if days < 0
        || !(0..24).contains(&hours)
        || !(0..60).contains(&minutes)
        || !(0..60).contains(&secs)
    {
        return None;
    }

    let total = Duration::try_days(days)?
        .checked_add(&Duration::try_hours(hours)?)?
        .checked_add(&Duration::try_minutes(minutes)?)?
        .checked_add(&Duration::try_seconds(secs)?)?
        .checked_add(&Duration::nanoseconds(nanos))?;
    Some(if negative { -total } else { total })
}

fn format_timespan(d: Duration) -> String {
    let negative = d < Duration::zero();
    let d = if negative { -d } else { d };

    let days = d.num_days();
    let hours = d.num_hours() % 24;
    let minutes = d.num_minutes() % 60;
    let seconds = d.num_seconds() % 60;
    let ticks = (d - Duration::seconds(d.num_seconds()))
        .num_nanoseconds()
        .unwrap_or(0)
        / 100;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if days > 0 {
        out.push_str(&format!("{days}."));
    }
    out.push_str(&format!("{hours:02}:{minutes:02}:{seconds:02}"));
    if ticks > 0 {
        out.push_str(&format!(".{ticks:07}"));
    }
    out
}
