//! # Lenient Field Decoding
//!
//! Field-level deserializers for backend records that never fail on a type
//! mismatch. A field that cannot be read becomes `None`, and the normalizer
//! substitutes its documented default.
//!
//! ## Why Not Plain `Deserialize`?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Backend sends:  { "stock_actual": "12", "estado": "activo", ... }     │
//! │                  { "stock_actual": 12,   "estado": true,     ... }     │
//! │                  { "stock_actual": null                       ... }     │
//! │                                                                         │
//! │  A strict `u32` field rejects the WHOLE record on the first shape.     │
//! │  Every wire field goes through `Value` first, then gets coerced:       │
//! │                                                                         │
//! │    serde_json::Value ──► coerce ──► Option<T>   (never an error)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// =============================================================================
// Status Flag
// =============================================================================

/// A status as the backend sends it: a boolean or a two-valued text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFlag {
    Flag(bool),
    Text(String),
}

impl StatusFlag {
    /// Resolves the flag to `active`.
    ///
    /// Unknown texts count as active; only an explicit negative word
    /// deactivates a record.
    pub fn is_active(&self) -> bool {
        match self {
            StatusFlag::Flag(b) => *b,
            StatusFlag::Text(text) => !matches!(
                text.trim().to_lowercase().as_str(),
                "inactivo" | "inactive" | "false" | "0" | "no" | "deshabilitado"
            ),
        }
    }

    /// Encodes `active` the way text-status resources expect it.
    pub fn text(active: bool) -> Self {
        StatusFlag::Text(if active { "activo" } else { "inactivo" }.to_string())
    }
}

impl Serialize for StatusFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StatusFlag::Flag(b) => serializer.serialize_bool(*b),
            StatusFlag::Text(t) => serializer.serialize_str(t),
        }
    }
}

/// Missing status means active.
pub fn is_active(flag: Option<&StatusFlag>) -> bool {
    flag.map(StatusFlag::is_active).unwrap_or(true)
}

// =============================================================================
// Scalar Coercion
// =============================================================================

/// Coerces a JSON value to a number.
///
/// Numbers pass through, numeric strings are parsed after trimming, anything
/// else (and non-finite results) is `None`.
pub fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Coerces a JSON scalar to text.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parses a backend date.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (optionally with fraction) and
/// bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Clamps a coerced number to a non-negative integer count.
pub fn count(value: Option<f64>) -> u32 {
    match value {
        Some(n) if n > 0.0 => n.round().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

// =============================================================================
// Field Deserializers (use with `deserialize_with`)
// =============================================================================

/// Any scalar as text; null, arrays and objects become `None`.
pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(text(&Value::deserialize(d)?))
}

/// Numbers and numeric strings; everything else is `None`.
pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(number(&Value::deserialize(d)?))
}

/// Booleans, status texts, and `0`/`1`.
pub fn opt_status<'de, D: Deserializer<'de>>(d: D) -> Result<Option<StatusFlag>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => Some(StatusFlag::Flag(b)),
        Value::String(s) => Some(StatusFlag::Text(s)),
        Value::Number(n) => Some(StatusFlag::Flag(n.as_f64().map(|v| v != 0.0).unwrap_or(true))),
        _ => None,
    })
}

/// An array of records; elements that are not records are skipped.
pub fn opt_vec<'de, D, T>(d: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

/// A nested record; anything that is not an object is `None`.
pub fn opt_record<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

// =============================================================================
// Field Serializers
// =============================================================================

/// Writes an id as a JSON number when it is numeric, as text otherwise.
pub fn ser_id<S: Serializer>(id: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match id.as_deref().map(str::trim) {
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) => serializer.serialize_i64(n),
            Err(_) => serializer.serialize_str(raw),
        },
        None => serializer.serialize_none(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "opt_number")]
        n: Option<f64>,
        #[serde(default, deserialize_with = "opt_string")]
        s: Option<String>,
        #[serde(default, deserialize_with = "opt_status")]
        st: Option<StatusFlag>,
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(number(&json!(12)), Some(12.0));
        assert_eq!(number(&json!(" 12.5 ")), Some(12.5));
        assert_eq!(number(&json!("doce")), None);
        assert_eq!(number(&json!(null)), None);
        assert_eq!(number(&json!([1])), None);
    }

    #[test]
    fn test_fields_never_fail() {
        let probe: Probe = serde_json::from_value(json!({
            "n": {"nested": true},
            "s": [1, 2],
            "st": null
        }))
        .unwrap();
        assert_eq!(probe.n, None);
        assert_eq!(probe.s, None);
        assert_eq!(probe.st, None);

        let probe: Probe = serde_json::from_value(json!({ "n": "7", "s": 42, "st": 0 })).unwrap();
        assert_eq!(probe.n, Some(7.0));
        assert_eq!(probe.s.as_deref(), Some("42"));
        assert_eq!(probe.st, Some(StatusFlag::Flag(false)));
    }

    #[test]
    fn test_status_flag() {
        assert!(StatusFlag::Flag(true).is_active());
        assert!(!StatusFlag::Flag(false).is_active());
        assert!(StatusFlag::Text("Activo".into()).is_active());
        assert!(!StatusFlag::Text("INACTIVO".into()).is_active());
        assert!(StatusFlag::Text("algo".into()).is_active());
        assert!(is_active(None));
    }

    #[test]
    fn test_parse_date_formats() {
        let rfc = parse_date("2024-03-05T10:30:00Z").unwrap();
        let spaced = parse_date("2024-03-05 10:30:00").unwrap();
        assert_eq!(rfc, spaced);

        let day = parse_date("2024-03-05").unwrap();
        assert_eq!(day.to_rfc3339(), "2024-03-05T00:00:00+00:00");

        assert!(parse_date("05/03/2024").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_count_clamps() {
        assert_eq!(count(Some(-3.0)), 0);
        assert_eq!(count(Some(4.6)), 5);
        assert_eq!(count(None), 0);
    }
}
