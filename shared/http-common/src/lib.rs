//! Shared HTTP utilities for the exercise tracker workspace.
//!
//! Framework-agnostic helpers used by the api-server: date rendering for
//! response bodies, JSON number shaping, and lenient request field decoding
//! that works for both form-encoded and JSON bodies.

use chrono::NaiveDate;

// ============================================================================
// Date Rendering
// ============================================================================

/// Render a date in the short human form used by the add-exercise response,
/// e.g. `Mon Jan 06 2020` (weekday, month, day, year; no comma).
pub fn short_date(date: NaiveDate) -> String {
    date.format("%a %b %d %Y").to_string()
}

/// Render a date as `YYYY-MM-DD`.
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ============================================================================
// JSON Helpers
// ============================================================================

/// Shape a numeric value for a JSON body: integral values become JSON
/// integers (`30`, not `30.0`), everything else stays a float.
pub fn json_number(n: f64) -> serde_json::Value {
    // 2^53: beyond this f64 no longer represents every integer exactly.
    const MAX_SAFE: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

// ============================================================================
// Lenient Field Decoding
// ============================================================================

pub mod lenient {
    //! Serde helpers for request fields that may arrive as strings (forms) or
    //! as JSON scalars.

    use std::fmt;

    use serde::de::{self, Deserializer, Visitor};

    struct ScalarVisitor;

    impl<'de> Visitor<'de> for ScalarVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string, number, boolean or null")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(self)
        }
    }

    /// Decode an optional scalar into its string form. `null` becomes `None`.
    ///
    /// Use with `#[serde(default, deserialize_with = "lenient::opt_scalar")]`.
    pub fn opt_scalar<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        d.deserialize_any(ScalarVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "lenient::opt_scalar")]
        duration: Option<String>,
        #[serde(default, deserialize_with = "lenient::opt_scalar")]
        date: Option<String>,
    }

    #[test]
    fn test_short_date() {
        let d = NaiveDate::from_ymd_opt(2020, 1, 6).unwrap();
        assert_eq!(short_date(d), "Mon Jan 06 2020");
        let d = NaiveDate::from_ymd_opt(2019, 12, 25).unwrap();
        assert_eq!(short_date(d), "Wed Dec 25 2019");
    }

    #[test]
    fn test_iso_date() {
        let d = NaiveDate::from_ymd_opt(2020, 3, 9).unwrap();
        assert_eq!(iso_date(d), "2020-03-09");
    }

    #[test]
    fn test_json_number() {
        assert_eq!(json_number(30.0), serde_json::json!(30));
        assert_eq!(json_number(-2.0), serde_json::json!(-2));
        assert_eq!(json_number(12.5), serde_json::json!(12.5));
        assert_eq!(json_number(f64::NAN), serde_json::Value::Null);
    }

    #[test]
    fn test_lenient_json_scalars() {
        let b: Body = serde_json::from_str(r#"{"duration": 30, "date": null}"#).unwrap();
        assert_eq!(b.duration.as_deref(), Some("30"));
        assert_eq!(b.date, None);

        let b: Body = serde_json::from_str(r#"{"duration": "45", "date": "2020-01-01"}"#).unwrap();
        assert_eq!(b.duration.as_deref(), Some("45"));
        assert_eq!(b.date.as_deref(), Some("2020-01-01"));

        let b: Body = serde_json::from_str(r#"{"duration": 7.5}"#).unwrap();
        assert_eq!(b.duration.as_deref(), Some("7.5"));

        let b: Body = serde_json::from_str("{}").unwrap();
        assert_eq!(b.duration, None);
    }

    #[test]
    fn test_lenient_form_fields() {
        let b: Body = serde_urlencoded::from_str("duration=30&date=").unwrap();
        assert_eq!(b.duration.as_deref(), Some("30"));
        assert_eq!(b.date.as_deref(), Some(""));

        let b: Body = serde_urlencoded::from_str("").unwrap();
        assert_eq!(b.duration, None);
    }

    #[test]
    fn test_lenient_rejects_structures() {
        assert!(serde_json::from_str::<Body>(r#"{"duration": [1]}"#).is_err());
    }
}
