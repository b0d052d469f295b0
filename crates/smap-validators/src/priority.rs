//! Priority of a URL relative to other URLs of the site.

use std::fmt;

use serde::Deserialize;

use crate::ValidationError;

const EXPECTED: &str = "priority should be a number between 0.0 (exclusive) and 1.0";

/// Check that `value` lies in `(0.0, 1.0]`.
pub fn validate_priority(value: f64, field: &str) -> Result<f64, ValidationError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(ValidationError::new(field, EXPECTED, value.to_string()))
    }
}

/// A validated priority, rounded to one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Deserialize)]
#[serde(try_from = "f64")]
pub struct Priority(f64);

impl Priority {
    /// Validate and round `value`, reporting failures against `field`.
    ///
    /// Values that round to `0.0` (e.g. `0.04`) are rejected.
    pub fn parse(value: f64, field: &str) -> Result<Self, ValidationError> {
        let value = validate_priority(value, field)?;
        let rounded = (value * 10.0).round() / 10.0;
        if rounded <= 0.0 {
            return Err(ValidationError::new(
                field,
                "priority rounds to 0.0 at one decimal place",
                value.to_string(),
            ));
        }
        Ok(Self(rounded))
    }

    /// The rounded value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Priority {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::parse(value, "priority")
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_range_bounds() {
        assert_eq!(validate_priority(1.0, "priority").unwrap(), 1.0);
        assert_eq!(validate_priority(0.01, "priority").unwrap(), 0.01);
    }

    #[test]
    fn test_rejects_out_of_range() {
        for value in [5.0, -1.0, 0.0, 1.01, f64::NAN, f64::INFINITY] {
            let err = validate_priority(value, "priority").unwrap_err();
            assert_eq!(err.field, "priority");
        }
    }

    #[test]
    fn test_rounds_to_one_decimal() {
        assert_eq!(Priority::parse(0.733, "priority").unwrap().value(), 0.7);
        assert_eq!(Priority::parse(0.91, "priority").unwrap().value(), 0.9);
        assert_eq!(Priority::parse(0.96, "priority").unwrap().value(), 1.0);
        assert_eq!(Priority::parse(1.0, "priority").unwrap().value(), 1.0);
    }

    #[test]
    fn test_rejects_value_rounding_to_zero() {
        let err = Priority::parse(0.04, "content.priority").unwrap_err();
        assert_eq!(err.field, "content.priority");
        assert!(err.expected.contains("rounds to 0.0"));
    }

    #[test]
    fn test_display_is_fixed_point() {
        assert_eq!(Priority::parse(1.0, "priority").unwrap().to_string(), "1.0");
        assert_eq!(Priority::parse(0.5, "priority").unwrap().to_string(), "0.5");
    }

    #[test]
    fn test_deserialize_rejects_numeric_string() {
        #[derive(Debug, Deserialize)]
        struct Holder {
            priority: Priority,
        }

        let ok: Holder = serde_json::from_str(r#"{"priority": 1}"#).unwrap();
        assert_eq!(ok.priority.value(), 1.0);
        assert!(serde_json::from_str::<Holder>(r#"{"priority": "0.5"}"#).is_err());
        assert!(serde_json::from_str::<Holder>(r#"{"priority": 5}"#).is_err());
    }
}
