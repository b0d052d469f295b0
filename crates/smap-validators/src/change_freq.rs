//! Change frequency labels.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::ValidationError;

/// How often a page is likely to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    /// All labels in protocol order.
    pub const ALL: [Self; 7] = [
        Self::Always,
        Self::Hourly,
        Self::Daily,
        Self::Weekly,
        Self::Monthly,
        Self::Yearly,
        Self::Never,
    ];

    /// Protocol label (lowercase).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }

    /// Parse a label case-insensitively, reporting failures against `field`.
    pub fn parse(value: &str, field: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|freq| freq.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| ValidationError::new(field, expected(), value))
    }
}

fn expected() -> String {
    let labels: Vec<&str> = ChangeFreq::ALL.iter().map(|f| f.as_str()).collect();
    format!("change frequency should be one of: {}", labels.join(", "))
}

impl FromStr for ChangeFreq {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, "changefreq")
    }
}

impl TryFrom<String> for ChangeFreq {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
