//! Field validators for sitemap entries.
//!
//! Each validator takes one raw value and the name of the field it belongs
//! to, and returns the value unchanged (or its typed form) when it satisfies
//! the [sitemaps.org protocol](https://www.sitemaps.org/protocol.html).
//! Failures are reported as [`ValidationError`] naming the field and the
//! expected shape.
//!
//! - [`validate_location`]: URL path component (`<loc>`)
//! - [`validate_lastmod`]: W3C datetime `YYYY-MM-DD[THH:MM:SS[±HH:MM]]` (`<lastmod>`)
//! - [`ChangeFreq`]: closed set of change frequency labels (`<changefreq>`)
//! - [`Priority`]: number in `(0.0, 1.0]`, rounded to one decimal (`<priority>`)
//! - [`validate_timezone`]: IANA time zone name
//!
//! [`get_validated`] validates any subset of the entry fields at once.
//!
//! # Example
//!
//! ```
//! use smap_validators::{ChangeFreq, RawFields, get_validated};
//!
//! let fields = get_validated(RawFields {
//!     loc: Some("/blog"),
//!     changefreq: Some("Daily"),
//!     priority: Some(0.75),
//!     ..RawFields::default()
//! })?;
//! assert_eq!(fields.changefreq, Some(ChangeFreq::Daily));
//! assert_eq!(fields.priority.map(|p| p.value()), Some(0.8));
//! # Ok::<(), smap_validators::ValidationError>(())
//! ```

mod change_freq;
mod fields;
mod priority;

pub use change_freq::ChangeFreq;
pub use fields::{validate_lastmod, validate_location, validate_timezone};
pub use priority::{Priority, validate_priority};

/// A value that does not conform to the sitemap format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field} {value:?}: {expected}")]
pub struct ValidationError {
    /// Name of the offending field (e.g., "priority", "sitemap.timezone").
    pub field: String,
    /// Human-readable description of the accepted shape.
    pub expected: String,
    /// The rejected value, as text.
    pub value: String,
}

impl ValidationError {
    /// Create a validation error for `field`.
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            value: value.into(),
        }
    }
}

/// Unvalidated entry fields. Absent fields are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawFields<'a> {
    pub loc: Option<&'a str>,
    pub lastmod: Option<&'a str>,
    pub changefreq: Option<&'a str>,
    pub priority: Option<f64>,
}

/// Entry fields that passed validation.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidatedFields {
    pub loc: Option<String>,
    pub lastmod: Option<String>,
    pub changefreq: Option<ChangeFreq>,
    pub priority: Option<Priority>,
}

impl ValidatedFields {
    /// True if no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.loc.is_none()
            && self.lastmod.is_none()
            && self.changefreq.is_none()
            && self.priority.is_none()
    }
}

/// Validate the supplied subset of `loc`, `lastmod`, `changefreq` and `priority`.
///
/// An empty call is legal and returns empty [`ValidatedFields`].
pub fn get_validated(raw: RawFields<'_>) -> Result<ValidatedFields, ValidationError> {
    let mut validated = ValidatedFields::default();

    if let Some(loc) = raw.loc {
        validated.loc = Some(validate_location(loc, "loc")?.to_owned());
    }
    if let Some(lastmod) = raw.lastmod {
        validated.lastmod = Some(validate_lastmod(lastmod, "lastmod")?.to_owned());
    }
    if let Some(changefreq) = raw.changefreq {
        validated.changefreq = Some(ChangeFreq::parse(changefreq, "changefreq")?);
    }
    if let Some(priority) = raw.priority {
        validated.priority = Some(Priority::parse(priority, "priority")?);
    }

    Ok(validated)
}
