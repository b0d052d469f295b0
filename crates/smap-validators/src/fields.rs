//! Location, last-modified and time zone validators.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use regex::Regex;
use url::{ParseError, Url};

use crate::ValidationError;

/// W3C datetime subset accepted by the sitemap protocol.
static LASTMOD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})(?:T(\d{2}):(\d{2}):(\d{2})(Z|[+-](\d{2}):(\d{2}))?)?$",
    )
    .expect("invalid lastmod regex")
});

const LOCATION_EXPECTED: &str = "a URL with a non-empty path is required";
const LASTMOD_EXPECTED: &str =
    "last modified should be of the format YYYY-MM-DD[THH:MM:SS[±HH:MM]]";
const TIMEZONE_EXPECTED: &str = "time zone should be a name from the IANA time zone database";

/// Base for resolving relative references during validation.
static REFERENCE_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://localhost/").expect("invalid reference base"));

/// Check that `value` is a syntactically valid URL with a non-empty path.
///
/// Accepts both absolute URLs (`https://site.com/page`) and relative
/// references (`/page?arg=1`). A bare origin such as `https://site.com` has an
/// empty path and is rejected, as is a query-only reference (`?arg=1`).
pub fn validate_location<'a>(value: &'a str, field: &str) -> Result<&'a str, ValidationError> {
    let invalid = || ValidationError::new(field, LOCATION_EXPECTED, value);

    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid());
    }

    let has_path = match Url::parse(value) {
        Ok(url) if url.cannot_be_a_base() => !url.path().is_empty(),
        // The parser normalizes an empty authority path to "/", so look at
        // the text after the authority.
        Ok(_) => value
            .split_once("://")
            .is_some_and(|(_, rest)| before_query(rest).contains('/')),
        Err(ParseError::RelativeUrlWithoutBase) => {
            // A colon in the first segment would make it a scheme.
            let first = value.split(['/', '?', '#']).next().unwrap_or_default();
            if first.contains(':') {
                return Err(invalid());
            }
            REFERENCE_BASE.join(value).map_err(|_| invalid())?;
            !before_query(value).is_empty()
        }
        Err(_) => false,
    };

    if has_path { Ok(value) } else { Err(invalid()) }
}

/// Text before any query or fragment.
fn before_query(value: &str) -> &str {
    value.split(['?', '#']).next().unwrap_or_default()
}

/// Check that `value` is `YYYY-MM-DD[THH:MM:SS[±HH:MM]]` and names a real instant.
///
/// Time and offset are optional. `Z` is accepted as an alias of `+00:00`.
/// Impossible dates (month 13, February 30th) are rejected.
pub fn validate_lastmod<'a>(value: &'a str, field: &str) -> Result<&'a str, ValidationError> {
    let invalid = || ValidationError::new(field, LASTMOD_EXPECTED, value);

    let caps = LASTMOD_PATTERN.captures(value).ok_or_else(invalid)?;
    let number = |idx: usize| -> Option<u32> { caps.get(idx)?.as_str().parse().ok() };

    let year: i32 = caps[1].parse().map_err(|_| invalid())?;
    let (month, day) = (number(2).ok_or_else(invalid)?, number(3).ok_or_else(invalid)?);
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;

    if let (Some(hour), Some(minute), Some(second)) = (number(4), number(5), number(6)) {
        NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(invalid)?;
    }

    if let (Some(offset_hours), Some(offset_minutes)) = (number(8), number(9))
        && (offset_hours > 23 || offset_minutes > 59)
    {
        return Err(invalid());
    }

    Ok(value)
}

/// Resolve `value` against the IANA time zone database.
pub fn validate_timezone(value: &str, field: &str) -> Result<Tz, ValidationError> {
    value
        .parse::<Tz>()
        .map_err(|_| ValidationError::new(field, TIMEZONE_EXPECTED, value))
}
