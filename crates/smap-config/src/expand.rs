//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the configuration key for error reporting.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|err| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", err.var_name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_is_unchanged() {
        assert_eq!(
            expand_env("https://example.com", "sitemap.base_url").unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn test_default_used_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("SMAP_EXPAND_UNSET");
        }
        assert_eq!(
            expand_env("${SMAP_EXPAND_UNSET:-https://fallback.org}", "sitemap.base_url").unwrap(),
            "https://fallback.org"
        );
    }

    #[test]
    fn test_missing_var_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("SMAP_EXPAND_MISSING");
        }
        let err = expand_env("${SMAP_EXPAND_MISSING}", "sitemap.base_url").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("SMAP_EXPAND_MISSING"));
        assert!(msg.contains("sitemap.base_url"));
    }
}
