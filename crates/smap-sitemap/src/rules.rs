//! Rule registry binding route prefixes to data models.

use std::collections::HashMap;
use std::sync::Arc;

use smap_source::Model;
use smap_validators::{ChangeFreq, Priority, validate_location};

use crate::error::SitemapError;

/// Binding of a route prefix to a model and the attributes used to build
/// concrete URLs from its rows.
#[derive(Debug, Clone)]
pub struct Rule {
    pub model: Arc<dyn Model>,
    /// Attribute providing the path segment.
    pub loc_from: String,
    /// Attribute providing the last-modified timestamp.
    pub lastmod_from: Option<String>,
    /// Overrides the content default when set.
    pub changefreq: Option<ChangeFreq>,
    /// Overrides the content default when set.
    pub priority: Option<Priority>,
}

/// Append a trailing `/` unless present.
pub(crate) fn normalize_prefix(path: &str) -> String {
    if path.ends_with('/') {
        path.to_owned()
    } else {
        format!("{path}/")
    }
}

/// Registered rules keyed by normalized prefix.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: HashMap<String, Rule>,
}

impl RuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule for `path`, replacing any rule at the same prefix.
    ///
    /// `priority` is validated and rounded. The model must have `loc_from`
    /// and, if given, `lastmod_from`.
    pub fn add_rule(
        &mut self,
        path: &str,
        model: Arc<dyn Model>,
        loc_from: &str,
        lastmod_from: Option<&str>,
        changefreq: Option<ChangeFreq>,
        priority: Option<f64>,
    ) -> Result<(), SitemapError> {
        let prefix = normalize_prefix(path);
        validate_location(&prefix, "path")?;
        let priority = priority
            .map(|value| Priority::parse(value, "priority"))
            .transpose()?;

        let missing = !model.has_attribute(loc_from)
            || lastmod_from.is_some_and(|attr| !model.has_attribute(attr));
        if missing {
            return Err(SitemapError::attribute(model.name(), loc_from, lastmod_from));
        }

        let rule = Rule {
            model,
            loc_from: loc_from.to_owned(),
            lastmod_from: lastmod_from.map(str::to_owned),
            changefreq,
            priority,
        };

        if let Some(previous) = self.rules.insert(prefix.clone(), rule) {
            tracing::warn!(
                prefix = %prefix,
                previous_model = previous.model.name(),
                "Rule replaced an existing rule"
            );
        } else {
            tracing::debug!(prefix = %prefix, "Rule registered");
        }
        Ok(())
    }

    /// Rule registered for a normalized prefix.
    #[must_use]
    pub fn get(&self, prefix: &str) -> Option<&Rule> {
        self.rules.get(prefix)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use smap_source::MockModel;

    use super::*;

    fn posts() -> Arc<dyn Model> {
        Arc::new(MockModel::new("Post").with_attributes(["slug", "updated"]))
    }

    #[test]
    fn test_normalize_prefix_is_idempotent() {
        assert_eq!(normalize_prefix("/blog"), "/blog/");
        assert_eq!(normalize_prefix("/blog/"), "/blog/");
        assert_eq!(normalize_prefix(""), "/");
        assert_eq!(normalize_prefix("/"), "/");
    }

    #[test]
    fn test_add_rule_keyed_by_normalized_path() {
        let mut registry = RuleRegistry::new();
        registry
            .add_rule("/app", posts(), "slug", Some("updated"), None, Some(0.733))
            .unwrap();

        let rule = registry.get("/app/").unwrap();
        assert_eq!(rule.model.name(), "Post");
        assert_eq!(rule.loc_from, "slug");
        assert_eq!(rule.lastmod_from.as_deref(), Some("updated"));
        assert_eq!(rule.priority.map(Priority::value), Some(0.7));
        assert!(registry.get("/app").is_none());
    }

    #[test]
    fn test_add_rule_accepts_valid_priorities() {
        for priority in [0.5, 0.733, 1.0] {
            let mut registry = RuleRegistry::new();
            registry
                .add_rule("/app", posts(), "slug", None, None, Some(priority))
                .unwrap();
        }
    }

    #[test]
    fn test_add_rule_rejects_out_of_range_priority() {
        for priority in [5.0, -1.0, 0.0, 1.5, f64::NAN] {
            let mut registry = RuleRegistry::new();
            let err = registry
                .add_rule("/app", posts(), "slug", None, None, Some(priority))
                .unwrap_err();
            assert!(err.is_validation());
            assert!(matches!(err, SitemapError::Validation(ref e) if e.field == "priority"));
            assert!(registry.is_empty());
        }
    }

    #[test]
    fn test_add_rule_rejects_missing_attributes() {
        let mut registry = RuleRegistry::new();

        let err = registry
            .add_rule("/app", posts(), "title", None, None, None)
            .unwrap_err();
        assert!(matches!(err, SitemapError::Attribute { ref loc_from, .. } if loc_from == "title"));

        let err = registry
            .add_rule("/app", posts(), "slug", Some("created"), None, None)
            .unwrap_err();
        assert!(err.to_string().contains("\"Post\""));
        assert!(err.to_string().contains("created"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_add_rule_replaces_existing() {
        let mut registry = RuleRegistry::new();
        registry
            .add_rule("/blog", posts(), "slug", None, Some(ChangeFreq::Daily), None)
            .unwrap();
        let tags: Arc<dyn Model> = Arc::new(MockModel::new("Tag").with_attributes(["name"]));
        registry
            .add_rule("/blog/", tags, "name", None, None, None)
            .unwrap();

        assert_eq!(registry.len(), 1);
        let rule = registry.get("/blog/").unwrap();
        assert_eq!(rule.model.name(), "Tag");
        assert_eq!(rule.changefreq, None);
    }
}
