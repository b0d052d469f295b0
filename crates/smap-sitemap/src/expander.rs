//! Route template expansion into sitemap items.
//!
//! A route template is static (`/about`) or dynamic (`/blog/<slug>`). Static
//! templates become one item each. Dynamic templates are split on their first
//! placeholder into a prefix and suffix; the rule registered for the prefix
//! supplies a model whose rows fill in the placeholder.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use smap_config::{CategoryDefaults, Defaults};
use smap_source::{Orm, Value};
use smap_validators::{ValidationError, validate_lastmod};
use url::Url;

use crate::error::SitemapError;
use crate::item::Item;
use crate::rules::{Rule, RuleRegistry};

/// Route parameter placeholder, optionally typed (`<slug>`, `<int:id>`).
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(\w+:)?\w+>").expect("invalid placeholder regex"));

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const AWARE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// A route template split on its first placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTemplate<'a> {
    /// No placeholder.
    Static(&'a str),
    /// Text before and after the first placeholder.
    Dynamic { prefix: &'a str, suffix: &'a str },
}

impl<'a> RouteTemplate<'a> {
    #[must_use]
    pub fn parse(route: &'a str) -> Self {
        match PLACEHOLDER.find(route) {
            Some(m) => Self::Dynamic {
                prefix: &route[..m.start()],
                suffix: &route[m.end()..],
            },
            None => Self::Static(route),
        }
    }
}

/// True if `route` contains a parameter placeholder.
#[must_use]
pub fn is_dynamic(route: &str) -> bool {
    PLACEHOLDER.is_match(route)
}

/// Format `at` for `<lastmod>`, in `tz` if given.
pub(crate) fn format_timestamp(at: DateTime<Utc>, tz: Option<Tz>) -> String {
    match tz {
        Some(tz) => at.with_timezone(&tz).format(AWARE_FORMAT).to_string(),
        None => at.naive_utc().format(NAIVE_FORMAT).to_string(),
    }
}

/// Join `path` onto the base URL.
pub(crate) fn join_location(base: &Url, path: &str) -> Result<String, ValidationError> {
    base.join(path)
        .map(String::from)
        .map_err(|err| ValidationError::new("loc", err.to_string(), path))
}

/// True if `segment` contains a `.` or `..` component, which URL joining
/// would resolve against the rule prefix. Percent-encoded dots count too.
fn has_dot_segment(segment: &str) -> bool {
    segment.split(['/', '\\']).any(|part| {
        let part = part.to_ascii_lowercase().replace("%2e", ".");
        part == "." || part == ".."
    })
}

/// Expands filtered route templates into items.
#[derive(Debug)]
pub struct Expander<'a> {
    pub base: &'a Url,
    pub rules: &'a RuleRegistry,
    pub orm: &'a Orm,
    pub defaults: &'a Defaults,
    pub tz: Option<Tz>,
    /// Build start, used as `<lastmod>` of static routes.
    pub started: DateTime<Utc>,
}

impl Expander<'_> {
    /// Expand every route. Any failure aborts the whole expansion.
    pub fn expand<S: AsRef<str>>(&self, routes: &[S]) -> Result<Vec<Item>, SitemapError> {
        let mut items = Vec::new();
        for route in routes {
            let route = route.as_ref();
            tracing::debug!(route, "Preparing items");
            match RouteTemplate::parse(route) {
                RouteTemplate::Static(path) => items.push(self.expand_static(path)?),
                RouteTemplate::Dynamic { prefix, suffix } => {
                    let expanded = self.expand_dynamic(route, prefix, suffix)?;
                    tracing::debug!(route, count = expanded.len(), "Included items");
                    items.extend(expanded);
                }
            }
        }
        Ok(items)
    }

    /// Item for the site root.
    pub fn index_item(&self) -> Result<Item, SitemapError> {
        self.categorized(join_location(self.base, "/")?, self.defaults.index)
    }

    /// Item for a template without placeholders.
    pub fn expand_static(&self, path: &str) -> Result<Item, SitemapError> {
        self.categorized(join_location(self.base, path)?, self.defaults.alter)
    }

    fn categorized(&self, loc: String, defaults: CategoryDefaults) -> Result<Item, SitemapError> {
        Ok(Item::new(loc)?
            .with_lastmod(format_timestamp(self.started, self.tz))?
            .with_changefreq(defaults.changefreq)
            .with_priority(defaults.priority))
    }

    /// Items for a template with a placeholder, one per model row.
    pub fn expand_dynamic(
        &self,
        route: &str,
        prefix: &str,
        suffix: &str,
    ) -> Result<Vec<Item>, SitemapError> {
        let key = crate::rules::normalize_prefix(prefix);
        let rule = self
            .rules
            .get(&key)
            .ok_or_else(|| SitemapError::UnmatchedRoute {
                route: route.to_owned(),
                prefix: key.clone(),
            })?;

        let changefreq = rule.changefreq.or(self.defaults.content.changefreq);
        let priority = rule.priority.or(self.defaults.content.priority);

        self.orm
            .fetch_all(rule.model.as_ref())?
            .iter()
            .map(|row| -> Result<Item, SitemapError> {
                let missing = || {
                    SitemapError::attribute(
                        rule.model.name(),
                        &rule.loc_from,
                        rule.lastmod_from.as_deref(),
                    )
                };

                let segment = row
                    .get(&rule.loc_from)
                    .and_then(Value::to_segment)
                    .ok_or_else(missing)?;
                let segment = segment.trim_matches('/');
                if has_dot_segment(segment) {
                    return Err(ValidationError::new(
                        format!("{}.{}", rule.model.name(), rule.loc_from),
                        "a value without `.` or `..` path segments is required",
                        segment,
                    )
                    .into());
                }
                let path = format!("{key}{segment}{suffix}");
                let mut item = Item::new(join_location(self.base, &path)?)?
                    .with_changefreq(changefreq)
                    .with_priority(priority);

                if let Some(attr) = &rule.lastmod_from {
                    let value = row.get(attr).ok_or_else(missing)?;
                    if let Some(lastmod) = self.lastmod_from_value(rule, value)? {
                        item = item.with_lastmod(lastmod)?;
                    }
                }
                Ok(item)
            })
            .collect()
    }

    /// Render a row value as `<lastmod>` text.
    fn lastmod_from_value(
        &self,
        rule: &Rule,
        value: &Value,
    ) -> Result<Option<String>, SitemapError> {
        let formatted = match value {
            Value::Null => return Ok(None),
            Value::Date(date) => date.format("%Y-%m-%d").to_string(),
            Value::DateTime(naive) => self.localize(*naive),
            Value::DateTimeTz(aware) => match self.tz {
                Some(tz) => aware.with_timezone(&tz).format(AWARE_FORMAT).to_string(),
                None => aware.format(AWARE_FORMAT).to_string(),
            },
            Value::Text(text) => validate_lastmod(text, "lastmod")?.to_owned(),
            other => {
                let shown = other.to_segment().unwrap_or_default();
                let field = format!(
                    "{}.{}",
                    rule.model.name(),
                    rule.lastmod_from.as_deref().unwrap_or("lastmod")
                );
                return Err(ValidationError::new(
                    field,
                    "a date, a datetime or a YYYY-MM-DD[THH:MM:SS[±HH:MM]] string is required",
                    shown,
                )
                .into());
            }
        };
        Ok(Some(formatted))
    }

    /// Attach the configured zone to a naive timestamp.
    fn localize(&self, naive: NaiveDateTime) -> String {
        let local = self
            .tz
            .and_then(|tz| tz.from_local_datetime(&naive).earliest());
        match local {
            Some(aware) => aware.format(AWARE_FORMAT).to_string(),
            None => naive.format(NAIVE_FORMAT).to_string(),
        }
    }
}
