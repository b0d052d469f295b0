//! The configurable, model-driven sitemap.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use smap_config::{Config, ConfigOverrides, ItemEntry};
use smap_source::{Model, Orm};
use smap_validators::{ChangeFreq, ValidationError, validate_timezone};
use url::Url;

use crate::cache::{Clock, ItemCache, SystemClock};
use crate::error::SitemapError;
use crate::exclusion::without_ignored;
use crate::expander::{Expander, is_dynamic, join_location};
use crate::item::Item;
use crate::render::{DocumentKind, XmlRenderer, write_file};
use crate::routes::RouteSource;
use crate::rules::RuleRegistry;

const BASE_URL_EXPECTED: &str = "an absolute http:// or https:// URL with a host is required";

/// Parse and check a site base URL.
pub(crate) fn parse_base_url(value: &str) -> Result<Url, ValidationError> {
    let invalid = || ValidationError::new("base_url", BASE_URL_EXPECTED, value);
    let url = Url::parse(value).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url)
}

/// A sitemap whose items come from route templates, rules and static items.
///
/// Items are computed on [`build`](Self::build) and held in memory. With a
/// cache period configured, later builds reuse them until the period elapses;
/// [`rebuild`](Self::rebuild) always recomputes.
///
/// The configuration is owned privately. It can be read with
/// [`config`](Self::config) and changed only through
/// [`configure`](Self::configure).
pub struct Sitemap {
    config: Config,
    base: Url,
    orm: Orm,
    routes: Box<dyn RouteSource>,
    rules: RuleRegistry,
    static_items: Vec<ItemEntry>,
    cache: ItemCache,
    clock: Arc<dyn Clock>,
}

impl Sitemap {
    /// Create a sitemap for `base_url`, overriding any configured base URL.
    pub fn new(base_url: &str, mut config: Config) -> Result<Self, SitemapError> {
        config.merge(&ConfigOverrides {
            base_url: Some(base_url.to_owned()),
            ..ConfigOverrides::default()
        })?;
        Self::from_config(config)
    }

    /// Create a sitemap from `config`, which must set `sitemap.base_url`.
    ///
    /// Configured `items` become static items and `source.orm` selects the
    /// access strategy.
    pub fn from_config(config: Config) -> Result<Self, SitemapError> {
        let base_url = config.sitemap.base_url.as_deref().unwrap_or_default();
        let base = parse_base_url(base_url)?;
        let orm = Orm::from_name(config.source.orm.as_deref())?;
        let static_items = config.items.clone();

        Ok(Self {
            config,
            base,
            orm,
            routes: Box::new(Vec::<String>::new()),
            rules: RuleRegistry::new(),
            static_items,
            cache: ItemCache::new(),
            clock: Arc::new(SystemClock),
        })
    }

    /// Use `routes` as the route template source.
    #[must_use]
    pub fn with_routes(mut self, routes: impl RouteSource + 'static) -> Self {
        self.routes = Box::new(routes);
        self
    }

    /// Replace the access strategy selected from configuration.
    #[must_use]
    pub fn with_orm(mut self, orm: Orm) -> Self {
        self.orm = orm;
        self
    }

    /// Replace the clock used for cache staleness and build timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Merge `overrides` into the configuration.
    ///
    /// The merged configuration is validated as a whole; on error nothing
    /// changes. Held items are kept until they expire or
    /// [`rebuild`](Self::rebuild) is called.
    pub fn configure(&mut self, overrides: &ConfigOverrides) -> Result<(), SitemapError> {
        let mut candidate = self.config.clone();
        candidate.merge(overrides)?;
        let base = match &overrides.base_url {
            Some(base_url) => parse_base_url(base_url)?,
            None => self.base.clone(),
        };
        self.config = candidate;
        self.base = base;
        Ok(())
    }

    /// Register a rule generating URLs under `path` from the rows of `model`.
    ///
    /// See [`RuleRegistry::add_rule`].
    pub fn add_rule(
        &mut self,
        path: &str,
        model: Arc<dyn Model>,
        loc_from: &str,
        lastmod_from: Option<&str>,
        changefreq: Option<ChangeFreq>,
        priority: Option<f64>,
    ) -> Result<(), SitemapError> {
        self.rules
            .add_rule(path, model, loc_from, lastmod_from, changefreq, priority)
    }

    /// Add static items: bare paths or explicit fields.
    ///
    /// Fails with [`SitemapError::Item`] once the sitemap has been built or
    /// if an entry is malformed; no entry is added in that case.
    pub fn add_items<I, T>(&mut self, items: I) -> Result<(), SitemapError>
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemEntry>,
    {
        if !self.cache.is_empty() {
            return Err(SitemapError::Item(
                "Sitemap has already been initialized".to_owned(),
            ));
        }
        let entries: Vec<ItemEntry> = items.into_iter().map(Into::into).collect();
        for entry in &entries {
            self.static_item(entry)
                .map_err(|err| SitemapError::Item(err.to_string()))?;
        }
        self.static_items.extend(entries);
        Ok(())
    }

    /// Parameterized route templates that survive exclusion.
    ///
    /// Each of them needs a rule before the sitemap can be built.
    #[must_use]
    pub fn dynamic_routes(&self) -> Vec<String> {
        self.public_routes()
            .into_iter()
            .filter(|route| is_dynamic(route))
            .collect()
    }

    /// Compute items unless the held ones are still fresh.
    pub fn build(&mut self) -> Result<(), SitemapError> {
        let now = self.clock.now();
        if self.cache.is_fresh(self.config.sitemap.cache_period, now) {
            tracing::debug!("Using existing data");
            return Ok(());
        }

        let items = self.prepare_items(now)?;
        tracing::debug!(count = items.len(), "Data for the sitemap is updated");
        self.cache.store(items, now);
        Ok(())
    }

    /// Drop held items and build again.
    pub fn rebuild(&mut self) -> Result<(), SitemapError> {
        self.cache.invalidate();
        self.build()
    }

    /// Items of the last build, sorted by location.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        self.cache.items()
    }

    /// Build if needed and render the `<urlset>` document.
    pub fn render(&mut self) -> Result<String, SitemapError> {
        self.build()?;
        Ok(XmlRenderer::new(DocumentKind::UrlSet, self.cache.items()).render()?)
    }

    /// Build if needed and write the document to `filename`, or to the
    /// configured `sitemap.filename`. Returns the path written.
    pub fn write(&mut self, filename: Option<&Path>) -> Result<PathBuf, SitemapError> {
        let path = filename
            .map(Path::to_path_buf)
            .or_else(|| self.config.sitemap.filename.clone())
            .ok_or(SitemapError::NoFilename)?;
        self.build()?;
        write_file(
            &XmlRenderer::new(DocumentKind::UrlSet, self.cache.items()),
            &path,
        )?;
        Ok(path)
    }

    fn public_routes(&self) -> Vec<String> {
        let ignored: Vec<&str> = self
            .config
            .sitemap
            .ignored
            .iter()
            .map(String::as_str)
            .collect();
        without_ignored(self.routes.routes(), &ignored)
    }

    fn timezone(&self) -> Result<Option<Tz>, ValidationError> {
        self.config
            .sitemap
            .timezone
            .as_deref()
            .map(|tz| validate_timezone(tz, "sitemap.timezone"))
            .transpose()
    }

    /// Index item, then route items, then static items, keyed by location.
    ///
    /// Later entries replace earlier ones with the same location.
    fn prepare_items(&self, now: DateTime<Utc>) -> Result<Vec<Item>, SitemapError> {
        let expander = Expander {
            base: &self.base,
            rules: &self.rules,
            orm: &self.orm,
            defaults: &self.config.defaults,
            tz: self.timezone()?,
            started: now,
        };

        let mut keyed = BTreeMap::new();
        let index = expander.index_item()?;
        keyed.insert(index.loc().to_owned(), index);

        for item in expander.expand(&self.public_routes())? {
            keyed.insert(item.loc().to_owned(), item);
        }

        for entry in &self.static_items {
            let item = self
                .static_item(entry)
                .map_err(|err| SitemapError::Item(err.to_string()))?;
            keyed.insert(item.loc().to_owned(), item);
        }

        Ok(keyed.into_values().collect())
    }

    /// Build the item for a static entry. Bare paths take the alter defaults.
    fn static_item(&self, entry: &ItemEntry) -> Result<Item, ValidationError> {
        match entry {
            ItemEntry::Path(path) => {
                let defaults = self.config.defaults.alter;
                Ok(Item::new(join_location(&self.base, path)?)?
                    .with_changefreq(defaults.changefreq)
                    .with_priority(defaults.priority))
            }
            ItemEntry::Attrs(attrs) => {
                let mut item = Item::new(join_location(&self.base, &attrs.loc)?)?
                    .with_changefreq(attrs.changefreq)
                    .with_priority(attrs.priority);
                if let Some(lastmod) = &attrs.lastmod {
                    item = item.with_lastmod(lastmod.as_str())?;
                }
                Ok(item)
            }
        }
    }
}

impl fmt::Debug for Sitemap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sitemap")
            .field("base", &self.base.as_str())
            .field("orm", &self.orm)
            .field("rules", &self.rules.len())
            .field("static_items", &self.static_items.len())
            .field("cached_at", &self.cache.cached_at())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use quick_xml::Reader;
    use quick_xml::events::Event;
    use smap_config::ItemAttrs;
    use smap_source::MockModel;
    use smap_validators::Priority;

    use super::*;
    use crate::cache::FixedClock;

    const BASE: &str = "http://site.com";

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
    }

    fn config_with(overrides: &ConfigOverrides) -> Config {
        let mut config = Config::default();
        config.merge(overrides).unwrap();
        config
    }

    fn sitemap(routes: &[&'static str]) -> Sitemap {
        Sitemap::new(BASE, Config::default())
            .unwrap()
            .with_routes(routes.to_vec())
            .with_clock(Arc::new(FixedClock::new(at(2020, 1, 1, 0, 0))))
    }

    fn blog() -> Arc<dyn Model> {
        Arc::new(
            MockModel::new("Post")
                .with_row([("slug", "a")])
                .with_row([("slug", "b")]),
        )
    }

    fn locs(sitemap: &Sitemap) -> Vec<&str> {
        sitemap.items().iter().map(Item::loc).collect()
    }

    #[test]
    fn test_ignored_routes_are_skipped() {
        let mut sitemap = Sitemap::new(
            BASE,
            config_with(&ConfigOverrides {
                extra_ignored: vec!["/ign".to_owned()],
                ..ConfigOverrides::default()
            }),
        )
        .unwrap()
        .with_routes(vec!["/", "/url", "/ign", "/ign/<slug>"]);

        sitemap.build().unwrap();

        assert_eq!(locs(&sitemap), ["http://site.com/", "http://site.com/url"]);
        assert!(sitemap.dynamic_routes().is_empty());
    }

    #[test]
    fn test_rule_expands_dynamic_route() {
        let mut sitemap = sitemap(&["/", "/blog/<slug>"]);
        sitemap
            .add_rule("/blog", blog(), "slug", None, Some(ChangeFreq::Weekly), Some(0.6))
            .unwrap();

        sitemap.build().unwrap();

        assert_eq!(
            locs(&sitemap),
            [
                "http://site.com/",
                "http://site.com/blog/a",
                "http://site.com/blog/b"
            ]
        );
        let post = &sitemap.items()[1];
        assert_eq!(post.changefreq(), Some(ChangeFreq::Weekly));
        assert_eq!(post.priority().map(Priority::value), Some(0.6));
        assert_eq!(post.lastmod(), None);
    }

    #[test]
    fn test_unmatched_dynamic_route() {
        let mut sitemap = sitemap(&["/", "/blog/<slug>"]);

        let err = sitemap.build().unwrap_err();

        assert!(err.is_validation());
        assert!(matches!(err, SitemapError::UnmatchedRoute { ref prefix, .. } if prefix == "/blog/"));
        assert!(sitemap.items().is_empty());
        assert_eq!(sitemap.dynamic_routes(), ["/blog/<slug>"]);
    }

    #[test]
    fn test_ignored_rule_is_never_queried() {
        let model = Arc::new(MockModel::new("Draft").with_attributes(["slug"]));
        let mut sitemap = Sitemap::new(
            BASE,
            config_with(&ConfigOverrides {
                extra_ignored: vec!["/drafts".to_owned()],
                ..ConfigOverrides::default()
            }),
        )
        .unwrap()
        .with_routes(vec!["/", "/drafts/<slug>"]);
        sitemap
            .add_rule("/drafts", Arc::clone(&model) as Arc<dyn Model>, "slug", None, None, None)
            .unwrap();

        sitemap.build().unwrap();

        assert!(model.queries().is_empty());
        assert_eq!(locs(&sitemap), ["http://site.com/"]);
    }

    #[test]
    fn test_static_item_replaces_route_item() {
        let mut sitemap = sitemap(&["/blog/<slug>"]);
        sitemap
            .add_rule("/blog", blog(), "slug", None, None, Some(0.5))
            .unwrap();
        sitemap
            .add_items([ItemAttrs {
                loc: "/blog/a".to_owned(),
                lastmod: Some("2019-05-05".to_owned()),
                priority: Priority::parse(0.2, "priority").ok(),
                ..ItemAttrs::default()
            }])
            .unwrap();

        sitemap.build().unwrap();

        assert_eq!(
            locs(&sitemap),
            [
                "http://site.com/",
                "http://site.com/blog/a",
                "http://site.com/blog/b"
            ]
        );
        let overridden = &sitemap.items()[1];
        assert_eq!(overridden.lastmod(), Some("2019-05-05"));
        assert_eq!(overridden.priority().map(Priority::value), Some(0.2));
        assert_eq!(sitemap.items()[2].priority().map(Priority::value), Some(0.5));
    }

    #[test]
    fn test_index_and_static_route_timestamps() {
        let mut sitemap = sitemap(&["/", "/about"]);

        sitemap.build().unwrap();

        let index = &sitemap.items()[0];
        assert_eq!(index.loc(), "http://site.com/");
        assert_eq!(index.lastmod(), Some("2020-01-01T00:00:00"));
        assert_eq!(index.priority().map(Priority::value), Some(1.0));
        assert_eq!(sitemap.items()[1].lastmod(), Some("2020-01-01T00:00:00"));
    }

    #[test]
    fn test_timezone_formats_lastmod_with_offset() {
        let mut sitemap = Sitemap::new(
            BASE,
            config_with(&ConfigOverrides {
                timezone: Some("Europe/Moscow".to_owned()),
                ..ConfigOverrides::default()
            }),
        )
        .unwrap()
        .with_clock(Arc::new(FixedClock::new(at(2020, 1, 1, 0, 0))));

        sitemap.build().unwrap();

        assert_eq!(sitemap.items()[0].lastmod(), Some("2020-01-01T03:00:00+03:00"));
    }

    #[test]
    fn test_bare_path_items_use_alter_defaults() {
        let mut sitemap = Sitemap::new(
            BASE,
            config_with(&ConfigOverrides {
                alter: Some(smap_config::CategoryDefaults {
                    changefreq: Some(ChangeFreq::Monthly),
                    priority: Priority::parse(0.3, "priority").ok(),
                }),
                ..ConfigOverrides::default()
            }),
        )
        .unwrap();
        sitemap.add_items(["/contacts"]).unwrap();

        sitemap.build().unwrap();

        let contacts = &sitemap.items()[1];
        assert_eq!(contacts.loc(), "http://site.com/contacts");
        assert_eq!(contacts.changefreq(), Some(ChangeFreq::Monthly));
        assert_eq!(contacts.priority().map(Priority::value), Some(0.3));
        assert_eq!(contacts.lastmod(), None);
    }

    #[test]
    fn test_build_is_idempotent_within_cache_period() {
        let clock = Arc::new(FixedClock::new(at(2020, 1, 1, 0, 0)));
        let mut sitemap = Sitemap::new(
            BASE,
            config_with(&ConfigOverrides {
                cache_period: Some(1.0),
                ..ConfigOverrides::default()
            }),
        )
        .unwrap()
        .with_routes(vec!["/", "/about"])
        .with_clock(Arc::clone(&clock) as Arc<dyn Clock>);

        let first = sitemap.render().unwrap();
        clock.set(at(2020, 1, 1, 0, 30));
        assert_eq!(sitemap.render().unwrap(), first);

        clock.set(at(2050, 1, 1, 0, 0));
        let refreshed = sitemap.render().unwrap();
        assert_ne!(refreshed, first);
        assert!(refreshed.contains("<lastmod>2050-01-01T00:00:00</lastmod>"));
    }

    #[test]
    fn test_huge_cache_period_keeps_items() {
        let clock = Arc::new(FixedClock::new(at(2020, 1, 1, 0, 0)));
        let mut sitemap = Sitemap::new(
            BASE,
            config_with(&ConfigOverrides {
                cache_period: Some(1e10),
                ..ConfigOverrides::default()
            }),
        )
        .unwrap()
        .with_clock(Arc::clone(&clock) as Arc<dyn Clock>);

        let first = sitemap.render().unwrap();
        clock.set(at(2050, 1, 1, 0, 0));

        assert_eq!(sitemap.render().unwrap(), first);
    }

    #[test]
    fn test_build_without_cache_recomputes() {
        let clock = Arc::new(FixedClock::new(at(2020, 1, 1, 0, 0)));
        let mut sitemap = sitemap(&["/"]).with_clock(Arc::clone(&clock) as Arc<dyn Clock>);

        sitemap.build().unwrap();
        clock.set(at(2020, 1, 1, 0, 1));
        sitemap.build().unwrap();

        assert_eq!(sitemap.items()[0].lastmod(), Some("2020-01-01T00:01:00"));
    }

    #[test]
    fn test_rebuild_ignores_fresh_cache() {
        let clock = Arc::new(FixedClock::new(at(2020, 1, 1, 0, 0)));
        let mut sitemap = Sitemap::new(
            BASE,
            config_with(&ConfigOverrides {
                cache_period: Some(24.0),
                ..ConfigOverrides::default()
            }),
        )
        .unwrap()
        .with_clock(Arc::clone(&clock) as Arc<dyn Clock>);

        sitemap.build().unwrap();
        clock.set(at(2020, 1, 1, 5, 0));
        sitemap.rebuild().unwrap();

        assert_eq!(sitemap.items()[0].lastmod(), Some("2020-01-01T05:00:00"));
    }

    #[test]
    fn test_render_round_trip() {
        let mut sitemap = sitemap(&["/", "/blog/<slug>"]);
        sitemap
            .add_rule("/blog", blog(), "slug", None, None, None)
            .unwrap();

        let xml = sitemap.render().unwrap();

        let mut reader = Reader::from_str(&xml);
        let mut in_loc = false;
        let mut parsed = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.name().as_ref() == b"loc" => in_loc = true,
                Event::Text(text) if in_loc => {
                    parsed.push(reader.decoder().decode(&text).unwrap().into_owned());
                }
                Event::End(e) if e.name().as_ref() == b"loc" => in_loc = false,
                Event::Eof => break,
                _ => {}
            }
        }
        assert_eq!(parsed, locs(&sitemap));
    }

    #[test]
    fn test_write_to_explicit_and_configured_paths() {
        let dir = tempfile::tempdir().unwrap();
        let configured = dir.path().join("configured.xml");
        let mut sitemap = Sitemap::new(
            BASE,
            config_with(&ConfigOverrides {
                filename: Some(configured.clone()),
                ..ConfigOverrides::default()
            }),
        )
        .unwrap();

        let explicit = dir.path().join("explicit.xml");
        assert_eq!(sitemap.write(Some(&explicit)).unwrap(), explicit);
        assert_eq!(sitemap.write(None).unwrap(), configured);

        let expected = sitemap.render().unwrap();
        assert_eq!(std::fs::read_to_string(&explicit).unwrap(), expected);
        assert_eq!(std::fs::read_to_string(&configured).unwrap(), expected);
    }

    #[test]
    fn test_write_without_filename() {
        let mut sitemap = sitemap(&["/"]);

        let err = sitemap.write(None).unwrap_err();

        assert!(matches!(err, SitemapError::NoFilename));
    }

    #[test]
    fn test_write_to_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("sitemap.xml");
        let mut sitemap = sitemap(&["/"]);

        let err = sitemap.write(Some(&path)).unwrap_err();

        assert!(matches!(err, SitemapError::Io { .. }));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_add_items_after_build() {
        let mut sitemap = sitemap(&["/"]);
        sitemap.build().unwrap();

        let err = sitemap.add_items(["/late"]).unwrap_err();

        assert!(matches!(err, SitemapError::Item(_)));
    }

    #[test]
    fn test_malformed_item_is_rejected() {
        let mut sitemap = sitemap(&["/"]);

        let err = sitemap
            .add_items([
                ItemEntry::from("/fine"),
                ItemEntry::from(ItemAttrs {
                    loc: "/dated".to_owned(),
                    lastmod: Some("yesterday".to_owned()),
                    ..ItemAttrs::default()
                }),
            ])
            .unwrap_err();

        assert!(matches!(err, SitemapError::Item(_)));
        sitemap.build().unwrap();
        assert_eq!(locs(&sitemap), ["http://site.com/"]);
    }

    #[test]
    fn test_configure_failure_keeps_config() {
        let mut sitemap = sitemap(&["/"]);

        let result = sitemap.configure(&ConfigOverrides {
            cache_period: Some(2.0),
            timezone: Some("Mars/Olympus".to_owned()),
            ..ConfigOverrides::default()
        });

        assert!(result.unwrap_err().is_validation());
        assert_eq!(sitemap.config().sitemap.cache_period, None);
        assert_eq!(sitemap.config().sitemap.timezone, None);
    }

    #[test]
    fn test_configure_base_url() {
        let mut sitemap = sitemap(&["/about"]);

        sitemap
            .configure(&ConfigOverrides {
                base_url: Some("https://example.org".to_owned()),
                ..ConfigOverrides::default()
            })
            .unwrap();
        sitemap.build().unwrap();

        assert_eq!(sitemap.base_url().as_str(), "https://example.org/");
        assert_eq!(
            locs(&sitemap),
            ["https://example.org/", "https://example.org/about"]
        );
    }

    #[test]
    fn test_invalid_base_url() {
        for base_url in ["", "site.com", "ftp://site.com"] {
            let err = Sitemap::new(base_url, Config::default()).unwrap_err();
            assert!(err.is_validation(), "{base_url}: {err}");
        }
        let err = Sitemap::from_config(Config::default()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_unknown_orm() {
        let mut config = Config::default();
        config.source.orm = Some("hibernate".to_owned());

        let err = Sitemap::new(BASE, config).unwrap_err();

        assert!(err.is_validation());
    }

    #[test]
    fn test_parse_base_url() {
        assert_eq!(
            parse_base_url("https://site.com/shop").unwrap().as_str(),
            "https://site.com/shop"
        );
        assert!(parse_base_url("mailto:a@b.c").is_err());
    }
}
