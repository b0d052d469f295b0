//! Configuration management for smap.
//!
//! Parses `smap.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Values are validated
//! once the whole file is loaded, and again after every [`Config::merge`];
//! individual fields are never validated in isolation.
//!
//! [`ConfigOverrides`] is the only way to change a loaded configuration.
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `sitemap.base_url`
//! - `sitemap.filename`

mod expand;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use smap_validators::{ChangeFreq, Priority, validate_priority, validate_timezone};

pub use smap_validators::ValidationError;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "smap.toml";

/// Prefixes excluded from every sitemap unless configured otherwise.
const DEFAULT_IGNORED: [&str; 3] = ["/sitemap.xml", "/admin", "/static"];

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sitemap settings.
    pub sitemap: SitemapSettings,
    /// Per-category change frequency and priority defaults.
    pub defaults: Defaults,
    /// Data source selection.
    pub source: SourceConfig,
    /// Inline route templates.
    pub routes: Vec<String>,
    /// File with one route template per line (relative string from TOML).
    routes_file: Option<String>,
    /// Extra items that do not come from routes.
    pub items: Vec<ItemEntry>,
    /// Rules binding route prefixes to models.
    pub rules: Vec<RuleConfig>,
    /// Model name to JSON row file (relative strings from TOML).
    models: BTreeMap<String, String>,

    /// Resolved routes file (set after loading).
    #[serde(skip)]
    pub routes_file_resolved: Option<PathBuf>,
    /// Resolved model files (set after loading).
    #[serde(skip)]
    pub models_resolved: BTreeMap<String, PathBuf>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sitemap: SitemapSettings::default(),
            defaults: Defaults::default(),
            source: SourceConfig::default(),
            routes: Vec::new(),
            routes_file: None,
            items: Vec::new(),
            rules: Vec::new(),
            models: BTreeMap::new(),
            routes_file_resolved: None,
            models_resolved: BTreeMap::new(),
            config_path: None,
        }
    }
}

/// `[sitemap]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SitemapSettings {
    /// Site origin every location is joined with (e.g. `https://example.com`).
    pub base_url: Option<String>,
    /// Default output file for `write`.
    pub filename: Option<PathBuf>,
    /// Hours a built item set stays valid. `None` or `0` disables caching.
    pub cache_period: Option<f64>,
    /// IANA time zone used to format last-modified timestamps.
    pub timezone: Option<String>,
    /// Route prefixes excluded from the sitemap (plain starts-with match).
    pub ignored: BTreeSet<String>,
    /// Enable debug logging.
    pub debug: bool,
}

impl Default for SitemapSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            filename: None,
            cache_period: None,
            timezone: None,
            ignored: DEFAULT_IGNORED.iter().map(|&p| p.to_owned()).collect(),
            debug: false,
        }
    }
}

impl SitemapSettings {
    /// Whether item caching is enabled.
    #[must_use]
    pub fn caching_enabled(&self) -> bool {
        self.cache_period.is_some_and(|hours| hours > 0.0)
    }
}

/// Change frequency and priority applied when an item does not set its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoryDefaults {
    pub changefreq: Option<ChangeFreq>,
    pub priority: Option<Priority>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// The site root entry.
    pub index: CategoryDefaults,
    /// Entries generated from rules.
    pub content: CategoryDefaults,
    /// Static routes and bare-path items.
    pub alter: CategoryDefaults,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            index: CategoryDefaults {
                changefreq: None,
                priority: Priority::parse(1.0, "defaults.index.priority").ok(),
            },
            content: CategoryDefaults::default(),
            alter: CategoryDefaults::default(),
        }
    }
}

/// `[source]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Data access technology (`django`, `peewee`, `sqlalchemy`, `local`).
    pub orm: Option<String>,
}

/// A static sitemap item: a bare path or a table of fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ItemEntry {
    /// Path joined with the base URL; category defaults apply.
    Path(String),
    /// Explicit fields.
    Attrs(ItemAttrs),
}

/// Explicit fields of a static item.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemAttrs {
    pub loc: String,
    #[serde(default)]
    pub lastmod: Option<String>,
    #[serde(default)]
    pub changefreq: Option<ChangeFreq>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl From<&str> for ItemEntry {
    fn from(path: &str) -> Self {
        Self::Path(path.to_owned())
    }
}

impl From<String> for ItemEntry {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<ItemAttrs> for ItemEntry {
    fn from(attrs: ItemAttrs) -> Self {
        Self::Attrs(attrs)
    }
}

/// `[[rules]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Route prefix the rule applies to (e.g. `/blog`).
    pub path: String,
    /// Name of a model declared in `[models]`.
    pub model: String,
    /// Row attribute providing the path segment.
    pub loc_from: String,
    /// Row attribute providing the last-modified timestamp.
    #[serde(default)]
    pub lastmod_from: Option<String>,
    #[serde(default)]
    pub changefreq: Option<ChangeFreq>,
    /// Validated when the rule is registered.
    #[serde(default)]
    pub priority: Option<f64>,
}

/// Settings that override configuration values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    /// Override base URL.
    pub base_url: Option<String>,
    /// Override output filename.
    pub filename: Option<PathBuf>,
    /// Override cache period in hours (`0` disables caching).
    pub cache_period: Option<f64>,
    /// Override time zone.
    pub timezone: Option<String>,
    /// Replace the ignored prefix set.
    pub ignored: Option<BTreeSet<String>>,
    /// Prefixes added to the ignored set.
    pub extra_ignored: Vec<String>,
    /// Override the debug flag.
    pub debug: Option<bool>,
    /// Override the index category defaults.
    pub index: Option<CategoryDefaults>,
    /// Override the content category defaults.
    pub content: Option<CategoryDefaults>,
    /// Override the alter category defaults.
    pub alter: Option<CategoryDefaults>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Field value rejected by a sitemap validator.
    #[error("Configuration error: {0}")]
    Field(#[from] ValidationError),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`sitemap.base_url`").
        field: String,
        /// Error message (e.g., "${`SITE_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional overrides.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `smap.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// Overrides are merged after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(overrides) = overrides {
            config.merge(overrides)?;
        }

        Ok(config)
    }

    /// Parse configuration text, resolving relative paths against `config_dir`.
    ///
    /// # Errors
    ///
    /// Returns error if parsing, expansion or validation fails.
    pub fn parse(content: &str, config_dir: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;
        config.resolve_paths(config_dir);

        // Validate configuration after loading and resolution
        config.validate()?;

        Ok(config)
    }

    /// Merge `overrides` into this configuration.
    ///
    /// The merged result is validated before it replaces the current values;
    /// on error the configuration is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` or `ConfigError::Field` if the merged
    /// configuration is invalid.
    pub fn merge(&mut self, overrides: &ConfigOverrides) -> Result<(), ConfigError> {
        let mut candidate = self.clone();
        candidate.apply_overrides(overrides);
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    /// Apply overrides without validation.
    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        let settings = &mut self.sitemap;
        if let Some(base_url) = &overrides.base_url {
            settings.base_url = Some(base_url.clone());
        }
        if let Some(filename) = &overrides.filename {
            settings.filename = Some(filename.clone());
        }
        if let Some(hours) = overrides.cache_period {
            settings.cache_period = Some(hours);
        }
        if let Some(timezone) = &overrides.timezone {
            settings.timezone = Some(timezone.clone());
        }
        if let Some(ignored) = &overrides.ignored {
            settings.ignored.clone_from(ignored);
        }
        settings
            .ignored
            .extend(overrides.extra_ignored.iter().cloned());
        if let Some(debug) = overrides.debug {
            settings.debug = debug;
        }
        if let Some(index) = overrides.index {
            self.defaults.index = index;
        }
        if let Some(content) = overrides.content {
            self.defaults.content = content;
        }
        if let Some(alter) = overrides.alter {
            self.defaults.alter = alter;
        }
    }

    /// Read route templates from inline `routes` and `routes_file`.
    ///
    /// Blank lines and lines starting with `#` in the routes file are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the routes file cannot be read.
    pub fn route_templates(&self) -> Result<Vec<String>, ConfigError> {
        let mut routes = self.routes.clone();
        if let Some(path) = &self.routes_file_resolved {
            let content = std::fs::read_to_string(path)?;
            routes.extend(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !line.starts_with('#'))
                    .map(str::to_owned),
            );
        }
        Ok(routes)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::parse(&content, config_dir)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after every merge.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` or `ConfigError::Field` if any
    /// validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_sitemap()?;
        self.validate_routes()?;
        self.validate_rules()?;
        Ok(())
    }

    /// Validate the `[sitemap]` section.
    fn validate_sitemap(&self) -> Result<(), ConfigError> {
        let settings = &self.sitemap;

        if let Some(ref base_url) = settings.base_url {
            require_non_empty(base_url, "sitemap.base_url")?;
            require_http_url(base_url, "sitemap.base_url")?;
        }

        if let Some(hours) = settings.cache_period
            && (!hours.is_finite() || hours < 0.0)
        {
            return Err(ConfigError::Validation(format!(
                "sitemap.cache_period must be a non-negative number of hours, got {hours}"
            )));
        }

        if let Some(ref timezone) = settings.timezone {
            validate_timezone(timezone, "sitemap.timezone")?;
        }

        if settings.ignored.iter().any(String::is_empty) {
            return Err(ConfigError::Validation(
                "sitemap.ignored cannot contain an empty prefix".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate route sources.
    fn validate_routes(&self) -> Result<(), ConfigError> {
        if !self.routes.is_empty() && self.routes_file.is_some() {
            return Err(ConfigError::Validation(
                "routes and routes_file are mutually exclusive".to_owned(),
            ));
        }
        Ok(())
    }

    /// Validate `[[rules]]` entries against `[models]`.
    fn validate_rules(&self) -> Result<(), ConfigError> {
        for (idx, rule) in self.rules.iter().enumerate() {
            require_non_empty(&rule.path, &format!("rules[{idx}].path"))?;
            require_non_empty(&rule.loc_from, &format!("rules[{idx}].loc_from"))?;
            if let Some(priority) = rule.priority {
                validate_priority(priority, &format!("rules[{idx}].priority"))?;
            }
            if !self.models_resolved.contains_key(&rule.model) {
                return Err(ConfigError::Validation(format!(
                    "rules[{idx}].model \"{}\" is not declared in [models]",
                    rule.model
                )));
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref base_url) = self.sitemap.base_url {
            self.sitemap.base_url = Some(expand::expand_env(base_url, "sitemap.base_url")?);
        }

        if let Some(ref filename) = self.sitemap.filename {
            let expanded = expand::expand_env(&filename.to_string_lossy(), "sitemap.filename")?;
            self.sitemap.filename = Some(PathBuf::from(expanded));
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        if let Some(ref filename) = self.sitemap.filename {
            self.sitemap.filename = Some(config_dir.join(filename));
        }

        self.routes_file_resolved = self.routes_file.as_deref().map(|f| config_dir.join(f));

        self.models_resolved = self
            .models
            .iter()
            .map(|(name, file)| (name.clone(), config_dir.join(file)))
            .collect();
    }
}
