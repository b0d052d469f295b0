//! `smap build` command implementation.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use smap_config::{Config, ConfigOverrides};
use smap_sitemap::Sitemap;
use smap_source::{JsonModel, Model};

use crate::error::CliError;
use crate::output::{Output, print_document};

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover smap.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file (overrides `sitemap.filename`).
    #[arg(short, long, conflicts_with = "stdout")]
    output: Option<PathBuf>,

    /// Print the document instead of writing a file.
    #[arg(long)]
    stdout: bool,

    /// Site base URL (overrides config).
    #[arg(long, env = "SMAP_BASE_URL")]
    base_url: Option<String>,

    /// Disable item caching.
    #[arg(long)]
    no_cache: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

impl BuildArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let overrides = ConfigOverrides {
            base_url: self.base_url.clone(),
            filename: self.output.clone(),
            cache_period: self.no_cache.then_some(0.0),
            ..ConfigOverrides::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&overrides))?;
        crate::init_tracing(self.verbose || config.sitemap.debug);

        if let Some(path) = &config.config_path {
            output.info(&format!("Config: {}", path.display()));
        }

        let routes = config.route_templates()?;
        let models = load_models(&config)?;
        let rules = config.rules.clone();
        tracing::debug!(
            routes = routes.len(),
            models = models.len(),
            rules = rules.len(),
            "Sources loaded"
        );

        let mut sitemap = Sitemap::from_config(config)?.with_routes(routes);
        for rule in &rules {
            let model = models.get(&rule.model).ok_or_else(|| {
                CliError::Validation(format!("Model \"{}\" is not declared", rule.model))
            })?;
            sitemap.add_rule(
                &rule.path,
                Arc::clone(model),
                &rule.loc_from,
                rule.lastmod_from.as_deref(),
                rule.changefreq,
                rule.priority,
            )?;
        }

        if self.stdout {
            let xml = sitemap.render()?;
            print_document(&xml)?;
            return Ok(());
        }

        let path = sitemap.write(None)?;
        output.success(&format!(
            "Sitemap with {} URLs written to {}",
            sitemap.items().len(),
            path.display()
        ));
        Ok(())
    }
}

/// Load every model declared in `[models]`.
fn load_models(config: &Config) -> Result<BTreeMap<String, Arc<dyn Model>>, CliError> {
    config
        .models_resolved
        .iter()
        .map(|(name, path)| {
            let model: Arc<dyn Model> = Arc::new(JsonModel::load(name.as_str(), path)?);
            Ok((name.clone(), model))
        })
        .collect()
}
