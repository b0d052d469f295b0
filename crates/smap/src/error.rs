//! CLI error types.

use smap_config::ConfigError;
use smap_sitemap::SitemapError;
use smap_source::SourceError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Source(#[from] SourceError),

    #[error("{0}")]
    Sitemap(#[from] SitemapError),

    #[error("{0}")]
    Validation(String),
}
