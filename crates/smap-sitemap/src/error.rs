//! Error types for sitemap preparation and output.

use std::path::PathBuf;

use smap_config::ConfigError;
use smap_source::SourceError;
use smap_validators::ValidationError;

/// Error raised while serializing a document.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RenderError {
    /// Writing to the destination failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rendered bytes are not valid UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Error from sitemap operations.
#[derive(Debug, thiserror::Error)]
pub enum SitemapError {
    /// A field value does not conform to the sitemap format.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Fetching model rows failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A parameterized route has neither a rule nor an ignored prefix.
    #[error(
        "Add pattern '{route}' or its part to ignored or add a new rule with a path '{prefix}'"
    )]
    UnmatchedRoute {
        /// Route template as read from the route source.
        route: String,
        /// Prefix a rule would have to be registered for.
        prefix: String,
    },

    /// A rule names attributes the model does not have.
    #[error(
        "Incorrect attributes are set for the model \"{model}\": loc_from = {loc_from} and/or lastmod_from = {}",
        .lastmod_from.as_deref().unwrap_or("None")
    )]
    Attribute {
        model: String,
        loc_from: String,
        lastmod_from: Option<String>,
    },

    /// Malformed static item input.
    #[error("Item error: {0}")]
    Item(String),

    /// `write` was called without a filename and none is configured.
    #[error("No filename given and sitemap.filename is not configured")]
    NoFilename,

    /// Output file could not be written.
    #[error("Path \"{}\" is not writable: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization failed.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

impl SitemapError {
    /// True for errors caused by malformed configuration, rules or fields.
    ///
    /// These are fatal and will not succeed on retry without changing input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Validation(_)
            | Self::Config(_)
            | Self::UnmatchedRoute { .. }
            | Self::Attribute { .. }
            | Self::NoFilename => true,
            Self::Source(err) => err.is_validation(),
            Self::Item(_) | Self::Io { .. } | Self::Render(_) => false,
        }
    }

    pub(crate) fn attribute(model: &str, loc_from: &str, lastmod_from: Option<&str>) -> Self {
        Self::Attribute {
            model: model.to_owned(),
            loc_from: loc_from.to_owned(),
            lastmod_from: lastmod_from.map(str::to_owned),
        }
    }
}
