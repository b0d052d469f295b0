//! `smap index` command implementation.

use std::path::PathBuf;

use clap::Args;
use smap_sitemap::SitemapIndex;

use crate::error::CliError;
use crate::output::{Output, print_document};

/// Arguments for the index command.
#[derive(Args)]
pub(crate) struct IndexArgs {
    /// Site base URL the sitemap paths are relative to.
    #[arg(long, env = "SMAP_BASE_URL")]
    base_url: String,

    /// Last modification date applied to every entry.
    #[arg(long)]
    lastmod: Option<String>,

    /// Output file (default: print to stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Sitemap paths, e.g. `/sitemap-blog.xml`.
    #[arg(required = true)]
    paths: Vec<String>,
}

impl IndexArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        crate::init_tracing(false);

        let mut index = SitemapIndex::new(&self.base_url)?;
        for path in &self.paths {
            index.add_sitemap(path, self.lastmod.as_deref())?;
        }

        match &self.output {
            Some(path) => {
                index.write(path)?;
                Output::new().success(&format!(
                    "Sitemap index with {} entries written to {}",
                    index.items().len(),
                    path.display()
                ));
            }
            None => print_document(&index.render()?)?,
        }
        Ok(())
    }
}
