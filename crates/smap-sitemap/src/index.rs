//! Sitemap-of-sitemaps documents.

use std::path::Path;

use url::Url;

use crate::error::SitemapError;
use crate::expander::join_location;
use crate::item::IndexItem;
use crate::render::{DocumentKind, XmlRenderer, write_file};
use crate::sitemap::parse_base_url;

/// A `<sitemapindex>` listing other sitemap files of a site.
///
/// Entries are kept sorted by location; adding a location twice replaces the
/// earlier entry.
#[derive(Debug, Clone)]
pub struct SitemapIndex {
    base: Url,
    items: Vec<IndexItem>,
}

impl SitemapIndex {
    /// Create an empty index for `base_url`.
    pub fn new(base_url: &str) -> Result<Self, SitemapError> {
        Ok(Self {
            base: parse_base_url(base_url)?,
            items: Vec::new(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Add the sitemap at `path`, relative to the base URL.
    pub fn add_sitemap(&mut self, path: &str, lastmod: Option<&str>) -> Result<(), SitemapError> {
        let item = IndexItem::new(join_location(&self.base, path)?, lastmod)?;
        self.add_item(item);
        Ok(())
    }

    /// Add a prepared entry as is.
    pub fn add_item(&mut self, item: IndexItem) {
        match self
            .items
            .binary_search_by(|probe| probe.loc().cmp(item.loc()))
        {
            Ok(pos) => self.items[pos] = item,
            Err(pos) => self.items.insert(pos, item),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[IndexItem] {
        &self.items
    }

    pub fn render(&self) -> Result<String, SitemapError> {
        Ok(XmlRenderer::new(DocumentKind::SitemapIndex, &self.items).render()?)
    }

    pub fn write(&self, path: &Path) -> Result<(), SitemapError> {
        write_file(
            &XmlRenderer::new(DocumentKind::SitemapIndex, &self.items),
            path,
        )
    }
}
