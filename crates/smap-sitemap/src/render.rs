//! XML serialization of sitemap documents.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{RenderError, SitemapError};

/// MIME type of rendered documents.
pub const CONTENT_TYPE: &str = "application/xml";

/// Sitemap protocol namespace.
pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const URLSET_SCHEMA: &str =
    "http://www.sitemaps.org/schemas/sitemap/0.9 http://www.sitemaps.org/schemas/sitemap/0.9/sitemap.xsd";

/// A value that serializes to one child element of the document root.
pub trait Element {
    /// Write the element and its children.
    fn write_element<W: Write>(&self, writer: &mut Writer<W>) -> std::io::Result<()>;
}

/// Root element shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `<urlset>` of `<url>` entries.
    UrlSet,
    /// `<sitemapindex>` of `<sitemap>` entries.
    SitemapIndex,
}

impl DocumentKind {
    fn root(self) -> BytesStart<'static> {
        match self {
            Self::UrlSet => BytesStart::new("urlset").with_attributes([
                ("xmlns", SITEMAP_NS),
                ("xmlns:xsi", XSI_NS),
                ("xsi:schemaLocation", URLSET_SCHEMA),
            ]),
            Self::SitemapIndex => {
                BytesStart::new("sitemapindex").with_attributes([("xmlns", SITEMAP_NS)])
            }
        }
    }
}

/// Serializes an ordered collection of elements.
#[derive(Debug)]
pub struct XmlRenderer<'a, T> {
    kind: DocumentKind,
    items: &'a [T],
}

impl<'a, T: Element> XmlRenderer<'a, T> {
    /// Create a renderer for `items` under the `kind` root.
    #[must_use]
    pub fn new(kind: DocumentKind, items: &'a [T]) -> Self {
        Self { kind, items }
    }

    /// Render the document to a string.
    pub fn render(&self) -> Result<String, RenderError> {
        let mut buf = Vec::new();
        self.write_document(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Render the document into `dest`.
    ///
    /// `dest` is consumed and dropped before returning, so file handles are
    /// closed on success and on error alike.
    pub fn write_to<W: Write>(&self, mut dest: W) -> Result<(), RenderError> {
        self.write_document(&mut dest)?;
        dest.flush()?;
        Ok(())
    }

    fn write_document<W: Write>(&self, dest: W) -> Result<(), RenderError> {
        let mut writer = Writer::new(dest);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Text(BytesText::new("\n")))?;

        let root = self.kind.root();
        let end = root.to_end().into_owned();
        writer.write_event(Event::Start(root))?;
        for item in self.items {
            item.write_element(&mut writer)?;
        }
        writer.write_event(Event::End(end))?;
        Ok(())
    }
}

/// Render into a newly created file at `path`.
pub(crate) fn write_file<T: Element>(
    renderer: &XmlRenderer<'_, T>,
    path: &Path,
) -> Result<(), SitemapError> {
    let io_error = |source: std::io::Error| SitemapError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    renderer
        .write_to(BufWriter::new(file))
        .map_err(|err| match err {
            RenderError::Io(source) => io_error(source),
            other => SitemapError::Render(other),
        })?;
    tracing::info!(path = %path.display(), "Sitemap written");
    Ok(())
}

/// Write `<name>text</name>`.
pub(crate) fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> std::io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))
}
