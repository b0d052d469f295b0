//! Sitemap entries.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use smap_validators::{ChangeFreq, Priority, ValidationError, validate_lastmod, validate_location};

use crate::render::{Element, write_text_element};

/// One `<url>` entry of a sitemap.
///
/// Items compare, hash and order by location only, so a keyed collection
/// holds at most one item per URL.
#[derive(Debug, Clone)]
pub struct Item {
    loc: String,
    lastmod: Option<String>,
    changefreq: Option<ChangeFreq>,
    priority: Option<Priority>,
}

impl Item {
    /// Create an item for `loc` without optional fields.
    pub fn new(loc: impl Into<String>) -> Result<Self, ValidationError> {
        let loc = loc.into();
        validate_location(&loc, "loc")?;
        Ok(Self {
            loc,
            lastmod: None,
            changefreq: None,
            priority: None,
        })
    }

    /// Set the last-modified timestamp.
    pub fn with_lastmod(mut self, lastmod: impl Into<String>) -> Result<Self, ValidationError> {
        let lastmod = lastmod.into();
        validate_lastmod(&lastmod, "lastmod")?;
        self.lastmod = Some(lastmod);
        Ok(self)
    }

    /// Set the change frequency.
    #[must_use]
    pub fn with_changefreq(mut self, changefreq: Option<ChangeFreq>) -> Self {
        self.changefreq = changefreq;
        self
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn loc(&self) -> &str {
        &self.loc
    }

    #[must_use]
    pub fn lastmod(&self) -> Option<&str> {
        self.lastmod.as_deref()
    }

    #[must_use]
    pub fn changefreq(&self) -> Option<ChangeFreq> {
        self.changefreq
    }

    #[must_use]
    pub fn priority(&self) -> Option<Priority> {
        self.priority
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.loc == other.loc
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.loc.hash(state);
    }
}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Item {
    fn cmp(&self, other: &Self) -> Ordering {
        self.loc.cmp(&other.loc)
    }
}

impl Element for Item {
    fn write_element<W: Write>(&self, writer: &mut Writer<W>) -> std::io::Result<()> {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        write_text_element(writer, "loc", &self.loc)?;
        if let Some(lastmod) = &self.lastmod {
            write_text_element(writer, "lastmod", lastmod)?;
        }
        if let Some(changefreq) = self.changefreq {
            write_text_element(writer, "changefreq", changefreq.as_str())?;
        }
        if let Some(priority) = self.priority {
            write_text_element(writer, "priority", &priority.to_string())?;
        }
        writer.write_event(Event::End(BytesEnd::new("url")))
    }
}

/// One `<sitemap>` entry of a sitemap index.
#[derive(Debug, Clone)]
pub struct IndexItem {
    loc: String,
    lastmod: Option<String>,
}

impl IndexItem {
    /// Create an index entry, validating both fields.
    pub fn new(loc: impl Into<String>, lastmod: Option<&str>) -> Result<Self, ValidationError> {
        let loc = loc.into();
        validate_location(&loc, "loc")?;
        let lastmod = lastmod
            .map(|value| validate_lastmod(value, "lastmod").map(str::to_owned))
            .transpose()?;
        Ok(Self { loc, lastmod })
    }

    #[must_use]
    pub fn loc(&self) -> &str {
        &self.loc
    }

    #[must_use]
    pub fn lastmod(&self) -> Option<&str> {
        self.lastmod.as_deref()
    }
}

impl PartialEq for IndexItem {
    fn eq(&self, other: &Self) -> bool {
        self.loc == other.loc
    }
}

impl Eq for IndexItem {}

impl Hash for IndexItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.loc.hash(state);
    }
}

impl Element for IndexItem {
    fn write_element<W: Write>(&self, writer: &mut Writer<W>) -> std::io::Result<()> {
        writer.write_event(Event::Start(BytesStart::new("sitemap")))?;
        write_text_element(writer, "loc", &self.loc)?;
        if let Some(lastmod) = &self.lastmod {
            write_text_element(writer, "lastmod", lastmod)?;
        }
        writer.write_event(Event::End(BytesEnd::new("sitemap")))
    }
}
