//! Sitemap generation for smap.
//!
//! This crate turns the route templates of a web application into a
//! sitemap protocol document:
//!
//! - [`without_ignored`]: drops routes under excluded prefixes
//! - [`RuleRegistry`]: binds route prefixes to data models
//! - [`Expander`]: turns templates into [`Item`]s, querying models for dynamic routes
//! - [`ItemCache`]: keeps built items for a configured number of hours
//! - [`XmlRenderer`]: writes `<urlset>` and `<sitemapindex>` documents
//! - [`Sitemap`] and [`SitemapIndex`]: the entry points tying it together
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use smap_config::Config;
//! use smap_sitemap::Sitemap;
//! use smap_source::{JsonModel, Row};
//!
//! let posts = JsonModel::from_rows("posts", vec![Row::new().with("slug", "hello")]);
//! let mut sitemap = Sitemap::new("https://example.com", Config::default())?
//!     .with_routes(vec!["/", "/about", "/blog/<slug>"]);
//! sitemap.add_rule("/blog", Arc::new(posts), "slug", None, None, None)?;
//!
//! let xml = sitemap.render()?;
//! assert!(xml.contains("<loc>https://example.com/blog/hello</loc>"));
//! # Ok::<(), smap_sitemap::SitemapError>(())
//! ```

mod cache;
mod error;
mod exclusion;
mod expander;
mod index;
mod item;
mod render;
mod routes;
mod rules;
mod sitemap;

pub use cache::{Clock, FixedClock, ItemCache, SystemClock};
pub use error::{RenderError, SitemapError};
pub use exclusion::without_ignored;
pub use expander::{Expander, RouteTemplate, is_dynamic};
pub use index::SitemapIndex;
pub use item::{IndexItem, Item};
pub use render::{CONTENT_TYPE, DocumentKind, Element, SITEMAP_NS, XmlRenderer};
pub use routes::RouteSource;
pub use rules::{Rule, RuleRegistry};
pub use sitemap::Sitemap;
