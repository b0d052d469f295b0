//! Data-source adapters for smap.
//!
//! Sitemap rules expand route templates from the records of a data model.
//! This crate provides the uniform "fetch all rows for a model" contract:
//!
//! - [`Model`] trait: attribute introspection plus one query per access technology
//! - [`Orm`]: strategy selected by name (`django`, `peewee`, `sqlalchemy`, `local`) or a custom fetcher
//! - [`Row`] and [`Value`]: named attributes of a single record
//! - [`LocalModel`]: raw extraction returning positional tuples
//! - [`JsonModel`]: row snapshot loaded from a JSON file
//! - [`MockModel`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```
//! use smap_source::{JsonModel, Orm, Row};
//!
//! let posts = JsonModel::from_rows("posts", vec![Row::new().with("slug", "hello")]);
//! let orm = Orm::from_name(Some("SQLAlchemy"))?;
//! let rows = orm.fetch_all(&posts)?;
//! assert_eq!(rows.len(), 1);
//! # Ok::<(), smap_source::SourceError>(())
//! ```

mod error;
mod local;
#[cfg(feature = "mock")]
mod mock;
mod model;
mod orm;
mod row;

pub use error::SourceError;
pub use local::{JsonModel, LocalModel};
#[cfg(feature = "mock")]
pub use mock::MockModel;
pub use model::Model;
pub use orm::{Fetcher, Orm};
pub use row::{Row, Value};
