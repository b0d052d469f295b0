//! The capability interface every data model implements.

use crate::{Row, SourceError};

/// A collection of records that sitemap rules expand routes from.
///
/// Each access technology issues a different query to fetch every record.
/// A model answers the queries it supports; the rest fail with
/// [`SourceError::Unsupported`].
pub trait Model: Send + Sync {
    /// Name used in error messages and logs.
    fn name(&self) -> &str;

    /// Whether rows of this model carry `attr`.
    fn has_attribute(&self, attr: &str) -> bool;

    /// `Model.objects.all()`.
    fn objects_all(&self) -> Result<Vec<Row>, SourceError> {
        Err(SourceError::unsupported(self.name(), "objects.all()"))
    }

    /// `Model.select()`.
    fn select(&self) -> Result<Vec<Row>, SourceError> {
        Err(SourceError::unsupported(self.name(), "select()"))
    }

    /// `Model.query.all()`.
    fn query_all(&self) -> Result<Vec<Row>, SourceError> {
        Err(SourceError::unsupported(self.name(), "query.all()"))
    }

    /// Raw extraction without an ORM.
    fn all(&self) -> Result<Vec<Row>, SourceError> {
        Err(SourceError::unsupported(self.name(), "all()"))
    }
}

impl std::fmt::Debug for dyn Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Model({})", self.name())
    }
}
