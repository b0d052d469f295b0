//! Mock model implementation for testing.
//!
//! Provides [`MockModel`] for unit testing sitemap rules without a database.

use std::collections::BTreeSet;
use std::sync::RwLock;

use crate::{Model, Row, SourceError, Value};

/// Mock model for testing.
///
/// Answers every ORM query with the configured rows and records which query
/// was issued. Use the builder methods to configure the mock with test data.
///
/// # Example
///
/// ```ignore
/// use smap_source::{MockModel, Orm};
///
/// let posts = MockModel::new("Post")
///     .with_attributes(["slug", "updated"])
///     .with_row([("slug", "first-slug")]);
///
/// let rows = Orm::Django.fetch_all(&posts).unwrap();
/// assert_eq!(posts.queries(), vec!["objects.all()"]);
/// ```
#[derive(Debug)]
pub struct MockModel {
    name: String,
    attributes: BTreeSet<String>,
    rows: Vec<Row>,
    failure: Option<String>,
    queries: RwLock<Vec<&'static str>>,
}

impl MockModel {
    /// Create a new mock model without rows or attributes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeSet::new(),
            rows: Vec::new(),
            failure: None,
            queries: RwLock::new(Vec::new()),
        }
    }

    /// Declare attributes reported by [`Model::has_attribute`].
    #[must_use]
    pub fn with_attributes<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.extend(attrs.into_iter().map(Into::into));
        self
    }

    /// Add a row. Its attribute names are declared as well.
    #[must_use]
    pub fn with_row<I, K, V>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let row: Row = attrs.into_iter().collect();
        self.attributes
            .extend(row.attributes().map(str::to_owned));
        self.rows.push(row);
        self
    }

    /// Make every query fail with a backend error carrying `message`.
    #[must_use]
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Queries issued so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn queries(&self) -> Vec<&'static str> {
        self.queries.read().unwrap().clone()
    }

    fn answer(&self, query: &'static str) -> Result<Vec<Row>, SourceError> {
        self.queries.write().unwrap().push(query);
        match &self.failure {
            Some(message) => Err(SourceError::backend(
                &self.name,
                std::io::Error::other(message.clone()),
            )),
            None => Ok(self.rows.clone()),
        }
    }
}

impl Model for MockModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_attribute(&self, attr: &str) -> bool {
        self.attributes.contains(attr)
    }

    fn objects_all(&self) -> Result<Vec<Row>, SourceError> {
        self.answer("objects.all()")
    }

    fn select(&self) -> Result<Vec<Row>, SourceError> {
        self.answer("select()")
    }

    fn query_all(&self) -> Result<Vec<Row>, SourceError> {
        self.answer("query.all()")
    }

    fn all(&self) -> Result<Vec<Row>, SourceError> {
        self.answer("all()")
    }
}
