//! Models backed by raw extraction instead of an ORM.

use std::fmt;
use std::path::Path;

use crate::{Model, Row, SourceError, Value};

type Extractor = Box<dyn Fn() -> Result<Vec<Vec<Value>>, SourceError> + Send + Sync>;

/// A model whose rows come from an extractor returning positional tuples.
///
/// Column names are given up front and zipped with each tuple, so a raw SQL
/// query can feed sitemap rules without an ORM.
///
/// ```
/// use smap_source::{LocalModel, Model, Value};
///
/// let tags = LocalModel::new("tags", ["slug", "updated"], || {
///     Ok(vec![vec![Value::from("rust"), Value::Null]])
/// });
/// let rows = tags.all()?;
/// assert_eq!(rows[0].get("slug"), Some(&Value::from("rust")));
/// # Ok::<(), smap_source::SourceError>(())
/// ```
pub struct LocalModel {
    name: String,
    columns: Vec<String>,
    extractor: Extractor,
}

impl LocalModel {
    /// Create a model named `name` with the given column names.
    pub fn new<C, S, F>(name: impl Into<String>, columns: C, extractor: F) -> Self
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn() -> Result<Vec<Vec<Value>>, SourceError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            extractor: Box::new(extractor),
        }
    }

    /// Column names in tuple order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Model for LocalModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_attribute(&self, attr: &str) -> bool {
        self.columns.iter().any(|c| c == attr)
    }

    fn all(&self) -> Result<Vec<Row>, SourceError> {
        let tuples = (self.extractor)()?;
        tuples
            .into_iter()
            .enumerate()
            .map(|(idx, tuple)| {
                if tuple.len() != self.columns.len() {
                    return Err(SourceError::invalid_data(
                        &self.name,
                        format!(
                            "row {idx} has {} values, expected {}",
                            tuple.len(),
                            self.columns.len()
                        ),
                    ));
                }
                Ok(self.columns.iter().cloned().zip(tuple).collect::<Row>())
            })
            .collect()
    }
}

impl fmt::Debug for LocalModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalModel")
            .field("name", &self.name)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

/// A snapshot of model rows loaded from a JSON array of objects.
///
/// The snapshot answers every ORM query, so a dump exported from any
/// application can be used regardless of the configured ORM.
#[derive(Debug, Clone)]
pub struct JsonModel {
    name: String,
    rows: Vec<Row>,
}

impl JsonModel {
    /// Create a model from rows already in memory.
    #[must_use]
    pub fn from_rows(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Parse a JSON array of objects.
    ///
    /// `origin` is the path reported in parse errors.
    pub fn parse(name: impl Into<String>, content: &str, origin: &Path) -> Result<Self, SourceError> {
        let name = name.into();
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|source| SourceError::Json {
                path: origin.to_path_buf(),
                source,
            })?;

        let serde_json::Value::Array(records) = value else {
            return Err(SourceError::invalid_data(&name, "expected a JSON array"));
        };

        let rows = records
            .iter()
            .enumerate()
            .map(|(idx, record)| match record {
                serde_json::Value::Object(fields) => Ok(fields
                    .iter()
                    .map(|(attr, v)| (attr.clone(), Value::from_json(v)))
                    .collect::<Row>()),
                _ => Err(SourceError::invalid_data(
                    &name,
                    format!("record {idx} is not an object"),
                )),
            })
            .collect::<Result<Vec<Row>, _>>()?;

        Ok(Self::from_rows(name, rows))
    }

    /// Load rows from a JSON file.
    pub fn load(name: impl Into<String>, path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::parse(name, &content, path)?;
        tracing::debug!(model = %model.name, path = %path.display(), rows = model.rows.len(), "Loaded model file");
        Ok(model)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the snapshot holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Model for JsonModel {
    fn name(&self) -> &str {
        &self.name
    }

    /// Rows may be sparse, so any row carrying `attr` counts. An empty
    /// snapshot has no known schema and accepts every attribute.
    fn has_attribute(&self, attr: &str) -> bool {
        self.rows.is_empty() || self.rows.iter().any(|row| row.get(attr).is_some())
    }

    fn objects_all(&self) -> Result<Vec<Row>, SourceError> {
        Ok(self.rows.clone())
    }

    fn select(&self) -> Result<Vec<Row>, SourceError> {
        Ok(self.rows.clone())
    }

    fn query_all(&self) -> Result<Vec<Row>, SourceError> {
        Ok(self.rows.clone())
    }

    fn all(&self) -> Result<Vec<Row>, SourceError> {
        Ok(self.rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::Orm;

    fn local_model() -> LocalModel {
        LocalModel::new("local", ["slug", "lastmod"], || {
            let date = NaiveDate::from_ymd_opt(2020, 2, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            Ok(vec![
                vec![Value::from("slug1"), Value::from(date)],
                vec![Value::from("slug2"), Value::from(date)],
            ])
        })
    }

    #[test]
    fn test_local_model_zips_columns() {
        let rows = local_model().all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("slug"), Some(&Value::from("slug2")));
        assert!(matches!(rows[1].get("lastmod"), Some(Value::DateTime(_))));
    }

    #[test]
    fn test_local_model_attributes() {
        let model = local_model();
        assert!(model.has_attribute("slug"));
        assert!(model.has_attribute("lastmod"));
        assert!(!model.has_attribute("title"));
        assert_eq!(model.columns(), ["slug", "lastmod"]);
    }

    #[test]
    fn test_local_model_answers_only_local_queries() {
        let model = local_model();
        assert!(Orm::Local.fetch_all(&model).is_ok());
        assert!(matches!(
            Orm::Peewee.fetch_all(&model),
            Err(SourceError::Unsupported { query: "select()", .. })
        ));
    }

    #[test]
    fn test_local_model_rejects_short_tuple() {
        let model = LocalModel::new("broken", ["slug", "lastmod"], || {
            Ok(vec![vec![Value::from("only-slug")]])
        });
        let err = model.all().unwrap_err();
        assert!(err.to_string().contains("row 0 has 1 values, expected 2"));
    }

    #[test]
    fn test_local_model_propagates_extractor_error() {
        let model = LocalModel::new("db", ["slug"], || {
            Err(SourceError::backend("db", std::io::Error::other("timeout")))
        });
        assert!(matches!(model.all(), Err(SourceError::Backend { .. })));
    }

    #[test]
    fn test_json_model_parse() {
        let content = r#"[
            {"slug": "a", "updated": "2020-01-01"},
            {"slug": "b", "updated": null, "views": 10}
        ]"#;
        let model = JsonModel::parse("posts", content, Path::new("posts.json")).unwrap();

        assert_eq!(model.len(), 2);
        assert!(model.has_attribute("slug"));
        assert!(model.has_attribute("views"));
        assert!(!model.has_attribute("title"));

        let rows = Orm::Django.fetch_all(&model).unwrap();
        assert_eq!(
            rows[0].get("updated"),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()))
        );
        assert_eq!(rows[1].get("updated"), Some(&Value::Null));
    }

    #[test]
    fn test_json_model_empty_accepts_any_attribute() {
        let model = JsonModel::parse("empty", "[]", Path::new("empty.json")).unwrap();
        assert!(model.is_empty());
        assert!(model.has_attribute("anything"));
    }

    #[test]
    fn test_json_model_rejects_non_array() {
        let err = JsonModel::parse("posts", r#"{"slug": "a"}"#, Path::new("p.json")).unwrap_err();
        assert!(err.to_string().contains("expected a JSON array"));

        let err = JsonModel::parse("posts", r#"["a"]"#, Path::new("p.json")).unwrap_err();
        assert!(err.to_string().contains("record 0 is not an object"));
    }

    #[test]
    fn test_json_model_invalid_json_reports_path() {
        let err = JsonModel::parse("posts", "[", Path::new("data/posts.json")).unwrap_err();
        assert!(matches!(err, SourceError::Json { .. }));
        assert!(err.to_string().contains("data/posts.json"));
    }

    #[test]
    fn test_json_model_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tags.json");
        std::fs::write(&path, r#"[{"slug": "rust"}]"#).unwrap();

        let model = JsonModel::load("tags", &path).unwrap();
        assert_eq!(model.name(), "tags");
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_json_model_load_missing_file() {
        let err = JsonModel::load("tags", Path::new("/nonexistent/tags.json")).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
