//! Access strategy selection.

use std::fmt;
use std::sync::Arc;

use crate::{Model, Row, SourceError};

/// Names accepted by [`Orm::from_name`].
pub(crate) const KNOWN_ORMS: [&str; 4] = ["django", "peewee", "sqlalchemy", "local"];

/// User-supplied fetch function for [`Orm::Custom`].
pub type Fetcher = Arc<dyn Fn(&dyn Model) -> Result<Vec<Row>, SourceError> + Send + Sync>;

/// How rows are fetched from a [`Model`].
#[derive(Clone, Default)]
pub enum Orm {
    /// `Model.objects.all()`
    Django,
    /// `Model.select()`
    Peewee,
    /// `Model.query.all()`
    SqlAlchemy,
    /// Raw extraction through [`Model::all`].
    #[default]
    Local,
    /// Caller-provided fetch function.
    Custom(Fetcher),
}

impl Orm {
    /// Select a strategy by name, case-insensitively.
    ///
    /// `None` selects [`Orm::Local`].
    pub fn from_name(name: Option<&str>) -> Result<Self, SourceError> {
        let Some(name) = name else {
            return Ok(Self::Local);
        };
        match name.to_ascii_lowercase().as_str() {
            "django" => Ok(Self::Django),
            "peewee" => Ok(Self::Peewee),
            "sqlalchemy" => Ok(Self::SqlAlchemy),
            "local" => Ok(Self::Local),
            _ => Err(SourceError::UnknownOrm {
                name: name.to_owned(),
            }),
        }
    }

    /// Wrap a fetch function.
    pub fn custom<F>(fetch: F) -> Self
    where
        F: Fn(&dyn Model) -> Result<Vec<Row>, SourceError> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(fetch))
    }

    /// Strategy name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Django => "django",
            Self::Peewee => "peewee",
            Self::SqlAlchemy => "sqlalchemy",
            Self::Local => "local",
            Self::Custom(_) => "custom",
        }
    }

    /// Fetch every row of `model`.
    pub fn fetch_all(&self, model: &dyn Model) -> Result<Vec<Row>, SourceError> {
        let rows = match self {
            Self::Django => model.objects_all(),
            Self::Peewee => model.select(),
            Self::SqlAlchemy => model.query_all(),
            Self::Local => model.all(),
            Self::Custom(fetch) => fetch(model),
        }?;
        tracing::debug!(model = model.name(), orm = self.name(), rows = rows.len(), "Fetched rows");
        Ok(rows)
    }
}

impl fmt::Debug for Orm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
