//! Generic repository contract and error taxonomy.
//!
//! # Responsibility
//! - Define the CRUD surface every entity repository exposes.
//! - Translate SQLite failures into semantic repository errors.
//!
//! # Invariants
//! - `get` reports a missing row as `Ok(None)`, never as an error.
//! - `update`/`delete` report a missing row as `NotFound`.
//! - Constraint failures surface as `ConstraintViolation` and are never
//!   retried or swallowed.

use crate::db::DbError;
use crate::model::ModelValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every entity repository.
#[derive(Debug)]
pub enum RepoError {
    /// Model invariant rejected before any SQL ran.
    Validation(ModelValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Update/delete target row does not exist.
    NotFound { entity: &'static str, id: String },
    /// Update/delete called with an entity that was never saved.
    Detached(&'static str),
    /// Duplicate identity, dangling reference or delete of a referenced row.
    ConstraintViolation(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted row cannot be decoded into a model value.
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Detached(entity) => write!(f, "{entity} has no identity; save it first"),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::ConstraintViolation(message.unwrap_or_else(|| failure.to_string()))
            }
            other => Self::Db(DbError::Sqlite(other)),
        }
    }
}

/// CRUD contract shared by all entity repositories.
pub trait CrudRepository {
    type Id;
    type Entity;

    /// Persists a new entity and returns its stored representation.
    fn save(&self, entity: &Self::Entity) -> RepoResult<Self::Entity>;
    /// Loads one entity by identity.
    fn get(&self, id: Self::Id) -> RepoResult<Option<Self::Entity>>;
    /// Writes back the mutable fields of a saved entity.
    fn update(&self, entity: &Self::Entity) -> RepoResult<()>;
    /// Removes a saved entity.
    fn delete(&self, entity: &Self::Entity) -> RepoResult<()>;
    /// Lists every entity in the repository's natural order.
    fn all(&self) -> RepoResult<Vec<Self::Entity>>;
}

#[cfg(test)]
mod tests {
    use super::RepoError;
    use rusqlite::Connection;

    #[test]
    fn constraint_failures_map_to_constraint_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY);")
            .unwrap();
        conn.execute("INSERT INTO t (id) VALUES (1);", []).unwrap();

        let err = conn.execute("INSERT INTO t (id) VALUES (1);", []).unwrap_err();
        assert!(matches!(
            RepoError::from(err),
            RepoError::ConstraintViolation(_)
        ));
    }

    #[test]
    fn other_sqlite_failures_stay_db_errors() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn.execute("SELECT * FROM missing;", []).unwrap_err();
        assert!(matches!(RepoError::from(err), RepoError::Db(_)));
    }
}
