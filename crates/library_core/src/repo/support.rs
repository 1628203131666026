//! Shared SQL helpers for repository implementations.

use crate::db::migrations::{current_user_version, latest_version};
use crate::repo::crud::{RepoError, RepoResult};
use chrono::{DateTime, Utc};
use log::warn;
use rusqlite::Connection;
use std::ops::Deref;
use uuid::Uuid;

const WRITE_SAVEPOINT: &str = "library_repo_write";

/// Table plus the columns a repository reads or writes.
pub(crate) type TableSpec = (&'static str, &'static [&'static str]);

/// Rejects connections that were not opened through `db::open_db*`.
pub(crate) fn ensure_connection_ready(conn: &Connection, tables: &[TableSpec]) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

/// Multi-statement write scope over a shared connection.
///
/// Backed by a SQLite savepoint, so it nests inside a transaction the caller
/// already opened. Dropping the scope without [`WriteScope::release`] undoes
/// only the writes made through it.
pub(crate) struct WriteScope<'conn> {
    conn: &'conn Connection,
    released: bool,
}

impl<'conn> WriteScope<'conn> {
    pub(crate) fn begin(conn: &'conn Connection) -> RepoResult<Self> {
        conn.execute_batch(&format!("SAVEPOINT {WRITE_SAVEPOINT};"))?;
        Ok(Self {
            conn,
            released: false,
        })
    }

    /// Keeps the scope's writes. Commits when no outer transaction is open.
    pub(crate) fn release(mut self) -> RepoResult<()> {
        self.conn.execute_batch(&format!("RELEASE {WRITE_SAVEPOINT};"))?;
        self.released = true;
        Ok(())
    }
}

impl Deref for WriteScope<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn
    }
}

impl Drop for WriteScope<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.conn.execute_batch(&format!(
            "ROLLBACK TO {WRITE_SAVEPOINT}; RELEASE {WRITE_SAVEPOINT};"
        )) {
            warn!("event=repo_rollback module=repo status=error error={err}");
        }
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// Converts an instant to the epoch milliseconds stored in SQLite.
pub(crate) fn to_epoch_ms(value: DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

pub(crate) fn from_epoch_ms(value: i64, column: &'static str) -> RepoResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(value).ok_or_else(|| {
        RepoError::InvalidData(format!("epoch milliseconds `{value}` out of range in {column}"))
    })
}

/// Drops sub-millisecond precision the store cannot keep.
pub(crate) fn truncate_to_millis(value: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(value.timestamp_millis()).unwrap_or(value)
}

pub(crate) fn count_to_u32(value: i64, what: &'static str) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("{what} count `{value}` out of range")))
}

#[cfg(test)]
mod tests {
    use super::{from_epoch_ms, to_epoch_ms, truncate_to_millis};
    use chrono::{TimeZone, Utc};

    #[test]
    fn truncation_matches_stored_precision() {
        let precise = Utc
            .with_ymd_and_hms(2024, 3, 1, 12, 30, 0)
            .unwrap()
            .checked_add_signed(chrono::TimeDelta::nanoseconds(1_234_567))
            .unwrap();
        let truncated = truncate_to_millis(precise);

        assert_eq!(truncated.timestamp_subsec_nanos(), 1_000_000);
        assert_eq!(from_epoch_ms(to_epoch_ms(precise), "t.c").unwrap(), truncated);
    }
}
