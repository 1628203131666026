//! Schema upgrades for the library store.
//!
//! # Invariants
//! - Versions are contiguous and start at 1.
//! - An upgrade runs in one transaction: either every pending script and its
//!   `user_version` bump land, or none do.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

impl Migration {
    fn apply(&self, conn: &Connection) -> DbResult<()> {
        conn.execute_batch(self.sql)
            .and_then(|()| conn.pragma_update(None, "user_version", self.version))
            .map_err(|source| DbError::Migration {
                version: self.version,
                name: self.name,
                source,
            })?;

        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            self.version, self.name
        );
        Ok(())
    }
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "catalog_and_circulation",
    sql: include_str!("0001_init.sql"),
}];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings the store up to [`latest_version`].
///
/// # Errors
/// - `SchemaTooNew` when the store is ahead of this build.
/// - `Migration` naming the first script that failed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = current_user_version(conn)?;
    let supported = latest_version();
    match found.cmp(&supported) {
        Ordering::Greater => return Err(DbError::SchemaTooNew { found, supported }),
        Ordering::Equal => return Ok(()),
        Ordering::Less => {}
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().skip_while(|m| m.version <= found) {
        migration.apply(&tx)?;
    }
    tx.commit()?;
    Ok(())
}

/// Reads the schema version stored in `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
