//! Librarian repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `librarians`.
//! - Rank librarians by the number of borrows they recorded.

use crate::model::person::{Librarian, LibrarianId};
use crate::repo::crud::{CrudRepository, RepoError, RepoResult};
use crate::repo::ranking::rank_by_frequency;
use crate::repo::support::{ensure_connection_ready, parse_uuid, TableSpec};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

const ENTITY: &str = "librarian";

const TOP_WORKING_LIMIT: usize = 3;

const REQUIRED_TABLES: &[TableSpec] = &[
    ("librarians", &["uuid", "first_name", "last_name"]),
    ("borrows", &["uuid", "librarian_uuid"]),
];

const LIBRARIAN_SELECT_SQL: &str = "SELECT uuid, first_name, last_name FROM librarians";

/// Repository interface for library staff.
pub trait LibrarianRepository: CrudRepository<Id = LibrarianId, Entity = Librarian> {
    /// Up to three librarians with the most recorded borrows, busiest first.
    fn top3_working_librarians(&self) -> RepoResult<Vec<Librarian>>;
}

/// SQLite-backed librarian repository.
pub struct SqliteLibrarianRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLibrarianRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    /// Up to `limit` librarians ordered by recorded borrow count.
    ///
    /// Ties go to the librarian who first reaches the winning count while
    /// scanning borrows in insertion order.
    pub fn top_working_librarians(&self, limit: usize) -> RepoResult<Vec<Librarian>> {
        let mut stmt = self
            .conn
            .prepare("SELECT librarian_uuid FROM borrows ORDER BY rowid ASC;")?;
        let mut rows = stmt.query([])?;
        let mut recorded_by = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get(0)?;
            recorded_by.push(parse_uuid(&uuid_text, "borrows.librarian_uuid")?);
        }

        let ranked = rank_by_frequency(&recorded_by, limit);
        let mut librarians = Vec::with_capacity(ranked.len());
        for id in ranked {
            let librarian = self.get(id)?.ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "borrows.librarian_uuid `{id}` has no librarians row"
                ))
            })?;
            librarians.push(librarian);
        }

        info!(
            "event=librarian_ranking module=repo status=ok borrows={} ranked={}",
            recorded_by.len(),
            librarians.len()
        );
        Ok(librarians)
    }
}

impl CrudRepository for SqliteLibrarianRepository<'_> {
    type Id = LibrarianId;
    type Entity = Librarian;

    fn save(&self, librarian: &Librarian) -> RepoResult<Librarian> {
        librarian.validate()?;
        self.conn.execute(
            "INSERT INTO librarians (uuid, first_name, last_name) VALUES (?1, ?2, ?3);",
            params![
                librarian.id.to_string(),
                librarian.first_name.as_str(),
                librarian.last_name.as_str(),
            ],
        )?;
        Ok(librarian.clone())
    }

    fn get(&self, id: LibrarianId) -> RepoResult<Option<Librarian>> {
        let uuid_text = id.to_string();
        let row = self
            .conn
            .query_row(
                &format!("{LIBRARIAN_SELECT_SQL} WHERE uuid = ?1;"),
                [uuid_text.as_str()],
                read_librarian_columns,
            )
            .optional()?;
        row.map(into_librarian).transpose()
    }

    fn update(&self, librarian: &Librarian) -> RepoResult<()> {
        librarian.validate()?;
        let changed = self.conn.execute(
            "UPDATE librarians SET first_name = ?1, last_name = ?2 WHERE uuid = ?3;",
            params![
                librarian.first_name.as_str(),
                librarian.last_name.as_str(),
                librarian.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, librarian.id));
        }
        Ok(())
    }

    fn delete(&self, librarian: &Librarian) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM librarians WHERE uuid = ?1;",
            [librarian.id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, librarian.id));
        }
        Ok(())
    }

    fn all(&self) -> RepoResult<Vec<Librarian>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LIBRARIAN_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let columns = stmt
            .query_map([], read_librarian_columns)?
            .collect::<Result<Vec<_>, _>>()?;
        columns.into_iter().map(into_librarian).collect()
    }
}

impl LibrarianRepository for SqliteLibrarianRepository<'_> {
    fn top3_working_librarians(&self) -> RepoResult<Vec<Librarian>> {
        self.top_working_librarians(TOP_WORKING_LIMIT)
    }
}

type LibrarianColumns = (String, String, String);

fn read_librarian_columns(row: &Row<'_>) -> rusqlite::Result<LibrarianColumns> {
    Ok((
        row.get("uuid")?,
        row.get("first_name")?,
        row.get("last_name")?,
    ))
}

fn into_librarian((uuid_text, first_name, last_name): LibrarianColumns) -> RepoResult<Librarian> {
    Ok(Librarian {
        id: parse_uuid(&uuid_text, "librarians.uuid")?,
        first_name,
        last_name,
    })
}
