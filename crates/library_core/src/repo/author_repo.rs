//! Author repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `authors`.
//! - Answer name searches and co-authorship checks over `book_authors`.
//!
//! # Invariants
//! - Listing and search results are sorted by case-folded name, then raw
//!   name, then id.
//! - Name search is a literal, Unicode case-insensitive substring match.

use crate::model::author::{Author, AuthorId};
use crate::repo::crud::{CrudRepository, RepoError, RepoResult};
use crate::repo::support::{ensure_connection_ready, TableSpec};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ENTITY: &str = "author";

const REQUIRED_TABLES: &[TableSpec] = &[
    ("authors", &["id", "full_name"]),
    ("book_authors", &["book_id", "author_id"]),
];

const AUTHOR_SELECT_SQL: &str = "SELECT id, full_name FROM authors";

const AUTHOR_ORDER_SQL: &str = "ORDER BY casefold(full_name) ASC, full_name ASC, id ASC";

/// Repository interface for author operations.
pub trait AuthorRepository: CrudRepository<Id = AuthorId, Entity = Author> {
    /// Finds authors whose name contains `name_part`, ignoring case.
    fn search_by_name(&self, name_part: &str) -> RepoResult<Vec<Author>>;
    /// Returns whether the author shares at least one book with another author.
    fn check_author_by_id_having_co_authored_books(&self, author_id: AuthorId) -> RepoResult<bool>;
}

/// SQLite-backed author repository.
pub struct SqliteAuthorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuthorRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn query_authors(&self, sql: &str, bind: &[&dyn rusqlite::ToSql]) -> RepoResult<Vec<Author>> {
        let mut stmt = self.conn.prepare(sql)?;
        let authors = stmt
            .query_map(bind, parse_author_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(authors)
    }
}

impl CrudRepository for SqliteAuthorRepository<'_> {
    type Id = AuthorId;
    type Entity = Author;

    fn save(&self, author: &Author) -> RepoResult<Author> {
        self.conn.execute(
            "INSERT INTO authors (id, full_name) VALUES (?1, ?2);",
            params![author.id, author.full_name.as_str()],
        )?;

        Ok(Author {
            id: Some(author.id.unwrap_or_else(|| self.conn.last_insert_rowid())),
            full_name: author.full_name.clone(),
        })
    }

    fn get(&self, id: AuthorId) -> RepoResult<Option<Author>> {
        let author = self
            .conn
            .query_row(
                &format!("{AUTHOR_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_author_row,
            )
            .optional()?;
        Ok(author)
    }

    fn update(&self, author: &Author) -> RepoResult<()> {
        let id = author.id.ok_or(RepoError::Detached(ENTITY))?;
        let changed = self.conn.execute(
            "UPDATE authors SET full_name = ?1 WHERE id = ?2;",
            params![author.full_name.as_str(), id],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        Ok(())
    }

    fn delete(&self, author: &Author) -> RepoResult<()> {
        let id = author.id.ok_or(RepoError::Detached(ENTITY))?;
        let changed = self
            .conn
            .execute("DELETE FROM authors WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        Ok(())
    }

    fn all(&self) -> RepoResult<Vec<Author>> {
        self.query_authors(
            &format!("{AUTHOR_SELECT_SQL} {AUTHOR_ORDER_SQL};"),
            &[],
        )
    }
}

impl AuthorRepository for SqliteAuthorRepository<'_> {
    fn search_by_name(&self, name_part: &str) -> RepoResult<Vec<Author>> {
        self.query_authors(
            &format!(
                "{AUTHOR_SELECT_SQL}
                 WHERE instr(casefold(full_name), casefold(?1)) > 0
                 {AUTHOR_ORDER_SQL};"
            ),
            &[&name_part],
        )
    }

    fn check_author_by_id_having_co_authored_books(&self, author_id: AuthorId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM book_authors mine
                INNER JOIN book_authors other ON other.book_id = mine.book_id
                WHERE mine.author_id = ?1
                  AND other.author_id <> mine.author_id
            );",
            [author_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn parse_author_row(row: &Row<'_>) -> rusqlite::Result<Author> {
    Ok(Author {
        id: Some(row.get("id")?),
        full_name: row.get("full_name")?,
    })
}
