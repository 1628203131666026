//! Borrow repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `borrows` and their `borrow_books` links.
//! - Answer per-user loan queries and due-date window queries.
//!
//! # Invariants
//! - Write paths call `Borrow::validate()` before SQL mutations.
//! - A borrow row and its book links are written in one savepoint, which
//!   nests inside a transaction the caller already holds.
//! - Due instants are stored as epoch milliseconds.
//! - Due-date windows compare against the repository clock, not SQLite's.

use crate::clock::{Clock, SystemClock};
use crate::model::book::BookId;
use crate::model::borrow::{Borrow, BorrowId};
use crate::model::person::UserId;
use crate::repo::crud::{CrudRepository, RepoError, RepoResult};
use crate::repo::support::{
    bool_to_int, count_to_u32, ensure_connection_ready, from_epoch_ms, parse_bool, parse_uuid,
    to_epoch_ms, truncate_to_millis, TableSpec, WriteScope,
};
use chrono::{DateTime, TimeDelta, Utc};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::BTreeSet;

const ENTITY: &str = "borrow";

const REQUIRED_TABLES: &[TableSpec] = &[
    (
        "borrows",
        &[
            "uuid",
            "user_uuid",
            "librarian_uuid",
            "requested_return",
            "finished",
        ],
    ),
    ("borrow_books", &["borrow_uuid", "book_id"]),
];

const BORROW_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    librarian_uuid,
    requested_return,
    finished
FROM borrows";

/// Repository interface for loan operations.
pub trait BorrowRepository: CrudRepository<Id = BorrowId, Entity = Borrow> {
    /// Outstanding borrows of one user.
    fn find_in_progress_by_user(&self, user_id: UserId) -> RepoResult<Vec<Borrow>>;
    /// Number of borrow records of one user, finished or not.
    fn count_borrowed_books_by_user(&self, user_id: UserId) -> RepoResult<u32>;
    /// Number of outstanding borrow records of one user.
    fn count_current_borrowed_books_by_user(&self, user_id: UserId) -> RepoResult<u32>;
    /// Borrows due strictly before now, earliest due first.
    ///
    /// Finished borrows are included.
    fn found_all_late_borrow(&self) -> RepoResult<Vec<Borrow>>;
    /// Borrows due at or before now plus `days` days, earliest due first.
    ///
    /// There is no lower bound: already overdue borrows are included.
    fn find_all_borrow_that_will_late_within(&self, days: i32) -> RepoResult<Vec<Borrow>>;
}

/// SQLite-backed borrow repository.
pub struct SqliteBorrowRepository<'conn> {
    conn: &'conn Connection,
    clock: Box<dyn Clock>,
}

impl<'conn> SqliteBorrowRepository<'conn> {
    /// Creates repository from migrated connection, using the system clock.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self {
            conn,
            clock: Box::new(SystemClock),
        })
    }

    /// Replaces the clock used by due-date queries.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn query_borrows(&self, filter: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Borrow>> {
        let sql = format!("{BORROW_SELECT_SQL} {filter};");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut borrows = Vec::new();
        while let Some(row) = rows.next()? {
            let mut borrow = parse_borrow_row(row)?;
            borrow.books = load_books_for_borrow(self.conn, borrow.id)?;
            borrows.push(borrow);
        }
        Ok(borrows)
    }

    fn count_for_user(&self, user_id: UserId, only_in_progress: bool) -> RepoResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM borrows
             WHERE user_uuid = ?1
               AND (?2 = 0 OR finished = 0);",
            params![user_id.to_string(), bool_to_int(only_in_progress)],
            |row| row.get(0),
        )?;
        count_to_u32(count, "borrow")
    }
}

impl CrudRepository for SqliteBorrowRepository<'_> {
    type Id = BorrowId;
    type Entity = Borrow;

    fn save(&self, borrow: &Borrow) -> RepoResult<Borrow> {
        borrow.validate()?;

        let mut saved = borrow.clone();
        saved.requested_return = truncate_to_millis(borrow.requested_return);

        let scope = WriteScope::begin(self.conn)?;
        scope.execute(
            "INSERT INTO borrows (
                uuid,
                user_uuid,
                librarian_uuid,
                requested_return,
                finished
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                saved.id.to_string(),
                saved.borrower.to_string(),
                saved.librarian.to_string(),
                to_epoch_ms(saved.requested_return),
                bool_to_int(saved.finished),
            ],
        )?;
        insert_book_links(&scope, saved.id, &saved.books)?;
        scope.release()?;

        debug!(
            "event=repo_write module=repo entity=borrow op=save status=ok id={} books={}",
            saved.id,
            saved.books.len()
        );
        Ok(saved)
    }

    fn get(&self, id: BorrowId) -> RepoResult<Option<Borrow>> {
        let borrows = self.query_borrows(
            "WHERE uuid = ?1",
            vec![Value::Text(id.to_string())],
        )?;
        Ok(borrows.into_iter().next())
    }

    fn update(&self, borrow: &Borrow) -> RepoResult<()> {
        borrow.validate()?;

        let scope = WriteScope::begin(self.conn)?;
        let changed = scope.execute(
            "UPDATE borrows
             SET
                user_uuid = ?1,
                librarian_uuid = ?2,
                requested_return = ?3,
                finished = ?4
             WHERE uuid = ?5;",
            params![
                borrow.borrower.to_string(),
                borrow.librarian.to_string(),
                to_epoch_ms(borrow.requested_return),
                bool_to_int(borrow.finished),
                borrow.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, borrow.id));
        }

        scope.execute(
            "DELETE FROM borrow_books WHERE borrow_uuid = ?1;",
            [borrow.id.to_string()],
        )?;
        insert_book_links(&scope, borrow.id, &borrow.books)?;
        scope.release()?;

        debug!(
            "event=repo_write module=repo entity=borrow op=update status=ok id={} finished={}",
            borrow.id, borrow.finished
        );
        Ok(())
    }

    fn delete(&self, borrow: &Borrow) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM borrows WHERE uuid = ?1;",
            [borrow.id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, borrow.id));
        }

        debug!(
            "event=repo_write module=repo entity=borrow op=delete status=ok id={}",
            borrow.id
        );
        Ok(())
    }

    fn all(&self) -> RepoResult<Vec<Borrow>> {
        self.query_borrows("ORDER BY rowid ASC", Vec::new())
    }
}

impl BorrowRepository for SqliteBorrowRepository<'_> {
    fn find_in_progress_by_user(&self, user_id: UserId) -> RepoResult<Vec<Borrow>> {
        self.query_borrows(
            "WHERE user_uuid = ?1 AND finished = 0 ORDER BY rowid ASC",
            vec![Value::Text(user_id.to_string())],
        )
    }

    fn count_borrowed_books_by_user(&self, user_id: UserId) -> RepoResult<u32> {
        self.count_for_user(user_id, false)
    }

    fn count_current_borrowed_books_by_user(&self, user_id: UserId) -> RepoResult<u32> {
        self.count_for_user(user_id, true)
    }

    fn found_all_late_borrow(&self) -> RepoResult<Vec<Borrow>> {
        let now = self.clock.now();
        self.query_borrows(
            "WHERE requested_return < ?1 ORDER BY requested_return ASC, rowid ASC",
            vec![Value::Integer(to_epoch_ms(now))],
        )
    }

    fn find_all_borrow_that_will_late_within(&self, days: i32) -> RepoResult<Vec<Borrow>> {
        let due_limit = shift_by_days(self.clock.now(), days);
        self.query_borrows(
            "WHERE requested_return <= ?1 ORDER BY requested_return ASC, rowid ASC",
            vec![Value::Integer(to_epoch_ms(due_limit))],
        )
    }
}

/// Moves `now` by whole days, saturating at the representable range.
fn shift_by_days(now: DateTime<Utc>, days: i32) -> DateTime<Utc> {
    now.checked_add_signed(TimeDelta::days(i64::from(days)))
        .unwrap_or(if days >= 0 {
            DateTime::<Utc>::MAX_UTC
        } else {
            DateTime::<Utc>::MIN_UTC
        })
}

fn insert_book_links(
    conn: &Connection,
    borrow_id: BorrowId,
    books: &BTreeSet<BookId>,
) -> RepoResult<()> {
    let borrow_uuid = borrow_id.to_string();
    let mut stmt =
        conn.prepare("INSERT INTO borrow_books (borrow_uuid, book_id) VALUES (?1, ?2);")?;
    for book_id in books {
        stmt.execute(params![borrow_uuid.as_str(), book_id])?;
    }
    Ok(())
}

fn load_books_for_borrow(conn: &Connection, borrow_id: BorrowId) -> RepoResult<BTreeSet<BookId>> {
    let mut stmt = conn.prepare("SELECT book_id FROM borrow_books WHERE borrow_uuid = ?1;")?;
    let books = stmt
        .query_map([borrow_id.to_string()], |row| row.get::<_, BookId>(0))?
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(books)
}

fn parse_borrow_row(row: &Row<'_>) -> RepoResult<Borrow> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;
    let librarian_text: String = row.get("librarian_uuid")?;

    Ok(Borrow {
        id: parse_uuid(&uuid_text, "borrows.uuid")?,
        borrower: parse_uuid(&user_text, "borrows.user_uuid")?,
        librarian: parse_uuid(&librarian_text, "borrows.librarian_uuid")?,
        books: BTreeSet::new(),
        requested_return: from_epoch_ms(row.get("requested_return")?, "borrows.requested_return")?,
        finished: parse_bool(row.get("finished")?, "borrows.finished")?,
    })
}
