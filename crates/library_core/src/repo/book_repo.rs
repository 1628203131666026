//! Book repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `books` and their `book_authors` links.
//! - Own the catalog finder queries (title, author, author count).
//!
//! # Invariants
//! - A book row and its author links are written in one savepoint, which
//!   nests inside a transaction the caller already holds.
//! - Every listing is sorted by case-folded title (then raw title, then id)
//!   and returns each book once.
//! - Substring predicates are literal and Unicode case-insensitive.

use crate::model::author::AuthorId;
use crate::model::book::{Book, BookId, Language};
use crate::repo::crud::{CrudRepository, RepoError, RepoResult};
use crate::repo::support::{ensure_connection_ready, TableSpec, WriteScope};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::BTreeSet;

const ENTITY: &str = "book";

const REQUIRED_TABLES: &[TableSpec] = &[
    (
        "books",
        &["id", "title", "isbn", "publisher", "year", "language"],
    ),
    ("book_authors", &["book_id", "author_id"]),
];

const BOOK_SELECT_SQL: &str = "SELECT
    id,
    title,
    isbn,
    publisher,
    year,
    language
FROM books";

const BOOK_ORDER_SQL: &str = "ORDER BY casefold(title) ASC, title ASC, id ASC";

/// Repository interface for catalog operations.
pub trait BookRepository: CrudRepository<Id = BookId, Entity = Book> {
    /// Books whose title contains `title_part`, ignoring case.
    fn find_by_containing_title(&self, title_part: &str) -> RepoResult<Vec<Book>>;
    /// Every book of one author.
    fn find_by_author_id(&self, author_id: AuthorId) -> RepoResult<Vec<Book>>;
    /// Books of one author whose title contains `title_part`, ignoring case.
    fn find_by_author_id_and_containing_title(
        &self,
        author_id: AuthorId,
        title_part: &str,
    ) -> RepoResult<Vec<Book>>;
    /// Books having at least one author whose name contains `name_part`.
    fn find_books_by_author_containing_name(&self, name_part: &str) -> RepoResult<Vec<Book>>;
    /// Books with strictly more than `count` authors.
    fn find_books_having_authors_count(&self, count: u32) -> RepoResult<Vec<Book>>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn query_books(&self, filter: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Book>> {
        let sql = format!("{BOOK_SELECT_SQL} {filter} {BOOK_ORDER_SQL};");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            let mut book = parse_book_row(row)?;
            if let Some(id) = book.id {
                book.authors = load_authors_for_book(self.conn, id)?;
            }
            books.push(book);
        }
        Ok(books)
    }
}

impl CrudRepository for SqliteBookRepository<'_> {
    type Id = BookId;
    type Entity = Book;

    fn save(&self, book: &Book) -> RepoResult<Book> {
        let scope = WriteScope::begin(self.conn)?;
        scope.execute(
            "INSERT INTO books (
                id,
                title,
                isbn,
                publisher,
                year,
                language
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                book.id,
                book.title.as_str(),
                isbn_to_db(book.isbn)?,
                book.publisher.as_str(),
                book.year,
                book.language.as_str(),
            ],
        )?;
        let id = book.id.unwrap_or_else(|| scope.last_insert_rowid());
        insert_author_links(&scope, id, &book.authors)?;
        scope.release()?;

        let mut saved = book.clone();
        saved.id = Some(id);
        Ok(saved)
    }

    fn get(&self, id: BookId) -> RepoResult<Option<Book>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOOK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            let mut book = parse_book_row(row)?;
            book.authors = load_authors_for_book(self.conn, id)?;
            return Ok(Some(book));
        }
        Ok(None)
    }

    fn update(&self, book: &Book) -> RepoResult<()> {
        let id = book.id.ok_or(RepoError::Detached(ENTITY))?;
        let scope = WriteScope::begin(self.conn)?;
        let changed = scope.execute(
            "UPDATE books
             SET
                title = ?1,
                isbn = ?2,
                publisher = ?3,
                year = ?4,
                language = ?5
             WHERE id = ?6;",
            params![
                book.title.as_str(),
                isbn_to_db(book.isbn)?,
                book.publisher.as_str(),
                book.year,
                book.language.as_str(),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }

        scope.execute("DELETE FROM book_authors WHERE book_id = ?1;", [id])?;
        insert_author_links(&scope, id, &book.authors)?;
        scope.release()?;
        Ok(())
    }

    fn delete(&self, book: &Book) -> RepoResult<()> {
        let id = book.id.ok_or(RepoError::Detached(ENTITY))?;
        let changed = self.conn.execute("DELETE FROM books WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        Ok(())
    }

    fn all(&self) -> RepoResult<Vec<Book>> {
        self.query_books("", Vec::new())
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn find_by_containing_title(&self, title_part: &str) -> RepoResult<Vec<Book>> {
        self.query_books(
            "WHERE instr(casefold(title), casefold(?1)) > 0",
            vec![Value::Text(title_part.to_string())],
        )
    }

    fn find_by_author_id(&self, author_id: AuthorId) -> RepoResult<Vec<Book>> {
        self.query_books(
            "WHERE EXISTS (
                SELECT 1
                FROM book_authors ba
                WHERE ba.book_id = books.id
                  AND ba.author_id = ?1
             )",
            vec![Value::Integer(author_id)],
        )
    }

    fn find_by_author_id_and_containing_title(
        &self,
        author_id: AuthorId,
        title_part: &str,
    ) -> RepoResult<Vec<Book>> {
        self.query_books(
            "WHERE EXISTS (
                SELECT 1
                FROM book_authors ba
                WHERE ba.book_id = books.id
                  AND ba.author_id = ?1
             )
             AND instr(casefold(title), casefold(?2)) > 0",
            vec![
                Value::Integer(author_id),
                Value::Text(title_part.to_string()),
            ],
        )
    }

    fn find_books_by_author_containing_name(&self, name_part: &str) -> RepoResult<Vec<Book>> {
        self.query_books(
            "WHERE EXISTS (
                SELECT 1
                FROM book_authors ba
                INNER JOIN authors a ON a.id = ba.author_id
                WHERE ba.book_id = books.id
                  AND instr(casefold(a.full_name), casefold(?1)) > 0
             )",
            vec![Value::Text(name_part.to_string())],
        )
    }

    fn find_books_having_authors_count(&self, count: u32) -> RepoResult<Vec<Book>> {
        self.query_books(
            "WHERE (
                SELECT COUNT(*)
                FROM book_authors ba
                WHERE ba.book_id = books.id
             ) > ?1",
            vec![Value::Integer(i64::from(count))],
        )
    }
}

fn insert_author_links(
    conn: &Connection,
    book_id: BookId,
    authors: &BTreeSet<AuthorId>,
) -> RepoResult<()> {
    let mut stmt =
        conn.prepare("INSERT INTO book_authors (book_id, author_id) VALUES (?1, ?2);")?;
    for author_id in authors {
        stmt.execute(params![book_id, author_id])?;
    }
    Ok(())
}

fn load_authors_for_book(conn: &Connection, book_id: BookId) -> RepoResult<BTreeSet<AuthorId>> {
    let mut stmt = conn.prepare("SELECT author_id FROM book_authors WHERE book_id = ?1;")?;
    let authors = stmt
        .query_map([book_id], |row| row.get::<_, AuthorId>(0))?
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(authors)
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    let isbn_value: i64 = row.get("isbn")?;
    let isbn = u64::try_from(isbn_value).map_err(|_| {
        RepoError::InvalidData(format!("invalid isbn `{isbn_value}` in books.isbn"))
    })?;

    let language_text: String = row.get("language")?;
    let language = Language::parse(&language_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid language `{language_text}` in books.language"
        ))
    })?;

    Ok(Book {
        id: Some(row.get("id")?),
        title: row.get("title")?,
        isbn,
        publisher: row.get("publisher")?,
        year: row.get("year")?,
        language,
        authors: BTreeSet::new(),
    })
}

fn isbn_to_db(isbn: u64) -> RepoResult<i64> {
    i64::try_from(isbn)
        .map_err(|_| RepoError::InvalidData(format!("isbn `{isbn}` exceeds storage range")))
}
