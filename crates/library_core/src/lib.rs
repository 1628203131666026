//! Data-access layer for the library catalog and circulation desk.
//! This crate owns the schema, the entity model and every query.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::author::{Author, AuthorId};
pub use model::book::{Book, BookId, Language};
pub use model::borrow::{Borrow, BorrowId};
pub use model::person::{Librarian, LibrarianId, User, UserId};
pub use model::ModelValidationError;
pub use repo::author_repo::{AuthorRepository, SqliteAuthorRepository};
pub use repo::book_repo::{BookRepository, SqliteBookRepository};
pub use repo::borrow_repo::{BorrowRepository, SqliteBorrowRepository};
pub use repo::crud::{CrudRepository, RepoError, RepoResult};
pub use repo::librarian_repo::{LibrarianRepository, SqliteLibrarianRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
