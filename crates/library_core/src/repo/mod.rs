//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define one data access contract per entity on top of [`crud::CrudRepository`].
//! - Keep SQL text and row decoding inside the persistence boundary.
//!
//! # Invariants
//! - Repositories borrow an explicit `&Connection`; there is no global handle.
//! - Repository APIs return semantic errors (`NotFound`, `Detached`,
//!   `ConstraintViolation`) in addition to DB transport errors.

pub mod author_repo;
pub mod book_repo;
pub mod borrow_repo;
pub mod crud;
pub mod librarian_repo;
pub mod ranking;
mod support;
pub mod user_repo;
