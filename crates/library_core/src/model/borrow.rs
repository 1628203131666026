//! Borrow (loan) record.
//!
//! # Responsibility
//! - Link one borrower, one librarian and the borrowed books.
//! - Track the requested return instant and completion state.
//!
//! # Invariants
//! - `books` is never empty for a persisted borrow.
//! - `finished == false` means the loan is still outstanding.

use crate::model::book::BookId;
use crate::model::person::{LibrarianId, UserId};
use crate::model::ModelValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

pub type BorrowId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrow {
    pub id: BorrowId,
    pub borrower: UserId,
    pub librarian: LibrarianId,
    pub books: BTreeSet<BookId>,
    /// Due instant. Stored with millisecond precision.
    pub requested_return: DateTime<Utc>,
    pub finished: bool,
}

impl Borrow {
    /// Creates an outstanding borrow with a generated identity.
    pub fn new(
        borrower: UserId,
        librarian: LibrarianId,
        books: impl IntoIterator<Item = BookId>,
        requested_return: DateTime<Utc>,
    ) -> Self {
        Self::build(Uuid::new_v4(), borrower, librarian, books, requested_return)
    }

    /// Creates an outstanding borrow with a caller-provided identity.
    pub fn with_id(
        id: BorrowId,
        borrower: UserId,
        librarian: LibrarianId,
        books: impl IntoIterator<Item = BookId>,
        requested_return: DateTime<Utc>,
    ) -> Result<Self, ModelValidationError> {
        let borrow = Self::build(id, borrower, librarian, books, requested_return);
        borrow.validate()?;
        Ok(borrow)
    }

    fn build(
        id: BorrowId,
        borrower: UserId,
        librarian: LibrarianId,
        books: impl IntoIterator<Item = BookId>,
        requested_return: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            borrower,
            librarian,
            books: books.into_iter().collect(),
            requested_return,
            finished: false,
        }
    }

    /// Validates the borrow invariants.
    ///
    /// # Errors
    /// - `NilUuid` when any identity is nil.
    /// - `EmptyBorrow` when no book is attached.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.id.is_nil() || self.borrower.is_nil() || self.librarian.is_nil() {
            return Err(ModelValidationError::NilUuid);
        }
        if self.books.is_empty() {
            return Err(ModelValidationError::EmptyBorrow);
        }
        Ok(())
    }

    /// Marks the loan as returned.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Returns whether the loan is outstanding and past its due instant.
    pub fn is_late_at(&self, now: DateTime<Utc>) -> bool {
        !self.finished && self.requested_return < now
    }
}
