//! Library domain model.
//!
//! # Responsibility
//! - Define the records persisted by the repository layer.
//! - Keep identity types explicit in repository signatures.
//!
//! # Invariants
//! - Books and authors get integer identities from the store on save.
//! - Users, librarians and borrows carry client-generated UUID identities.
//! - A borrow always references one borrower, one librarian and at least
//!   one book.

pub mod author;
pub mod book;
pub mod borrow;
pub mod person;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Model invariant violations detected before persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelValidationError {
    /// UUID identities must not be the nil UUID.
    NilUuid,
    /// A borrow must contain at least one book.
    EmptyBorrow,
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "identity must not be the nil uuid"),
            Self::EmptyBorrow => write!(f, "borrow must reference at least one book"),
        }
    }
}

impl Error for ModelValidationError {}
