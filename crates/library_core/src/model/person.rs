//! Library patrons and staff.
//!
//! # Invariants
//! - `id` is stable and never reused for another person.
//! - `with_id` constructors reject the nil UUID.

use crate::model::ModelValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;
pub type LibrarianId = Uuid;

/// Library member who borrows books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    /// Calendar birth date; age queries compare against it.
    pub birth: NaiveDate,
}

impl User {
    /// Creates a user with a generated identity.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birth: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            birth,
        }
    }

    /// Creates a user with a caller-provided identity.
    pub fn with_id(
        id: UserId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birth: NaiveDate,
    ) -> Result<Self, ModelValidationError> {
        let user = Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            birth,
        };
        user.validate()?;
        Ok(user)
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.id.is_nil() {
            return Err(ModelValidationError::NilUuid);
        }
        Ok(())
    }
}

/// Staff member who records loans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Librarian {
    pub id: LibrarianId,
    pub first_name: String,
    pub last_name: String,
}

impl Librarian {
    /// Creates a librarian with a generated identity.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Creates a librarian with a caller-provided identity.
    pub fn with_id(
        id: LibrarianId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Result<Self, ModelValidationError> {
        let librarian = Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
        };
        librarian.validate()?;
        Ok(librarian)
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.id.is_nil() {
            return Err(ModelValidationError::NilUuid);
        }
        Ok(())
    }
}
