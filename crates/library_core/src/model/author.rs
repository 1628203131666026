//! Author record.

use serde::{Deserialize, Serialize};

/// Store-generated author identity.
pub type AuthorId = i64;

/// Book author.
///
/// The book relation is owned by [`crate::model::book::Book::authors`]; list
/// an author's books with
/// [`BookRepository::find_by_author_id`](crate::repo::book_repo::BookRepository::find_by_author_id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// `None` until the author has been saved.
    pub id: Option<AuthorId>,
    pub full_name: String,
}

impl Author {
    /// Creates an unsaved author.
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            id: None,
            full_name: full_name.into(),
        }
    }
}
