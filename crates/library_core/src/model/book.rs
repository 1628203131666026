//! Book record and catalog language.
//!
//! # Invariants
//! - Equality and hashing ignore `id`, so an unsaved book compares equal to
//!   its persisted copy.
//! - `authors` is a set; link order carries no meaning.

use crate::model::author::AuthorId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

/// Store-generated book identity.
pub type BookId = i64;

/// Language a book is published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    French,
    English,
}

impl Language {
    /// Stable value stored in `books.language`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::French => "french",
            Self::English => "english",
        }
    }

    /// Parses a stored language value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "french" => Some(Self::French),
            "english" => Some(Self::English),
            _ => None,
        }
    }
}

/// Catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// `None` until the book has been saved.
    pub id: Option<BookId>,
    pub title: String,
    pub isbn: u64,
    pub publisher: String,
    /// Publication year.
    pub year: i16,
    pub language: Language,
    /// Ids of the book authors (many-to-many).
    pub authors: BTreeSet<AuthorId>,
}

impl Book {
    /// Creates an unsaved book without authors.
    pub fn new(
        title: impl Into<String>,
        isbn: u64,
        publisher: impl Into<String>,
        year: i16,
        language: Language,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            isbn,
            publisher: publisher.into(),
            year,
            language,
            authors: BTreeSet::new(),
        }
    }

    /// Links one author to this book. Returns `false` when already linked.
    pub fn add_author(&mut self, author_id: AuthorId) -> bool {
        self.authors.insert(author_id)
    }

    /// Returns whether more than one author is linked.
    pub fn is_co_authored(&self) -> bool {
        self.authors.len() > 1
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title
            && self.isbn == other.isbn
            && self.publisher == other.publisher
            && self.year == other.year
            && self.language == other.language
            && self.authors == other.authors
    }
}

impl Eq for Book {}

impl Hash for Book {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.title.hash(state);
        self.isbn.hash(state);
        self.publisher.hash(state);
        self.year.hash(state);
        self.language.hash(state);
        self.authors.hash(state);
    }
}
