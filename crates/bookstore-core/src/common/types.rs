//! # The Book model
//!
//! A book exists in three shapes: the protobuf [`proto::Book`] on the wire,
//! the JSON object served by the HTTP gateway, and the document kept by the
//! store. [`Book`] is the in-process form that the other two convert to and
//! from.
//!
//! ## JSON shape
//!
//! Fields serialize in camelCase (`bookId`, `bookName`, `title`, `author`).
//! Every field defaults to the empty string when absent, so a partial body is
//! accepted and means "replace with empty".
//!
//! ## Legacy schema
//!
//! An older schema named the descriptive field `category`. `title` is the
//! canonical name; `category` is read only when `title` is absent and is
//! never written back.

use crate::proto;
use serde::{Deserialize, Serialize};

/// A catalog entry keyed by its application-level `book_id`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "BookInput")]
pub struct Book {
    pub book_id: String,
    pub book_name: String,
    pub title: String,
    pub author: String,
}

/// Accepted JSON shape. Every field is optional.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BookInput {
    book_id: String,
    book_name: String,
    title: Option<String>,
    category: Option<String>,
    author: String,
}

impl From<BookInput> for Book {
    fn from(input: BookInput) -> Self {
        Self {
            book_id: input.book_id,
            book_name: input.book_name,
            title: input.title.or(input.category).unwrap_or_default(),
            author: input.author,
        }
    }
}

impl Book {
    pub fn new(
        book_id: impl Into<String>,
        book_name: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            book_id: book_id.into(),
            book_name: book_name.into(),
            title: title.into(),
            author: author.into(),
        }
    }

    /// Converts an optional wire message, treating an absent one as an empty
    /// book.
    pub fn from_proto(book: Option<proto::Book>) -> Self {
        book.map(Self::from).unwrap_or_default()
    }
}

impl From<proto::Book> for Book {
    fn from(book: proto::Book) -> Self {
        Self {
            book_id: book.book_id,
            book_name: book.book_name,
            title: book.title,
            author: book.author,
        }
    }
}

impl From<Book> for proto::Book {
    fn from(book: Book) -> Self {
        Self {
            book_id: book.book_id,
            book_name: book.book_name,
            title: book.title,
            author: book.author,
        }
    }
}
