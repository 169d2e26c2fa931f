//! Document store adapters.
//!
//! The gRPC service talks to persistence only through [`BookStore`], which is
//! injected into [`BookService`](crate::server::service::BookService) at
//! construction. Two adapters implement it:
//!
//! - [`MongoStore`] - the production adapter over a MongoDB collection.
//! - [`MemoryStore`] - an in-process adapter with the same semantics, used in
//!   tests and for local runs without a database.
//!
//! ## Semantics shared by every adapter
//!
//! - Books are keyed by `bookid`. Uniqueness is not enforced by the store, so
//!   single-document operations act on the first match in store order.
//! - `update_one` and `delete_one` report how many documents they touched
//!   instead of failing on a miss.
//! - Documents are laid out as `{ _id, bookid, bookname, title, author }`. A
//!   legacy `category` key is read only when `title` is absent, and
//!   [`BookStore::migrate_legacy_fields`] folds it into `title`.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use bookstore_core::{Result, types::Book};
use futures::stream::BoxStream;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Lazy sequence of books in store-native order.
pub type BookStream = BoxStream<'static, Result<Book>>;

#[tonic::async_trait]
pub trait BookStore: Send + Sync + 'static {
    /// Stores a new document and returns the store-assigned id as hex.
    async fn insert(&self, book: &Book) -> Result<String>;

    /// Returns the first book whose `bookid` equals `book_id`.
    async fn find_one(&self, book_id: &str) -> Result<Option<Book>>;

    /// Replaces all four fields of the first document keyed by
    /// `book.book_id`. Returns the number of matched documents (0 or 1).
    async fn update_one(&self, book: &Book) -> Result<u64>;

    /// Removes the first document keyed by `book_id`. Returns the number of
    /// removed documents (0 or 1).
    async fn delete_one(&self, book_id: &str) -> Result<u64>;

    async fn find_all(&self) -> Result<BookStream>;

    /// Folds the legacy `category` field into `title` on every document that
    /// still carries it. `category` is renamed where `title` is absent and
    /// dropped where both exist, so a newer `title` always wins. Returns the
    /// number of rewritten documents.
    async fn migrate_legacy_fields(&self) -> Result<u64>;

    async fn close(&self) -> Result<()>;
}

pub(crate) const BOOK_ID: &str = "bookid";
pub(crate) const TITLE: &str = "title";
pub(crate) const LEGACY_TITLE: &str = "category";

/// Stored shape of a [`Book`].
///
/// `category` is decoded into its own slot rather than aliased onto `title`:
/// documents touched by both schemas carry both keys, and `title` takes
/// precedence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct BookDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "bookid", default)]
    pub book_id: String,
    #[serde(rename = "bookname", default)]
    pub book_name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "category", default, skip_serializing)]
    pub legacy_title: Option<String>,
    #[serde(default)]
    pub author: String,
}

impl From<&Book> for BookDocument {
    fn from(book: &Book) -> Self {
        Self {
            id: None,
            book_id: book.book_id.clone(),
            book_name: book.book_name.clone(),
            title: Some(book.title.clone()),
            legacy_title: None,
            author: book.author.clone(),
        }
    }
}

impl From<BookDocument> for Book {
    fn from(doc: BookDocument) -> Self {
        Self {
            book_id: doc.book_id,
            book_name: doc.book_name,
            title: doc.title.or(doc.legacy_title).unwrap_or_default(),
            author: doc.author,
        }
    }
}
