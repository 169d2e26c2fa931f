use super::{BOOK_ID, BookDocument, BookStore, BookStream, LEGACY_TITLE, TITLE};
use crate::server::config::MongoConfig;
use bookstore_core::{Error, Result, types::Book};
use futures::{StreamExt, TryStreamExt};
use mongodb::{
    Client, Collection,
    bson::{Bson, Document, doc},
    options::ClientOptions,
};

/// [`BookStore`] backed by a single MongoDB collection.
///
/// The client is opened once by [`MongoStore::connect`] and shared by every
/// request; the driver pools connections internally.
#[derive(Clone, Debug)]
pub struct MongoStore {
    client: Client,
    collection: Collection<BookDocument>,
}

fn store_err(op: &'static str) -> impl Fn(mongodb::error::Error) -> Error {
    move |e| Error::store(format!("{op}: {e}"))
}

fn by_book_id(book_id: &str) -> Document {
    doc! { BOOK_ID: book_id }
}

/// Overwrites every book field and drops a leftover legacy `category`.
fn update_doc(book: &Book) -> Document {
    doc! {
        "$set": {
            BOOK_ID: book.book_id.as_str(),
            "bookname": book.book_name.as_str(),
            TITLE: book.title.as_str(),
            "author": book.author.as_str(),
        },
        "$unset": { LEGACY_TITLE: "" },
    }
}

/// Documents that only know the legacy `category` key.
fn rename_filter() -> Document {
    doc! {
        LEGACY_TITLE: { "$exists": true },
        TITLE: { "$exists": false },
    }
}

fn rename_doc() -> Document {
    doc! { "$rename": { LEGACY_TITLE: TITLE } }
}

/// Documents still carrying `category` once renaming is done. These already
/// have a `title`, which is kept.
fn leftover_filter() -> Document {
    doc! { LEGACY_TITLE: { "$exists": true } }
}

fn unset_legacy_doc() -> Document {
    doc! { "$unset": { LEGACY_TITLE: "" } }
}

fn inserted_id_hex(id: Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s,
        other => other.to_string(),
    }
}

impl MongoStore {
    /// Connects to `config.uri` and pings the database.
    ///
    /// Fails if the URI cannot be parsed or the server does not answer the
    /// ping within `config.connect_timeout`.
    pub async fn connect(config: &MongoConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.uri)
            .await
            .map_err(store_err("parse connection string"))?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.connect_timeout);

        let client = Client::with_options(options).map_err(store_err("create client"))?;
        let database = client.database(&config.database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(store_err("ping"))?;

        tracing::info!(
            database = %config.database,
            collection = %config.collection,
            "Connected to MongoDB"
        );

        Ok(Self {
            collection: database.collection(&config.collection),
            client,
        })
    }
}

#[tonic::async_trait]
impl BookStore for MongoStore {
    async fn insert(&self, book: &Book) -> Result<String> {
        let res = self
            .collection
            .insert_one(BookDocument::from(book))
            .await
            .map_err(store_err("insert"))?;

        Ok(inserted_id_hex(res.inserted_id))
    }

    async fn find_one(&self, book_id: &str) -> Result<Option<Book>> {
        let doc = self
            .collection
            .find_one(by_book_id(book_id))
            .await
            .map_err(store_err("find one"))?;
        Ok(doc.map(Book::from))
    }

    async fn update_one(&self, book: &Book) -> Result<u64> {
        let res = self
            .collection
            .update_one(by_book_id(&book.book_id), update_doc(book))
            .await
            .map_err(store_err("update"))?;
        Ok(res.matched_count)
    }

    async fn delete_one(&self, book_id: &str) -> Result<u64> {
        let res = self
            .collection
            .delete_one(by_book_id(book_id))
            .await
            .map_err(store_err("delete"))?;
        Ok(res.deleted_count)
    }

    async fn find_all(&self) -> Result<BookStream> {
        let cursor = self
            .collection
            .find(doc! {})
            .await
            .map_err(store_err("find"))?;

        Ok(cursor
            .map_ok(Book::from)
            .map_err(store_err("cursor"))
            .boxed())
    }

    async fn migrate_legacy_fields(&self) -> Result<u64> {
        let renamed = self
            .collection
            .update_many(rename_filter(), rename_doc())
            .await
            .map_err(store_err("rename legacy title"))?;
        let dropped = self
            .collection
            .update_many(leftover_filter(), unset_legacy_doc())
            .await
            .map_err(store_err("drop legacy title"))?;
        Ok(renamed.modified_count + dropped.modified_count)
    }

    async fn close(&self) -> Result<()> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}
