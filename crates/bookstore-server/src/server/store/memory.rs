use super::{BOOK_ID, BookDocument, BookStore, BookStream, LEGACY_TITLE, TITLE};
use bookstore_core::{Error, Result, types::Book};
use futures::StreamExt;
use mongodb::bson::{self, Document, oid::ObjectId};
use parking_lot::RwLock;

/// In-process [`BookStore`] holding raw BSON documents in insertion order.
///
/// Documents go through the same serde layout as [`MongoStore`], so legacy
/// documents seeded with [`MemoryStore::with_documents`] behave as they would
/// in a real collection.
///
/// [`MongoStore`]: super::MongoStore
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(docs: impl IntoIterator<Item = Document>) -> Self {
        Self {
            docs: RwLock::new(docs.into_iter().collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// Copies of the stored documents, in store order.
    pub fn documents(&self) -> Vec<Document> {
        self.docs.read().clone()
    }

    fn position(docs: &[Document], book_id: &str) -> Option<usize> {
        docs.iter()
            .position(|doc| doc.get_str(BOOK_ID).is_ok_and(|id| id == book_id))
    }

    fn encode(doc: &BookDocument) -> Result<Document> {
        bson::to_document(doc).map_err(|e| Error::store(format!("failed to encode book: {e}")))
    }

    fn decode(doc: Document) -> Result<Book> {
        bson::from_document::<BookDocument>(doc)
            .map(Book::from)
            .map_err(|e| Error::store(format!("failed to decode book: {e}")))
    }
}

#[tonic::async_trait]
impl BookStore for MemoryStore {
    async fn insert(&self, book: &Book) -> Result<String> {
        let oid = ObjectId::new();
        let doc = Self::encode(&BookDocument {
            id: Some(oid),
            ..BookDocument::from(book)
        })?;
        self.docs.write().push(doc);
        Ok(oid.to_hex())
    }

    async fn find_one(&self, book_id: &str) -> Result<Option<Book>> {
        let doc = {
            let docs = self.docs.read();
            Self::position(&docs, book_id).map(|i| docs[i].clone())
        };
        doc.map(Self::decode).transpose()
    }

    async fn update_one(&self, book: &Book) -> Result<u64> {
        let mut docs = self.docs.write();
        let Some(i) = Self::position(&docs, &book.book_id) else {
            return Ok(0);
        };

        let replacement = Self::encode(&BookDocument::from(book))?;
        let doc = &mut docs[i];
        doc.remove(LEGACY_TITLE);
        for (key, value) in replacement {
            doc.insert(key, value);
        }
        Ok(1)
    }

    async fn delete_one(&self, book_id: &str) -> Result<u64> {
        let mut docs = self.docs.write();
        match Self::position(&docs, book_id) {
            Some(i) => {
                docs.remove(i);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn find_all(&self) -> Result<BookStream> {
        let snapshot = self.documents();
        Ok(futures::stream::iter(snapshot.into_iter().map(Self::decode)).boxed())
    }

    async fn migrate_legacy_fields(&self) -> Result<u64> {
        let mut migrated = 0;
        for doc in self.docs.write().iter_mut() {
            let Some(category) = doc.remove(LEGACY_TITLE) else {
                continue;
            };
            if !doc.contains_key(TITLE) {
                doc.insert(TITLE, category);
            }
            migrated += 1;
        }
        Ok(migrated)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
