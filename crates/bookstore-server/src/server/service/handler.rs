//! gRPC service implementation for the book catalog.
//!
//! [`BookService`] implements the [`Bookstore`] service from
//! `bookstore.proto`. Each call is translated into a single operation on the
//! injected [`BookStore`] and the result is translated back into a response
//! message; nothing is cached between calls.
//!
//! ## Outcomes
//!
//! - A read miss or an update that matches nothing returns `NOT_FOUND`.
//! - A delete that matches nothing succeeds with `success = false`.
//! - Store failures return `INTERNAL`; they never terminate the process.
//! - Calls arriving after shutdown began return `UNAVAILABLE`.

use super::lifecycle::Lifecycle;
use crate::server::store::BookStore;
use bookstore_core::{
    Error,
    proto::{
        DeleteBookReq, DeleteBookRes, GetAllReq, GetBookReq, GetBookRes, PostBookReq, PostBookRes,
        UpdateBookReq, UpdateBookRes, bookstore_server::Bookstore,
    },
    types::Book,
};
use core::pin::Pin;
use futures::{Stream, StreamExt, TryStreamExt, future};
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// gRPC service for creating, reading, updating, deleting and listing books.
///
/// Cloning is cheap: clones share the same store and lifecycle.
#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn BookStore>,
    lifecycle: Lifecycle,
}

impl BookService {
    pub fn new(store: Arc<dyn BookStore>, lifecycle: Lifecycle) -> Self {
        Self { store, lifecycle }
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Releases the store connection.
    pub async fn shutdown(&self) -> Result<(), Error> {
        self.store.close().await
    }

    fn ensure_accepting(&self) -> Result<(), Error> {
        if self.lifecycle.is_accepting() {
            Ok(())
        } else {
            Err(Error::ServiceShutdown)
        }
    }
}

fn book_id_of(book: Option<&bookstore_core::proto::Book>) -> &str {
    book.map(|b| b.book_id.as_str()).unwrap_or_default()
}

#[tonic::async_trait]
impl Bookstore for BookService {
    type GetAllBooksStream = Pin<Box<dyn Stream<Item = Result<GetBookRes, Status>> + Send>>;

    #[tracing::instrument(skip_all, fields(book_id = book_id_of(req.get_ref().book.as_ref())))]
    async fn post_book(
        &self,
        req: Request<PostBookReq>,
    ) -> Result<Response<PostBookRes>, Status> {
        self.ensure_accepting()?;
        let book = Book::from_proto(req.into_inner().book);

        let oid = self.store.insert(&book).await.inspect_err(|e| {
            tracing::error!("Insert failed: {e}");
        })?;
        tracing::info!(%oid, "Inserted book");

        Ok(Response::new(PostBookRes {
            book: Some(book.into()),
            oid,
        }))
    }

    #[tracing::instrument(skip_all, fields(book_id = %req.get_ref().id))]
    async fn get_book(&self, req: Request<GetBookReq>) -> Result<Response<GetBookRes>, Status> {
        self.ensure_accepting()?;
        let id = req.into_inner().id;

        let book = self
            .store
            .find_one(&id)
            .await?
            .ok_or_else(|| Error::not_found(id))?;
        tracing::debug!("Found book");

        Ok(Response::new(GetBookRes {
            book: Some(book.into()),
        }))
    }

    #[tracing::instrument(skip_all, fields(book_id = book_id_of(req.get_ref().book.as_ref())))]
    async fn update_book(
        &self,
        req: Request<UpdateBookReq>,
    ) -> Result<Response<UpdateBookRes>, Status> {
        self.ensure_accepting()?;
        let book = Book::from_proto(req.into_inner().book);

        let matched = self.store.update_one(&book).await?;
        if matched == 0 {
            tracing::info!("No book to update");
            return Err(Error::not_found(book.book_id).into());
        }
        tracing::info!("Updated book");

        Ok(Response::new(UpdateBookRes {
            book: Some(book.into()),
        }))
    }

    #[tracing::instrument(skip_all, fields(book_id = %req.get_ref().id))]
    async fn delete_book(
        &self,
        req: Request<DeleteBookReq>,
    ) -> Result<Response<DeleteBookRes>, Status> {
        self.ensure_accepting()?;
        let id = req.into_inner().id;

        let deleted_count = self.store.delete_one(&id).await.inspect_err(|e| {
            tracing::error!("Delete failed: {e}");
        })?;
        tracing::info!(deleted_count, "Deleted book");

        Ok(Response::new(DeleteBookRes {
            success: deleted_count == 1,
            deleted_count,
        }))
    }

    /// Streams every stored book in store order.
    ///
    /// The first store error is sent as the final item and ends the stream;
    /// books sent before it stay delivered.
    #[tracing::instrument(skip_all)]
    async fn get_all_books(
        &self,
        _req: Request<GetAllReq>,
    ) -> Result<Response<Self::GetAllBooksStream>, Status> {
        self.ensure_accepting()?;
        let books = self.store.find_all().await?;
        tracing::info!("Streaming all books");

        let mut failed = false;
        let stream = books
            .map_ok(|book| GetBookRes {
                book: Some(book.into()),
            })
            .map_err(|e| {
                tracing::warn!("Book stream aborted: {e}");
                Status::from(e)
            })
            .take_while(move |item| {
                let keep = !failed;
                failed |= item.is_err();
                future::ready(keep)
            });

        Ok(Response::new(Box::pin(stream)))
    }
}
