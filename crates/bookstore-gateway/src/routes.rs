//! REST routes and their translation into bookstore RPCs.
//!
//! Each handler issues exactly one RPC on the shared channel. Request bodies
//! are parsed before any RPC is made, so a malformed body never reaches the
//! store.

use crate::error::ApiError;
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, post},
};
use bookstore_core::{
    proto::{
        DeleteBookReq, GetAllReq, GetBookReq, PostBookReq, UpdateBookReq,
        bookstore_client::BookstoreClient,
    },
    types::Book,
};
use serde::Serialize;
use tonic::transport::Channel;
use tower_http::trace::TraceLayer;

/// Shared handler state: one client over one channel, cloned per request.
#[derive(Clone)]
pub struct AppState {
    client: BookstoreClient<Channel>,
}

impl AppState {
    pub fn new(client: BookstoreClient<Channel>) -> Self {
        Self { client }
    }
}

/// Response to `POST /api/book/`: the stored book plus its store id.
#[derive(Debug, Serialize)]
pub struct CreatedBook {
    #[serde(flatten)]
    pub book: Book,
    pub oid: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub success: bool,
    pub deleted_count: u64,
}

pub fn router(client: BookstoreClient<Channel>) -> Router {
    Router::new()
        .route("/api/book/", post(create_book))
        .route(
            "/api/book/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/api/books", get(list_books))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(client))
}

async fn get_book(
    State(mut state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    let res = state.client.get_book(GetBookReq { id }).await?.into_inner();
    Ok(Json(Book::from_proto(res.book)))
}

async fn create_book(
    State(mut state): State<AppState>,
    payload: Result<Json<Book>, JsonRejection>,
) -> Result<Json<CreatedBook>, ApiError> {
    let Json(book) = payload?;
    let res = state
        .client
        .post_book(PostBookReq {
            book: Some(book.into()),
        })
        .await?
        .into_inner();

    tracing::info!(oid = %res.oid, "Created book");
    Ok(Json(CreatedBook {
        book: Book::from_proto(res.book),
        oid: res.oid,
    }))
}

/// The path id replaces whatever `bookId` the body carries.
async fn update_book(
    State(mut state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Book>, JsonRejection>,
) -> Result<Json<Book>, ApiError> {
    let Json(book) = payload?;
    let book = Book {
        book_id: id,
        ..book
    };

    let res = state
        .client
        .update_book(UpdateBookReq {
            book: Some(book.into()),
        })
        .await?
        .into_inner();
    Ok(Json(Book::from_proto(res.book)))
}

async fn delete_book(
    State(mut state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    let res = state
        .client
        .delete_book(DeleteBookReq { id })
        .await?
        .into_inner();
    Ok(Json(DeleteOutcome {
        success: res.success,
        deleted_count: res.deleted_count,
    }))
}

/// Drains the `GetAllBooks` stream into one array.
async fn list_books(State(mut state): State<AppState>) -> Result<Json<Vec<Book>>, ApiError> {
    let mut stream = state.client.get_all_books(GetAllReq {}).await?.into_inner();

    let mut books = Vec::new();
    while let Some(res) = stream.message().await? {
        books.push(Book::from_proto(res.book));
    }
    Ok(Json(books))
}

async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use bookstore_server::server::{
        service::{BookService, Lifecycle, serve_with_incoming},
        store::MemoryStore,
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::{net::TcpListener, sync::oneshot};
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::transport::Endpoint;
    use tower::ServiceExt;

    struct Harness {
        app: Router,
        store: Arc<MemoryStore>,
        _stop: oneshot::Sender<()>,
    }

    /// Runs a real gRPC backend over a loopback socket with an in-memory
    /// store, and builds the gateway router against it.
    async fn harness() -> Harness {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let store = Arc::new(MemoryStore::new());
        let service = BookService::new(store.clone(), Lifecycle::new());
        let (stop, stopped) = oneshot::channel::<()>();

        tokio::spawn(serve_with_incoming(
            TcpListenerStream::new(listener),
            service,
            async move {
                let _ = stopped.await;
            },
        ));

        let channel = Endpoint::from_shared(format!("http://{addr}"))
            .unwrap()
            .connect()
            .await
            .unwrap();

        Harness {
            app: router(BookstoreClient::new(channel)),
            store,
            _stop: stop,
        }
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                req = req.header("content-type", "application/json");
                Body::from(body.to_owned())
            }
            None => Body::empty(),
        };

        let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn book_lifecycle_over_http() {
        let h = harness().await;

        let (status, created) = call(
            &h.app,
            "POST",
            "/api/book/",
            Some(r#"{"bookId":"b1","bookName":"Dune","title":"Dune","author":"Herbert"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["bookId"], "b1");
        assert_eq!(created["bookName"], "Dune");
        assert_eq!(created["title"], "Dune");
        assert_eq!(created["author"], "Herbert");
        assert!(created["oid"].as_str().is_some_and(|oid| !oid.is_empty()));

        let (status, fetched) = call(&h.app, "GET", "/api/book/b1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            fetched,
            json!({"bookId": "b1", "bookName": "Dune", "title": "Dune", "author": "Herbert"})
        );

        let (status, updated) = call(
            &h.app,
            "PUT",
            "/api/book/b1",
            Some(r#"{"bookName":"Dune (rev)","author":"Herbert"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["bookId"], "b1");
        assert_eq!(updated["bookName"], "Dune (rev)");

        let (status, deleted) = call(&h.app, "DELETE", "/api/book/b1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted, json!({"success": true, "deletedCount": 1}));

        let (status, missing) = call(&h.app, "GET", "/api/book/b1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(missing["error"].as_str().is_some_and(|e| e.contains("b1")));
    }

    #[tokio::test]
    async fn path_id_overrides_body_id() {
        let h = harness().await;
        call(&h.app, "POST", "/api/book/", Some(r#"{"bookId":"b1"}"#)).await;

        let (status, updated) = call(
            &h.app,
            "PUT",
            "/api/book/b1",
            Some(r#"{"bookId":"other","bookName":"Renamed"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["bookId"], "b1");

        let (status, _) = call(&h.app, "GET", "/api/book/other", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_json_is_400_without_store_mutation() {
        let h = harness().await;

        let (status, body) = call(&h.app, "POST", "/api/book/", Some(r#"{"bookId": "b1""#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert!(h.store.is_empty());

        call(&h.app, "POST", "/api/book/", Some(r#"{"bookId":"b1","bookName":"Dune"}"#)).await;
        let before = h.store.documents();

        let (status, _) = call(&h.app, "PUT", "/api/book/b1", Some("not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(&h.app, "PUT", "/api/book/b1", Some(r#"{"author": 5}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(h.store.documents(), before);
    }

    #[tokio::test]
    async fn update_of_missing_book_is_404() {
        let h = harness().await;
        let (status, _) = call(&h.app, "PUT", "/api/book/nope", Some(r#"{"bookName":"X"}"#)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn delete_of_missing_book_is_200_false() {
        let h = harness().await;
        let (status, body) = call(&h.app, "DELETE", "/api/book/nope", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": false, "deletedCount": 0}));
    }

    #[tokio::test]
    async fn legacy_category_is_accepted_as_title() {
        let h = harness().await;
        let (status, created) = call(
            &h.app,
            "POST",
            "/api/book/",
            Some(r#"{"bookId":"b7","bookName":"Emma","category":"Classic","author":"Austen"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["title"], "Classic");
        assert!(created.get("category").is_none());
    }

    #[tokio::test]
    async fn lists_every_stored_book() {
        let h = harness().await;

        let (status, empty) = call(&h.app, "GET", "/api/books", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(empty, json!([]));

        for id in ["b1", "b2", "b3"] {
            let body = json!({ "bookId": id, "bookName": id }).to_string();
            call(&h.app, "POST", "/api/book/", Some(&body)).await;
        }

        let (status, all) = call(&h.app, "GET", "/api/books", None).await;
        assert_eq!(status, StatusCode::OK);
        let mut ids: Vec<&str> = all
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|book| book["bookId"].as_str())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, ["b1", "b2", "b3"]);
    }

    #[tokio::test]
    async fn healthz_answers_without_backend_call() {
        let h = harness().await;
        let res = h
            .app
            .clone()
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
