//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use dialbook_core::changes::{ResumeToken, ResumeTokenRepository, StreamKind};
use dialbook_event_store::change_feed::PgChangeFeed;
use dialbook_event_store::pg_event_repository::PgEventRepository;
use dialbook_event_store::pools::DatabaseHealth;
use dialbook_event_store::resume_token::PgResumeTokenRepository;
use dialbook_projections::memory::{
    InMemoryClientContactNumberStore, InMemoryContactNumberTypeStore,
};
use dialbook_projections::pg_read_model::{PgClientContactNumberStore, PgContactNumberTypeStore};
use dialbook_projections::pipeline::PipelineContext;
use dialbook_projections::pipelines::{
    CLIENT_CONTACT_NUMBER_PIPELINE_ID, CONTACT_NUMBER_TYPE_PIPELINE_ID,
};
use dialbook_projections::resume_token::ResumeTokenCollectionManager;
use dialbook_test_support::{InMemoryEventRepository, InMemoryResumeTokenRepository};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use dialbook_api::state::AppState;

/// The whole service wired over in-memory adapters.
pub struct TestService {
    pub log: Arc<InMemoryEventRepository>,
    pub tokens: Arc<InMemoryResumeTokenRepository>,
    pub types: Arc<InMemoryContactNumberTypeStore>,
    pub numbers: Arc<InMemoryClientContactNumberStore>,
}

impl TestService {
    pub fn new() -> Self {
        Self {
            log: Arc::new(InMemoryEventRepository::new()),
            tokens: Arc::new(InMemoryResumeTokenRepository::new()),
            types: Arc::new(InMemoryContactNumberTypeStore::new()),
            numbers: Arc::new(InMemoryClientContactNumberStore::new()),
        }
    }

    /// Same route structure as `main.rs`.
    pub fn app(&self) -> Router {
        dialbook_api::app(self.state())
    }

    /// The app with `/health` reporting `checker`.
    pub fn app_with_health(&self, checker: Arc<dyn DatabaseHealth>) -> Router {
        dialbook_api::app(self.state().with_database_health(checker))
    }

    fn state(&self) -> AppState {
        AppState::new(self.log.clone(), self.types.clone(), self.numbers.clone())
    }

    /// Context for the streaming application.
    pub fn pipeline_context(&self) -> PipelineContext {
        PipelineContext {
            feed: self.log.clone(),
            events: self.log.clone(),
            tokens: ResumeTokenCollectionManager::new(self.tokens.clone()),
            contact_number_types: self.types.clone(),
            client_contact_numbers: self.numbers.clone(),
            poll_interval: Duration::from_millis(10),
        }
    }

    /// Makes the pipelines replay the log from its first event.
    pub async fn replay_from_start(&self) {
        for pipeline_id in [CONTACT_NUMBER_TYPE_PIPELINE_ID, CLIENT_CONTACT_NUMBER_PIPELINE_ID] {
            self.tokens
                .store(pipeline_id, StreamKind::Watch, ResumeToken::new(0))
                .await
                .unwrap();
        }
    }
}

/// Build the full app router over one `PostgreSQL` database holding both the
/// event store and the read models.
pub fn build_pg_app(pool: PgPool) -> Router {
    dialbook_api::app(AppState::new(
        Arc::new(PgEventRepository::new(pool.clone())),
        Arc::new(PgContactNumberTypeStore::new(pool.clone())),
        Arc::new(PgClientContactNumberStore::new(pool)),
    ))
}

/// Pipeline context over the same database as [`build_pg_app`].
pub fn pg_pipeline_context(pool: PgPool) -> PipelineContext {
    PipelineContext {
        feed: Arc::new(PgChangeFeed::new(pool.clone())),
        events: Arc::new(PgEventRepository::new(pool.clone())),
        tokens: ResumeTokenCollectionManager::new(Arc::new(PgResumeTokenRepository::new(
            pool.clone(),
        ))),
        contact_number_types: Arc::new(PgContactNumberTypeStore::new(pool.clone())),
        client_contact_numbers: Arc::new(PgClientContactNumberStore::new(pool)),
        poll_interval: Duration::from_millis(10),
    }
}

/// Status, headers and JSON body (`Null` when empty) of a response.
pub type TestResponse = (StatusCode, HeaderMap, serde_json::Value);

/// Send a request and collect the response.
pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, headers, json)
}

/// Send a request with a JSON body.
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: &serde_json::Value,
) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    send(app, request).await
}

/// Send a request without a body.
pub async fn send_empty(app: Router, method: &str, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Returns the `Location` header of an accepted command.
pub fn location(headers: &HeaderMap) -> String {
    headers["location"].to_str().unwrap().to_owned()
}
