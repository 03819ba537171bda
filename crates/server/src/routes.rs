//! HTTP gateway: a small axum router exposing the quote endpoint plus
//! banner and health probes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use quoteforge_core::document::QuoteRequest;
use serde_json::{json, Value};
use tracing::info;

use crate::orchestrator::{FulfillmentOrchestrator, FulfillmentResult, FulfillmentStatus};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<FulfillmentOrchestrator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/quote", post(create_quote))
        .with_state(state)
}

async fn banner() -> Json<Value> {
    Json(json!({
        "service": "quoteforge",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn create_quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> (StatusCode, Json<FulfillmentResult>) {
    if let Err(validation_error) = request.validate() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(FulfillmentResult {
                status: FulfillmentStatus::Error,
                message: "invalid quote request".to_owned(),
                document_filename: None,
                document_path: None,
                error: Some(validation_error.to_string()),
            }),
        );
    }

    info!(
        event_name = "quote.received",
        client = %request.client_name.trim(),
        "quote request accepted"
    );
    let result = state.orchestrator.fulfill(&request).await;
    (StatusCode::OK, Json(result))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{router, AppState};
    use crate::orchestrator::FulfillmentOrchestrator;
    use crate::test_support::{
        scripted_pipeline, MockAudit, MockNotifier, MockRenderer, PROPOSAL_FIXTURE,
    };

    fn app() -> axum::Router {
        let orchestrator = FulfillmentOrchestrator::new(
            scripted_pipeline(vec![
                Ok("SCOPE".to_owned()),
                Ok("ESTIMATE".to_owned()),
                Ok(PROPOSAL_FIXTURE.to_owned()),
            ]),
            Arc::new(MockRenderer::new(true)),
            Arc::new(MockNotifier::new(true)),
            Arc::new(MockAudit::new(true)),
        );
        router(AppState { orchestrator: Arc::new(orchestrator) })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn banner_reports_service_and_version() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["service"], "quoteforge");
        assert!(body["version"].is_string());
    }

    #[tokio::test]
    async fn invalid_email_is_rejected_with_422() {
        let payload = json!({
            "client_name": "Hana Trading",
            "client_email": "not-an-address",
            "customer_request": "Build an inventory dashboard",
        });
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/quote")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().unwrap().contains("client_email"));
    }

    #[tokio::test]
    async fn valid_request_is_fulfilled() {
        let payload = json!({
            "client_name": "Hana Trading",
            "client_email": "ops@hana.example.com",
            "customer_request": "Build an inventory dashboard",
        });
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/quote")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Quote generated and sent.");
        assert!(body["document_filename"].as_str().unwrap().ends_with(".pdf"));
    }
}
