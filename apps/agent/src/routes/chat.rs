//! Chat endpoint.
//!
//! One endpoint serves both remote CLI clients (form-encoded) and direct
//! API callers (JSON). The reply is plain text: either the answer to a
//! question or the output of a command such as `R` or `CL`.

use axum::extract::{FromRequest, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;

use crate::commands;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub subject_id: String,
    pub message_text: String,
}

/// Extracts a [`ChatRequest`] from either a JSON or a form body, keyed off
/// the Content-Type header. Anything that is not JSON is tried as a form.
pub struct ChatPayload(pub ChatRequest);

#[axum::async_trait]
impl<S> FromRequest<S> for ChatPayload
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if content_type.starts_with("application/json") {
            let Json(request) = Json::<ChatRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(request))
        } else {
            let Form(request) = Form::<ChatRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(request))
        }
    }
}

pub async fn chat_handler(
    State(state): State<AppState>,
    ChatPayload(request): ChatPayload,
) -> Result<String, AppError> {
    if request.message_text.trim().is_empty() {
        return Err(AppError::Validation(
            "message_text must not be empty".to_string(),
        ));
    }
    commands::dispatch_message(&state.service, &request.subject_id, &request.message_text).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use tower::ServiceExt;

    use crate::routes::build_router;
    use crate::service::test_support::test_service;
    use crate::state::AppState;

    async fn test_app(responses: &[&str]) -> (Router, tempfile::TempDir) {
        let (service, _model, dir) = test_service(responses).await;
        let router = build_router(AppState::new(Arc::new(service)));
        (router, dir)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn json_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn form_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let (router, _dir) = test_app(&[]).await;

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_chat_answers_a_json_question() {
        let (router, _dir) = test_app(&["Jane worked at Initech."]).await;

        let response = router
            .oneshot(json_request(
                r#"{"subject_id":"s1","message_text":"Where did Jane work?"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "Jane worked at Initech.");
    }

    #[tokio::test]
    async fn test_chat_answers_a_form_question() {
        let (router, _dir) = test_app(&["Twelve years."]).await;

        let response = router
            .oneshot(form_request(
                "subject_id=s1&message_text=How%20many%20years%20of%20experience%3F",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "Twelve years.");
    }

    #[tokio::test]
    async fn test_chat_rejects_a_missing_field() {
        let (router, _dir) = test_app(&[]).await;

        let response = router
            .oneshot(json_request(r#"{"subject_id":"s1"}"#))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_chat_rejects_an_empty_message() {
        let (router, _dir) = test_app(&[]).await;

        let response = router
            .oneshot(json_request(
                r#"{"subject_id":"s1","message_text":"   "}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_generation_without_job_details_is_unprocessable() {
        let (router, _dir) = test_app(&[]).await;

        let response = router
            .oneshot(json_request(r#"{"subject_id":"s1","message_text":"R"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"]["code"], "MISSING_JOB_CONTEXT");
    }

    #[tokio::test]
    async fn test_inline_jd_then_cover_letter_over_http() {
        let (router, dir) = test_app(&[
            r#"["Rust experience"]"#,
            "I have twelve years of Rust experience.",
            r#"["I bring 12 years of relevant experience."]"#,
            "I admire Widget Corp's engineering culture.",
        ])
        .await;

        let response = router
            .clone()
            .oneshot(form_request(
                "subject_id=s1&message_text=JD%7CWidget%20Corp%7CEngineer%7CRust%20role.",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_string(response).await,
            "Job details saved: Engineer at Widget Corp."
        );

        let response = router
            .oneshot(json_request(r#"{"subject_id":"s1","message_text":"CL"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let letter = body_string(response).await;
        assert!(letter.starts_with("Dear Hiring Manager,"));

        let pdf_path = dir
            .path()
            .join("output")
            .join("Widget Corp_Engineer_cover_letter.pdf");
        assert!(pdf_path.exists(), "missing PDF at {}", pdf_path.display());
    }
}
