//! Chat API routes.
//!
//! Endpoints:
//!
//! - `POST /api/chat`          - Send a message (plus optional uploads), get a reply
//! - `POST /api/chat/prompt`   - Alias of `/api/chat`
//! - `POST /prompt`            - Alias of `/api/chat`, used by the UI
//! - `POST /api/chat/embed`    - Embed and store uploads without prompting
//! - `POST /embed_context`     - Store configuration text and at most one image
//! - `GET  /get_images`        - List a user's stored images

use axum::{
    Router,
    extract::{MatchedPath, Query, State},
    response::Json,
    routing::{get, post},
};
use ragchat_agent::{EmbedSummary, StoredImage};
use ragchat_core::artifact::Artifact;
use ragchat_core::error::TransportError;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::SharedState;
use crate::error::ApiError;
use crate::extract::UploadForm;

pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/prompt", post(chat_handler))
        .route("/prompt", post(chat_handler))
        .route("/api/chat/embed", post(embed_handler))
        .route("/embed_context", post(embed_context_handler))
        .route("/get_images", get(images_handler))
        .with_state(state)
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatReply {
    response: String,
}

#[derive(Serialize)]
struct EmbedReply {
    response: EmbedSummary,
}

#[derive(Serialize)]
struct EmbedContextReply {
    success: bool,
    #[serde(flatten)]
    summary: EmbedSummary,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagesQuery {
    user_id: Option<String>,
}

#[derive(Serialize)]
struct ImagesReply {
    images: Vec<StoredImage>,
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn chat_handler(
    State(state): State<SharedState>,
    path: MatchedPath,
    form: UploadForm,
) -> Result<Json<ChatReply>, ApiError> {
    let message = form.require_message()?;
    let images = form.image_count();
    info!(
        route = path.as_str(),
        images,
        documents = form.artifacts.len() - images,
        "Chat request"
    );

    match state
        .service
        .respond(form.user_id.as_deref(), message, &form.artifacts)
        .await
    {
        Ok(response) => Ok(Json(ChatReply { response })),
        Err(e) => {
            error!(route = path.as_str(), error = %e, "Chat request failed");
            Err(ApiError::internal(path.as_str()))
        }
    }
}

async fn embed_handler(State(state): State<SharedState>, form: UploadForm) -> Result<Json<EmbedReply>, ApiError> {
    match state
        .service
        .embed_artifacts(form.user_id.as_deref(), &form.artifacts)
        .await
    {
        Ok(response) => Ok(Json(EmbedReply { response })),
        Err(e) => {
            error!(error = %e, "Embedding uploads failed");
            Err(ApiError::internal("/api/chat/embed"))
        }
    }
}

async fn embed_context_handler(
    State(state): State<SharedState>,
    form: UploadForm,
) -> Result<Json<EmbedContextReply>, ApiError> {
    if form.image_count() > 1 {
        return Err(TransportError::InvalidField {
            field: "image".into(),
            reason: "at most one image is accepted".into(),
        }
        .into());
    }
    if form.texts.is_empty() && form.artifacts.is_empty() {
        return Err(ApiError::bad_request("Provide configuration text or an image"));
    }

    let UploadForm {
        user_id,
        texts,
        artifacts,
        ..
    } = form;
    let uploads: Vec<Artifact> = texts.into_iter().map(Artifact::message).chain(artifacts).collect();

    match state.service.embed_artifacts(user_id.as_deref(), &uploads).await {
        Ok(summary) => Ok(Json(EmbedContextReply { success: true, summary })),
        Err(e) => {
            error!(error = %e, "Embedding context failed");
            Err(ApiError::internal("/embed_context"))
        }
    }
}

async fn images_handler(
    State(state): State<SharedState>,
    Query(query): Query<ImagesQuery>,
) -> Result<Json<ImagesReply>, ApiError> {
    match state.service.list_images(query.user_id.as_deref()).await {
        Ok(images) => Ok(Json(ImagesReply { images })),
        Err(e) => {
            error!(error = %e, "Listing images failed");
            Err(ApiError::internal("/get_images"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockEmbedder, MockProvider, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(uri: &str, parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let boundary = "ragchat-test-boundary";
        let mut body = Vec::new();
        for (name, file_name, data) in parts {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            match file_name {
                Some(f) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(data.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn chat_returns_model_reply() {
        let app = api_router(test_state(MockEmbedder::new(), MockProvider::replying("Ahoy!")));

        for uri in ["/api/chat", "/api/chat/prompt", "/prompt"] {
            let response = app
                .clone()
                .oneshot(json_request(uri, json!({ "message": "Hello", "userId": "admin" })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "route {uri}");
            assert_eq!(body_json(response).await, json!({ "response": "Ahoy!" }));
        }
    }

    #[tokio::test]
    async fn missing_message_is_bad_request() {
        let app = api_router(test_state(MockEmbedder::new(), MockProvider::replying("unused")));

        let response = app.oneshot(json_request("/api/chat", json!({ "userId": "admin" }))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("message"));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let app = api_router(test_state(MockEmbedder::new(), MockProvider::replying("unused")));
        let request = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn image_embedding_failure_is_500() {
        let app = api_router(test_state(MockEmbedder::new().failing_images(), MockProvider::replying("unused")));
        let body = json!({
            "message": "Describe this",
            "images": [{ "name": "a.png", "data": STANDARD.encode([1u8, 2]) }],
        });

        let response = app.oneshot(json_request("/api/chat", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({ "error": "/api/chat - An error occurred" }));
    }

    #[tokio::test]
    async fn multipart_chat_with_document() {
        let state = test_state(MockEmbedder::new(), MockProvider::replying("Arr!"));
        let app = api_router(state.clone());

        let response = app
            .oneshot(multipart_request(
                "/api/chat",
                &[
                    ("message", None, "Who are you?"),
                    ("userId", None, "admin"),
                    ("documents", Some("persona.txt"), "Be a pirate."),
                    ("image", Some(""), ""),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "response": "Arr!" }));
    }

    #[tokio::test]
    async fn embed_context_then_list_images() {
        let app = api_router(test_state(MockEmbedder::new().with_caption("a pirate ship"), MockProvider::replying("ok")));

        let response = app
            .clone()
            .oneshot(multipart_request(
                "/embed_context",
                &[
                    ("userId", None, "admin"),
                    ("messages", None, "You are a pirate captain."),
                    ("image", Some("ship.png"), "PNG-BYTES"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "success": true, "stored": 2, "ids": ["message_0", "image_0"] })
        );

        let request = Request::builder()
            .uri("/get_images?userId=admin")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "images": [{ "filename": "ship.png", "caption": "a pirate ship" }] })
        );
    }

    #[tokio::test]
    async fn embed_context_requires_content() {
        let app = api_router(test_state(MockEmbedder::new(), MockProvider::replying("ok")));
        let response = app
            .oneshot(json_request("/embed_context", json!({ "userId": "admin", "messages": "" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn embed_context_rejects_two_images() {
        let app = api_router(test_state(MockEmbedder::new(), MockProvider::replying("ok")));
        let image = json!({ "data": STANDARD.encode([1u8]) });
        let response = app
            .oneshot(json_request("/embed_context", json!({ "images": [image.clone(), image] })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn embed_stores_without_prompting() {
        let app = api_router(test_state(MockEmbedder::new(), MockProvider::failing()));
        let body = json!({
            "documents": [
                { "name": "a.txt", "data": STANDARD.encode("alpha") },
                { "name": "b.txt", "data": STANDARD.encode("beta") },
            ],
        });

        let response = app.oneshot(json_request("/api/chat/embed", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "response": { "stored": 2, "ids": ["document_0", "document_1"] } })
        );
    }
}
