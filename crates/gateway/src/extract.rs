//! Request body extraction shared by every upload-accepting route.
//!
//! Bodies arrive either as JSON (files base64-encoded) or as
//! `multipart/form-data` (files as parts). Both are normalised into an
//! [`UploadForm`].

use axum::Json;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ragchat_core::artifact::{Artifact, ArtifactKind};
use ragchat_core::error::TransportError;
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;

/// A normalised upload.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub message: Option<String>,
    pub user_id: Option<String>,
    /// Free-text context entries (`messages` field)
    pub texts: Vec<String>,
    /// Images and documents in upload order
    pub artifacts: Vec<Artifact>,
}

impl UploadForm {
    /// The chat message, which must be present and non-blank.
    pub fn require_message(&self) -> Result<&str, TransportError> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| TransportError::MissingField("message".into()))
    }

    pub fn image_count(&self) -> usize {
        self.artifacts.iter().filter(|a| a.kind == ArtifactKind::Image).count()
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, TransportError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| TransportError::MalformedBody(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().filter(|f| !f.is_empty()).map(str::to_string);

            match name.as_str() {
                "message" | "userId" | "messages" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| TransportError::InvalidField {
                            field: name.clone(),
                            reason: e.body_text(),
                        })?;
                    match name.as_str() {
                        "message" => form.message = Some(value),
                        "userId" => form.user_id = Some(value),
                        _ => form.push_text(value),
                    }
                }
                "image" | "images" | "document" | "documents" => {
                    let data = field.bytes().await.map_err(|e| TransportError::InvalidField {
                        field: name.clone(),
                        reason: e.body_text(),
                    })?;
                    // Browsers send an empty part for an unset file input.
                    if data.is_empty() {
                        continue;
                    }
                    let kind = if name.starts_with("image") {
                        ArtifactKind::Image
                    } else {
                        ArtifactKind::Document
                    };
                    form.push_file(kind, file_name, data.to_vec());
                }
                other => debug!(field = other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    fn from_json(body: JsonUpload) -> Result<Self, TransportError> {
        let mut form = UploadForm {
            message: body.message,
            user_id: body.user_id,
            ..UploadForm::default()
        };

        match body.messages {
            Some(TextList::One(text)) => form.push_text(text),
            Some(TextList::Many(texts)) => texts.into_iter().for_each(|t| form.push_text(t)),
            None => {}
        }

        let images = body.image.into_iter().chain(body.images).map(|f| (ArtifactKind::Image, f));
        let documents = body
            .document
            .into_iter()
            .chain(body.documents)
            .map(|f| (ArtifactKind::Document, f));

        for (kind, file) in images.chain(documents) {
            let data = decode_base64(kind, &file.data)?;
            form.push_file(kind, file.name, data);
        }

        Ok(form)
    }

    fn push_text(&mut self, text: String) {
        if !text.trim().is_empty() {
            self.texts.push(text);
        }
    }

    fn push_file(&mut self, kind: ArtifactKind, name: Option<String>, data: Vec<u8>) {
        let index = self.artifacts.iter().filter(|a| a.kind == kind).count();
        let name = name.unwrap_or_else(|| format!("{kind}_{index}"));
        self.artifacts.push(match kind {
            ArtifactKind::Image => Artifact::image(name, data),
            _ => Artifact::document(name, data),
        });
    }
}

impl<S> FromRequest<S> for UploadForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| TransportError::MalformedBody(e.body_text()))?;
            Ok(Self::from_multipart(multipart).await?)
        } else {
            let Json(body) = Json::<JsonUpload>::from_request(req, state)
                .await
                .map_err(|e| TransportError::MalformedBody(e.body_text()))?;
            Ok(Self::from_json(body)?)
        }
    }
}

/// Accepts plain base64 or a `data:<mime>;base64,` URL.
fn decode_base64(kind: ArtifactKind, data: &str) -> Result<Vec<u8>, TransportError> {
    let payload = match data.strip_prefix("data:") {
        Some(url) => url.split_once(',').map_or(url, |(_, rest)| rest),
        None => data,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| TransportError::InvalidField {
            field: format!("{kind}.data"),
            reason: e.to_string(),
        })
}

// ── JSON wire types ──────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonUpload {
    message: Option<String>,
    user_id: Option<String>,
    messages: Option<TextList>,
    image: Option<EncodedFile>,
    #[serde(default)]
    images: Vec<EncodedFile>,
    document: Option<EncodedFile>,
    #[serde(default)]
    documents: Vec<EncodedFile>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextList {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
struct EncodedFile {
    name: Option<String>,
    data: String,
}
