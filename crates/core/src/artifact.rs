//! Uploaded artifacts and the embedding records derived from them.
//!
//! An artifact lives only for the duration of one request: it is embedded,
//! written to the user's collection as an [`EmbeddingRecord`], and dropped.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// What kind of thing an artifact (and the record built from it) is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Image,
    Document,
    /// Free text submitted as configuration context
    Message,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "image",
            ArtifactKind::Document => "document",
            ArtifactKind::Message => "message",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded image, document, or context message.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Original file name (or a synthetic one for messages)
    pub name: String,
    pub data: Vec<u8>,
}

impl Artifact {
    pub fn image(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            kind: ArtifactKind::Image,
            name: name.into(),
            data,
        }
    }

    pub fn document(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            kind: ArtifactKind::Document,
            name: name.into(),
            data,
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self {
            kind: ArtifactKind::Message,
            name: "message".into(),
            data: text.into().into_bytes(),
        }
    }

    /// The artifact's text, if it has any.
    ///
    /// Images never do; documents only when their bytes are valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        match self.kind {
            ArtifactKind::Image => None,
            ArtifactKind::Document | ArtifactKind::Message => {
                std::str::from_utf8(&self.data).ok().map(str::trim).filter(|t| !t.is_empty())
            }
        }
    }
}

/// Metadata stored next to each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Absent on records written by other tools
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ArtifactKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Text injected into prompts when this record is retrieved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Vision-service caption, for images embedded in caption mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl RecordMetadata {
    pub fn new(kind: ArtifactKind) -> Self {
        Self {
            kind: Some(kind),
            name: None,
            text: None,
            caption: None,
        }
    }
}

/// A vector plus metadata, keyed by id inside a user's collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// How record ids are assigned within an upsert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdScheme {
    /// `{kind}_{index}`, index counted per kind within one request.
    /// Ids repeat across requests, so later uploads overwrite earlier ones.
    #[default]
    Positional,
    /// `{kind}_{first 16 hex chars of sha256(data)}`, stable across requests.
    ContentHash,
}

impl IdScheme {
    pub fn assign(&self, artifact: &Artifact, index: usize) -> String {
        match self {
            IdScheme::Positional => format!("{}_{index}", artifact.kind),
            IdScheme::ContentHash => {
                let digest = Sha256::digest(&artifact.data);
                format!("{}_{}", artifact.kind, &hex::encode(digest)[..16])
            }
        }
    }
}
