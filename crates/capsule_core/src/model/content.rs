//! Content records and contribution payloads.
//!
//! # Invariants
//! - `text` is present iff `content_type == Text`.
//! - `storage_key` is present iff `content_type != Text`; raw bytes are never
//!   kept on the record.
//! - `sentiment_score` is fixed at creation and is `0.0` for binary content.

use crate::model::capsule::{CapsuleId, PrincipalId};
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable content identifier.
pub type ContentId = Uuid;

/// Kind of a contribution, derived from the payload (never caller-supplied).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    Image,
    Video,
    Other,
}

impl ContentType {
    /// Classifies a binary upload by MIME prefix.
    pub fn from_mime_type(mime_type: &str) -> Self {
        let normalized = mime_type.trim().to_ascii_lowercase();
        if normalized.starts_with("image/") {
            Self::Image
        } else if normalized.starts_with("video/") {
            Self::Video
        } else {
            Self::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// One persisted contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: ContentId,
    pub capsule_id: CapsuleId,
    pub contributor_id: PrincipalId,
    pub content_type: ContentType,
    pub text: Option<String>,
    pub storage_key: Option<String>,
    pub sentiment_score: f64,
    /// Epoch ms.
    pub created_at: i64,
}

/// Uploaded file as received from the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub original_name: String,
}

/// Exactly one kind of contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPayload {
    Text(String),
    Binary(BinaryPayload),
}

/// Raw contribution form where either part may be missing.
///
/// Mirrors multipart input: an optional text field plus an optional file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSubmission {
    pub text: Option<String>,
    pub file: Option<BinaryPayload>,
}

impl ContentSubmission {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            file: None,
        }
    }

    pub fn file(
        bytes: impl Into<Vec<u8>>,
        mime_type: impl Into<String>,
        original_name: impl Into<String>,
    ) -> Self {
        Self {
            text: None,
            file: Some(BinaryPayload {
                bytes: bytes.into(),
                mime_type: mime_type.into(),
                original_name: original_name.into(),
            }),
        }
    }

    /// Resolves the submission to a single payload.
    ///
    /// A file takes precedence over text; blank text counts as absent.
    pub fn into_payload(self) -> Result<ContentPayload, ValidationError> {
        if let Some(file) = self.file {
            return Ok(ContentPayload::Binary(file));
        }
        match self.text {
            Some(text) if !text.trim().is_empty() => Ok(ContentPayload::Text(text)),
            _ => Err(ValidationError::MissingContent),
        }
    }
}

impl From<ContentPayload> for ContentSubmission {
    fn from(value: ContentPayload) -> Self {
        match value {
            ContentPayload::Text(text) => Self {
                text: Some(text),
                file: None,
            },
            ContentPayload::Binary(file) => Self {
                text: None,
                file: Some(file),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ContentPayload, ContentSubmission, ContentType};
    use crate::model::validation::ValidationError;

    #[test]
    fn mime_prefix_classification() {
        assert_eq!(ContentType::from_mime_type("image/png"), ContentType::Image);
        assert_eq!(ContentType::from_mime_type("Video/MP4"), ContentType::Video);
        assert_eq!(
            ContentType::from_mime_type("application/pdf"),
            ContentType::Other
        );
        assert_eq!(ContentType::from_mime_type(""), ContentType::Other);
    }

    #[test]
    fn file_wins_over_text_in_submission() {
        let mut submission = ContentSubmission::file(vec![1, 2], "image/png", "a.png");
        submission.text = Some("ignored".to_string());
        assert!(matches!(
            submission.into_payload(),
            Ok(ContentPayload::Binary(_))
        ));
    }

    #[test]
    fn blank_submission_is_rejected() {
        let err = ContentSubmission::text("   ").into_payload().unwrap_err();
        assert_eq!(err, ValidationError::MissingContent);
        let err = ContentSubmission::default().into_payload().unwrap_err();
        assert_eq!(err, ValidationError::MissingContent);
    }
}
