//! Use-case level API for transport bindings.
//!
//! # Responsibility
//! - Expose the seven capsule operations behind bearer authentication.
//! - Return serializable envelopes with stable messages.
//!
//! # Invariants
//! - Every operation authenticates before touching the store.
//! - Failures carry only an error kind and a stable public message; internal
//!   detail goes to the log.

use crate::auth::{bearer_token, TokenVerifier};
use crate::clock::Clock;
use crate::config::MediaConfig;
use crate::error::{CapsuleError, ErrorKind};
use crate::media::ObjectStore;
use crate::model::capsule::{Capsule, CapsuleId, CapsulePatch, LockState, NewCapsule, PrincipalId};
use crate::model::content::{Content, ContentSubmission};
use crate::repo::capsule_repo::CapsuleStore;
use crate::sentiment::SentimentScorer;
use crate::service::aggregate::Mood;
use crate::service::ingestion::ContentIngestion;
use crate::service::lifecycle::{CapsuleLifecycle, CapsuleView};
use log::error;
use serde::Serialize;
use std::sync::Arc;

pub type ApiResult<T> = Result<T, ApiFailure>;

/// Serializable failure envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<CapsuleError> for ApiFailure {
    fn from(value: CapsuleError) -> Self {
        if value.kind() == ErrorKind::Storage {
            error!("event=api_failure module=api status=error kind=storage error={value}");
        }
        Self {
            kind: value.kind(),
            message: value.public_message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapsuleCreated {
    pub message: &'static str,
    pub capsule: Capsule,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapsuleUpdated {
    pub message: &'static str,
    pub capsule: Capsule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapsuleDeleted {
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapsuleList {
    pub capsules: Vec<Capsule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentAdded {
    pub message: &'static str,
    pub content: Content,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedMediaUrl {
    pub url: String,
}

/// Capsule metadata plus the time-gated part of its detail.
///
/// Locked: `message` set, `contents` empty, no sentiment fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapsuleDetail {
    #[serde(flatten)]
    pub capsule: Capsule,
    pub status: LockState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_sentiment_score: Option<f64>,
    /// Rounded to two decimals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_sentiment_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_summary: Option<Mood>,
}

impl From<CapsuleView> for CapsuleDetail {
    fn from(view: CapsuleView) -> Self {
        match view {
            CapsuleView::Locked { capsule, message } => Self {
                capsule,
                status: LockState::Locked,
                message: Some(message),
                contents: Vec::new(),
                total_sentiment_score: None,
                average_sentiment_score: None,
                mood_summary: None,
            },
            CapsuleView::Unlocked {
                capsule,
                contents,
                summary,
            } => Self {
                capsule,
                status: LockState::Unlocked,
                message: None,
                contents,
                total_sentiment_score: Some(summary.total),
                average_sentiment_score: Some(summary.average_rounded()),
                mood_summary: Some(summary.mood),
            },
        }
    }
}

/// Collaborators shared by every operation.
pub struct ApiDeps {
    pub verifier: Arc<dyn TokenVerifier>,
    pub clock: Arc<dyn Clock>,
    pub objects: Arc<dyn ObjectStore>,
    pub scorer: Arc<dyn SentimentScorer>,
}

/// Authenticated facade over lifecycle and ingestion services.
pub struct CapsuleApi<S: CapsuleStore> {
    verifier: Arc<dyn TokenVerifier>,
    clock: Arc<dyn Clock>,
    objects: Arc<dyn ObjectStore>,
    lifecycle: CapsuleLifecycle<S>,
    ingestion: ContentIngestion<S>,
    signed_url_ttl_secs: u64,
}

impl<S: CapsuleStore + Clone> CapsuleApi<S> {
    pub fn new(store: S, deps: ApiDeps, media: &MediaConfig) -> Self {
        let lifecycle = CapsuleLifecycle::new(store.clone(), deps.clock.clone());
        let ingestion = ContentIngestion::new(
            store,
            deps.clock.clone(),
            deps.objects.clone(),
            deps.scorer,
        )
        .with_max_upload_bytes(media.max_upload_bytes);
        Self {
            verifier: deps.verifier,
            clock: deps.clock,
            objects: deps.objects,
            lifecycle,
            ingestion,
            signed_url_ttl_secs: media.signed_url_ttl_secs,
        }
    }
}

impl<S: CapsuleStore> CapsuleApi<S> {
    /// CreateCapsule.
    pub fn create_capsule(
        &self,
        authorization: Option<&str>,
        input: NewCapsule,
    ) -> ApiResult<CapsuleCreated> {
        let principal = self.authenticate(authorization)?;
        let capsule = self.lifecycle.create(&principal, input)?;
        Ok(CapsuleCreated {
            message: "Time capsule created successfully.",
            capsule,
        })
    }

    /// ListOwnedCapsules, newest first.
    pub fn list_owned_capsules(&self, authorization: Option<&str>) -> ApiResult<CapsuleList> {
        let principal = self.authenticate(authorization)?;
        Ok(CapsuleList {
            capsules: self.lifecycle.list_owned(&principal)?,
        })
    }

    /// GetCapsuleDetail.
    pub fn get_capsule_detail(
        &self,
        authorization: Option<&str>,
        capsule_id: &str,
    ) -> ApiResult<CapsuleDetail> {
        let principal = self.authenticate(authorization)?;
        let capsule_id = parse_capsule_id(capsule_id)?;
        Ok(self.lifecycle.view(&principal, capsule_id)?.into())
    }

    /// UpdateCapsule.
    pub fn update_capsule(
        &self,
        authorization: Option<&str>,
        capsule_id: &str,
        patch: CapsulePatch,
    ) -> ApiResult<CapsuleUpdated> {
        let principal = self.authenticate(authorization)?;
        let capsule_id = parse_capsule_id(capsule_id)?;
        let capsule = self.lifecycle.update(&principal, capsule_id, patch)?;
        Ok(CapsuleUpdated {
            message: "Time capsule updated successfully.",
            capsule,
        })
    }

    /// DeleteCapsule.
    pub fn delete_capsule(
        &self,
        authorization: Option<&str>,
        capsule_id: &str,
    ) -> ApiResult<CapsuleDeleted> {
        let principal = self.authenticate(authorization)?;
        let capsule_id = parse_capsule_id(capsule_id)?;
        self.lifecycle.delete(&principal, capsule_id)?;
        Ok(CapsuleDeleted {
            message: "Time capsule deleted successfully.",
        })
    }

    /// AddContent.
    pub fn add_content(
        &self,
        authorization: Option<&str>,
        capsule_id: &str,
        submission: ContentSubmission,
    ) -> ApiResult<ContentAdded> {
        let principal = self.authenticate(authorization)?;
        let capsule_id = parse_capsule_id(capsule_id)?;
        let content = self
            .ingestion
            .add_submission(&principal, capsule_id, submission)?;
        Ok(ContentAdded {
            message: "Content successfully added to capsule.",
            content,
        })
    }

    /// GetSignedMediaUrl; any authenticated principal may ask.
    pub fn signed_media_url(
        &self,
        authorization: Option<&str>,
        storage_key: &str,
    ) -> ApiResult<SignedMediaUrl> {
        self.authenticate(authorization)?;
        let url = self
            .objects
            .signed_url(storage_key, self.signed_url_ttl_secs, self.clock.now_ms())
            .map_err(CapsuleError::from)?;
        Ok(SignedMediaUrl { url })
    }

    fn authenticate(&self, authorization: Option<&str>) -> Result<PrincipalId, CapsuleError> {
        let token = bearer_token(authorization)?;
        self.verifier.verify(token)
    }
}

// Malformed ids cannot name an existing capsule.
fn parse_capsule_id(value: &str) -> Result<CapsuleId, CapsuleError> {
    CapsuleId::parse_str(value.trim()).map_err(|_| CapsuleError::NotFound)
}
