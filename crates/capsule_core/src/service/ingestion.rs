//! Content ingestion service.
//!
//! # Responsibility
//! - Validate contributions against ownership and the lock window.
//! - Route binary payloads to the object store and text to the scorer.
//!
//! # Invariants
//! - No content is persisted at or after `unlock_at`; the final check runs
//!   inside the store transaction that inserts the row.
//! - Binary rows store only a storage key and score `0.0`.
//! - An upload followed by a failed insert leaves an orphaned blob; this is
//!   logged at `warn` with the key and never hidden.

use crate::clock::Clock;
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::error::{CapsuleError, CapsuleResult};
use crate::media::ObjectStore;
use crate::model::capsule::{CapsuleId, PrincipalId};
use crate::model::content::{
    BinaryPayload, Content, ContentPayload, ContentSubmission, ContentType,
};
use crate::model::validation::ValidationError;
use crate::repo::capsule_repo::CapsuleStore;
use crate::sentiment::SentimentScorer;
use crate::service::access::{AccessControl, CapsuleAction};
use log::{error, info, warn};
use std::sync::Arc;
use uuid::Uuid;

/// Contribution entry point over a store, an object store and a scorer.
pub struct ContentIngestion<S: CapsuleStore> {
    store: S,
    clock: Arc<dyn Clock>,
    objects: Arc<dyn ObjectStore>,
    scorer: Arc<dyn SentimentScorer>,
    access: AccessControl,
    max_upload_bytes: usize,
}

impl<S: CapsuleStore> ContentIngestion<S> {
    pub fn new(
        store: S,
        clock: Arc<dyn Clock>,
        objects: Arc<dyn ObjectStore>,
        scorer: Arc<dyn SentimentScorer>,
    ) -> Self {
        Self {
            store,
            clock,
            objects,
            scorer,
            access: AccessControl,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Adds one typed payload to a locked capsule.
    pub fn add_content(
        &self,
        principal: &PrincipalId,
        capsule_id: CapsuleId,
        payload: ContentPayload,
    ) -> CapsuleResult<Content> {
        self.add_submission(principal, capsule_id, payload.into())
    }

    /// Adds a raw text/file submission to a locked capsule.
    ///
    /// # Errors
    /// - `NotFound` when the capsule is missing or not owned by `principal`.
    /// - `Validation` when the capsule is unlocked, nothing was submitted, or
    ///   the upload is empty or over the size limit.
    /// - `Storage` when the object store or the database fails.
    pub fn add_submission(
        &self,
        principal: &PrincipalId,
        capsule_id: CapsuleId,
        submission: ContentSubmission,
    ) -> CapsuleResult<Content> {
        let capsule = self.access.load_authorized(
            &self.store,
            principal,
            capsule_id,
            CapsuleAction::Contribute,
        )?;
        if !capsule.lock_state(self.clock.now_ms()).is_locked() {
            info!(
                "event=content_add module=ingestion status=rejected capsule_id={capsule_id} reason=unlocked"
            );
            return Err(ValidationError::ContributionAfterUnlock.into());
        }

        let mut content = Content {
            id: Uuid::new_v4(),
            capsule_id,
            contributor_id: principal.clone(),
            content_type: ContentType::Text,
            text: None,
            storage_key: None,
            sentiment_score: 0.0,
            created_at: 0,
        };
        match submission.into_payload()? {
            ContentPayload::Binary(file) => {
                content.content_type = ContentType::from_mime_type(&file.mime_type);
                content.storage_key = Some(self.upload(capsule_id, &file)?);
            }
            ContentPayload::Text(text) => {
                content.sentiment_score = self.score_text(&text);
                content.text = Some(text);
            }
        }

        match self
            .store
            .insert_content_while_locked(&content, self.clock.as_ref())
        {
            Ok(committed) => {
                info!(
                    "event=content_add module=ingestion status=ok capsule_id={capsule_id} content_id={} content_type={}",
                    committed.id,
                    committed.content_type.as_str()
                );
                Ok(committed)
            }
            Err(err) => {
                if let Some(key) = content.storage_key.as_deref() {
                    warn!(
                        "event=content_add module=ingestion status=warn capsule_id={capsule_id} orphaned_storage_key={key} error={err}"
                    );
                } else {
                    info!(
                        "event=content_add module=ingestion status=rejected capsule_id={capsule_id} error={err}"
                    );
                }
                Err(CapsuleError::from(err))
            }
        }
    }

    fn upload(&self, capsule_id: CapsuleId, file: &BinaryPayload) -> CapsuleResult<String> {
        if file.bytes.is_empty() {
            return Err(ValidationError::EmptyUpload.into());
        }
        if file.bytes.len() > self.max_upload_bytes {
            return Err(ValidationError::UploadTooLarge {
                size: file.bytes.len(),
                limit: self.max_upload_bytes,
            }
            .into());
        }

        self.objects
            .put(&file.bytes, &file.mime_type, &file.original_name)
            .map_err(|err| {
                error!(
                    "event=content_upload module=ingestion status=error capsule_id={capsule_id} size_bytes={} error={err}",
                    file.bytes.len()
                );
                CapsuleError::from(err)
            })
    }

    fn score_text(&self, text: &str) -> f64 {
        let score = self.scorer.score(text);
        if score.is_finite() {
            return score;
        }
        warn!("event=content_score module=ingestion status=warn reason=non_finite_score");
        0.0
    }
}
