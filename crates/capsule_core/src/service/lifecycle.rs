//! Capsule lifecycle service.
//!
//! # Responsibility
//! - Create, list, update, delete and view capsules.
//! - Apply the time gate: edits only while locked, contents visible only
//!   once unlocked.
//!
//! # Invariants
//! - A locked view never exposes content rows, scores or counts, even to the
//!   creator.
//! - `unlock_at` and `creator_id` are immutable; no operation relocks.
//! - Delete succeeds in both lock states and removes every content row.

use crate::clock::Clock;
use crate::error::{CapsuleError, CapsuleResult};
use crate::model::capsule::{Capsule, CapsuleId, CapsulePatch, LockState, NewCapsule, PrincipalId};
use crate::model::content::Content;
use crate::model::validation::ValidationError;
use crate::repo::capsule_repo::{CapsuleStore, RepoError};
use crate::service::access::{AccessControl, CapsuleAction};
use crate::service::aggregate::{ContentAggregator, SentimentSummary};
use chrono::{DateTime, Utc};
use log::{error, info};
use std::sync::Arc;
use uuid::Uuid;

/// Read model returned by [`CapsuleLifecycle::view`].
#[derive(Debug, Clone, PartialEq)]
pub enum CapsuleView {
    Locked {
        capsule: Capsule,
        /// Names the unlock date, e.g. "This capsule is locked until Wed Oct 21 2026".
        message: String,
    },
    Unlocked {
        capsule: Capsule,
        contents: Vec<Content>,
        summary: SentimentSummary,
    },
}

impl CapsuleView {
    pub fn state(&self) -> LockState {
        match self {
            Self::Locked { .. } => LockState::Locked,
            Self::Unlocked { .. } => LockState::Unlocked,
        }
    }

    pub fn capsule(&self) -> &Capsule {
        match self {
            Self::Locked { capsule, .. } | Self::Unlocked { capsule, .. } => capsule,
        }
    }

    /// Contents visible to the caller; always empty while locked.
    pub fn contents(&self) -> &[Content] {
        match self {
            Self::Locked { .. } => &[],
            Self::Unlocked { contents, .. } => contents,
        }
    }

    /// Aggregate tone; only available once unlocked.
    pub fn summary(&self) -> Option<&SentimentSummary> {
        match self {
            Self::Locked { .. } => None,
            Self::Unlocked { summary, .. } => Some(summary),
        }
    }
}

/// Outcome of a successful delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletedCapsule {
    pub capsule_id: CapsuleId,
    pub removed_contents: usize,
}

/// Capsule lifecycle facade over a store implementation.
pub struct CapsuleLifecycle<S: CapsuleStore> {
    store: S,
    clock: Arc<dyn Clock>,
    access: AccessControl,
    aggregator: ContentAggregator,
}

impl<S: CapsuleStore> CapsuleLifecycle<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            access: AccessControl,
            aggregator: ContentAggregator,
        }
    }

    /// Current lock state of `capsule` per the injected clock.
    pub fn lock_state(&self, capsule: &Capsule) -> LockState {
        capsule.lock_state(self.clock.now_ms())
    }

    /// Creates a capsule owned by `creator`.
    ///
    /// # Errors
    /// - `Validation` when the title is blank or `unlock_at` is not strictly
    ///   after now.
    pub fn create(&self, creator: &PrincipalId, input: NewCapsule) -> CapsuleResult<Capsule> {
        let title = normalize_title(&input.title)?;
        let now = self.clock.now_ms();
        if input.unlock_at <= now {
            return Err(ValidationError::UnlockNotInFuture {
                unlock_at: input.unlock_at,
                now,
            }
            .into());
        }

        let capsule = Capsule {
            id: Uuid::new_v4(),
            creator_id: creator.clone(),
            title,
            description: normalize_description(input.description),
            unlock_at: input.unlock_at,
            is_communal: input.is_communal.unwrap_or(false),
            created_at: now,
        };
        if let Err(err) = self.store.insert_capsule(&capsule) {
            error!(
                "event=capsule_create module=lifecycle status=error capsule_id={} error={err}",
                capsule.id
            );
            return Err(err.into());
        }

        info!(
            "event=capsule_create module=lifecycle status=ok capsule_id={} unlock_at={}",
            capsule.id, capsule.unlock_at
        );
        Ok(capsule)
    }

    /// Lists capsules created by `principal`, newest first.
    pub fn list_owned(&self, principal: &PrincipalId) -> CapsuleResult<Vec<Capsule>> {
        Ok(self.store.list_capsules_by_creator(principal)?)
    }

    /// Applies a partial metadata update while the capsule is locked.
    ///
    /// # Errors
    /// - `Validation` for an empty patch or blank title (checked first).
    /// - `NotFound` / `Auth` for a missing or foreign capsule.
    /// - `Validation` once the capsule is unlocked, including when it
    ///   unlocks between the check and the write.
    pub fn update(
        &self,
        principal: &PrincipalId,
        capsule_id: CapsuleId,
        patch: CapsulePatch,
    ) -> CapsuleResult<Capsule> {
        let patch = normalize_patch(patch)?;
        let capsule =
            self.access
                .load_authorized(&self.store, principal, capsule_id, CapsuleAction::Update)?;
        if !self.lock_state(&capsule).is_locked() {
            info!(
                "event=capsule_update module=lifecycle status=rejected capsule_id={capsule_id} reason=unlocked"
            );
            return Err(ValidationError::EditAfterUnlock.into());
        }

        let updated = self
            .store
            .apply_patch(capsule_id, &patch, self.clock.as_ref())
            .map_err(|err| match err {
                RepoError::CapsuleUnlocked(_) => {
                    CapsuleError::Validation(ValidationError::EditAfterUnlock)
                }
                other => CapsuleError::from(other),
            })?;
        info!("event=capsule_update module=lifecycle status=ok capsule_id={capsule_id}");
        Ok(updated)
    }

    /// Deletes a capsule and all its contents, in either lock state.
    pub fn delete(
        &self,
        principal: &PrincipalId,
        capsule_id: CapsuleId,
    ) -> CapsuleResult<DeletedCapsule> {
        self.access
            .load_authorized(&self.store, principal, capsule_id, CapsuleAction::Delete)?;
        let removed_contents = self.store.delete_capsule_cascade(capsule_id)?;
        info!(
            "event=capsule_delete module=lifecycle status=ok capsule_id={capsule_id} removed_contents={removed_contents}"
        );
        Ok(DeletedCapsule {
            capsule_id,
            removed_contents,
        })
    }

    /// Returns the time-gated view of a capsule.
    pub fn view(
        &self,
        principal: &PrincipalId,
        capsule_id: CapsuleId,
    ) -> CapsuleResult<CapsuleView> {
        let capsule =
            self.access
                .load_authorized(&self.store, principal, capsule_id, CapsuleAction::Read)?;

        if self.lock_state(&capsule).is_locked() {
            let message = locked_message(capsule.unlock_at);
            return Ok(CapsuleView::Locked { capsule, message });
        }

        let contents = self.store.list_contents(capsule_id)?;
        let summary = self.aggregator.summarize(&contents);
        Ok(CapsuleView::Unlocked {
            capsule,
            contents,
            summary,
        })
    }
}

/// Human-readable lock notice, dates rendered in UTC.
pub fn locked_message(unlock_at_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(unlock_at_ms) {
        Some(unlock_at) => format!(
            "This capsule is locked until {}",
            unlock_at.format("%a %b %d %Y")
        ),
        None => "This capsule is locked".to_string(),
    }
}

fn normalize_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankTitle);
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn normalize_patch(patch: CapsulePatch) -> Result<CapsulePatch, ValidationError> {
    if patch.is_empty() {
        return Err(ValidationError::EmptyPatch);
    }
    Ok(CapsulePatch {
        title: patch.title.as_deref().map(normalize_title).transpose()?,
        description: patch.description.map(normalize_description),
        is_communal: patch.is_communal,
    })
}
