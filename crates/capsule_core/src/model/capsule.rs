//! Capsule record, principal identity and derived lock state.
//!
//! # Invariants
//! - `creator_id`, `unlock_at` and `created_at` never change after creation.
//! - `unlock_at > created_at` for every persisted capsule.
//! - `LockState` flips from `Locked` to `Unlocked` exactly once, at
//!   `now == unlock_at`, and never back.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable capsule identifier.
pub type CapsuleId = Uuid;

/// Authenticated caller identity, opaque beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for PrincipalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Derived visibility state of a capsule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockState {
    /// `now < unlock_at`: contents hidden, contributions and edits allowed.
    Locked,
    /// `now >= unlock_at`: contents readable, no further writes except delete.
    Unlocked,
}

impl LockState {
    /// Classifies `now_ms` against the unlock instant.
    pub fn at(unlock_at_ms: i64, now_ms: i64) -> Self {
        if now_ms < unlock_at_ms {
            Self::Locked
        } else {
            Self::Unlocked
        }
    }

    pub fn is_locked(self) -> bool {
        self == Self::Locked
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "LOCKED",
            Self::Unlocked => "UNLOCKED",
        }
    }
}

/// Canonical capsule record as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capsule {
    pub id: CapsuleId,
    pub creator_id: PrincipalId,
    pub title: String,
    pub description: Option<String>,
    /// Epoch ms after which contents become readable.
    pub unlock_at: i64,
    /// Stored and echoed back; grants nothing to other principals.
    pub is_communal: bool,
    /// Epoch ms, set once by the lifecycle service.
    pub created_at: i64,
}

impl Capsule {
    pub fn lock_state(&self, now_ms: i64) -> LockState {
        LockState::at(self.unlock_at, now_ms)
    }

    pub fn is_created_by(&self, principal: &PrincipalId) -> bool {
        &self.creator_id == principal
    }
}

/// Caller input for capsule creation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCapsule {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Epoch ms; must be strictly after the creation instant.
    pub unlock_at: i64,
    /// Defaults to `false` when omitted.
    #[serde(default)]
    pub is_communal: Option<bool>,
}

/// Partial metadata update.
///
/// Only fields set on the patch are written; `unlock_at` and `creator_id` are
/// not patchable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapsulePatch {
    #[serde(default)]
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub is_communal: Option<bool>,
}

impl CapsulePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<impl Into<String>>) -> Self {
        self.description = Some(description.map(Into::into));
        self
    }

    pub fn communal(mut self, is_communal: bool) -> Self {
        self.is_communal = Some(is_communal);
        self
    }

    /// True when no recognized field is supplied.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.is_communal.is_none()
    }

    /// Applies the supplied subset onto `capsule`, leaving other fields as-is.
    pub fn apply_to(&self, capsule: &mut Capsule) {
        if let Some(title) = self.title.as_ref() {
            capsule.title = title.clone();
        }
        if let Some(description) = self.description.as_ref() {
            capsule.description = description.clone();
        }
        if let Some(is_communal) = self.is_communal {
            capsule.is_communal = is_communal;
        }
    }
}

// Distinguishes an explicit `"description": null` from an absent key.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
