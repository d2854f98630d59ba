//! Public error taxonomy for capsule operations.
//!
//! # Responsibility
//! - Collapse store/media/validation failures into five caller-facing kinds.
//! - Provide stable user-visible messages free of ids and source detail.
//!
//! # Invariants
//! - `Auth` messages never reveal whether a capsule exists beyond the
//!   documented not-found vs forbidden distinction.
//! - `Storage` keeps its source for logs; `public_message()` drops it.

use crate::media::MediaError;
use crate::model::validation::ValidationError;
use crate::repo::capsule_repo::RepoError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CapsuleResult<T> = Result<T, CapsuleError>;

/// Caller-facing error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Auth,
    NotFound,
    Conflict,
    Storage,
}

/// Authentication/authorization failure reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Missing or malformed bearer credential.
    MissingToken,
    /// Credential rejected by the verifier.
    InvalidToken,
    /// Authenticated principal is not allowed to touch the capsule.
    Forbidden,
}

/// Failure of a persistence or object-store collaborator.
#[derive(Debug)]
pub enum StorageFailure {
    Repo(RepoError),
    Media(MediaError),
}

impl Display for StorageFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Media(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StorageFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Media(err) => Some(err),
        }
    }
}

/// Error returned by every capsule use-case.
#[derive(Debug)]
pub enum CapsuleError {
    Validation(ValidationError),
    Auth(AuthFailure),
    NotFound,
    Conflict(&'static str),
    Storage(StorageFailure),
}

impl CapsuleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Auth(_) => ErrorKind::Auth,
            Self::NotFound => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Stable message safe to show to callers.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::Auth(AuthFailure::MissingToken) => {
                "Access denied. No token provided or malformed token.".to_string()
            }
            Self::Auth(AuthFailure::InvalidToken) => "Invalid or expired token.".to_string(),
            Self::Auth(AuthFailure::Forbidden) => {
                "Forbidden. You do not have access to this capsule.".to_string()
            }
            Self::NotFound => "Capsule not found.".to_string(),
            Self::Conflict(message) => (*message).to_string(),
            Self::Storage(_) => "Storage failure. Please retry later.".to_string(),
        }
    }

    pub fn forbidden() -> Self {
        Self::Auth(AuthFailure::Forbidden)
    }
}

impl Display for CapsuleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "storage failure: {err}"),
            other => f.write_str(&other.public_message()),
        }
    }
}

impl Error for CapsuleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for CapsuleError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<MediaError> for CapsuleError {
    fn from(value: MediaError) -> Self {
        Self::Storage(StorageFailure::Media(value))
    }
}

impl From<RepoError> for CapsuleError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::CapsuleNotFound(_) => Self::NotFound,
            // Only contributions reach the store without an earlier lock check
            // mapping; edits remap this at the call site.
            RepoError::CapsuleUnlocked(_) => {
                Self::Validation(ValidationError::ContributionAfterUnlock)
            }
            RepoError::Db(err) if err.is_unique_violation() => {
                Self::Conflict("A record with this identifier already exists.")
            }
            other => Self::Storage(StorageFailure::Repo(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthFailure, CapsuleError, ErrorKind};
    use crate::model::validation::ValidationError;
    use crate::repo::capsule_repo::RepoError;
    use uuid::Uuid;

    #[test]
    fn repo_errors_map_to_public_kinds() {
        let id = Uuid::new_v4();
        assert_eq!(
            CapsuleError::from(RepoError::CapsuleNotFound(id)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CapsuleError::from(RepoError::CapsuleUnlocked(id)).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CapsuleError::from(RepoError::InvalidData("x".to_string())).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn public_messages_hide_internal_detail() {
        let id = Uuid::new_v4();
        let storage = CapsuleError::from(RepoError::InvalidData(format!("row {id}")));
        assert!(!storage.public_message().contains(&id.to_string()));
        assert!(storage.to_string().contains(&id.to_string()));

        let forbidden = CapsuleError::Auth(AuthFailure::Forbidden);
        assert!(forbidden.public_message().starts_with("Forbidden"));

        let validation = CapsuleError::from(ValidationError::ContributionAfterUnlock);
        assert_eq!(
            validation.public_message(),
            "Cannot contribute to an unlocked capsule."
        );
    }
}
