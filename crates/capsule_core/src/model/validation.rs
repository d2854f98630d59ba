//! User-correctable input and time-window violations.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failures reported with a stable, specific message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title missing or blank after trim.
    BlankTitle,
    /// `unlock_at` is not strictly after the creation instant.
    UnlockNotInFuture { unlock_at: i64, now: i64 },
    /// Update patch carries no recognized field.
    EmptyPatch,
    /// Metadata edit attempted once the capsule is readable.
    EditAfterUnlock,
    /// Contribution attempted at or after the unlock instant.
    ContributionAfterUnlock,
    /// Neither text nor file supplied.
    MissingContent,
    /// Uploaded file has zero bytes.
    EmptyUpload,
    /// Uploaded file exceeds the configured limit.
    UploadTooLarge { size: usize, limit: usize },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "Title and unlock date are required."),
            Self::UnlockNotInFuture { .. } => write!(f, "Unlock date must be in the future."),
            Self::EmptyPatch => write!(
                f,
                "At least one field (title, description, or isCommunal) is required for update."
            ),
            Self::EditAfterUnlock => write!(f, "Cannot edit metadata for an unlocked capsule."),
            Self::ContributionAfterUnlock => {
                write!(f, "Cannot contribute to an unlocked capsule.")
            }
            Self::MissingContent => write!(f, "Content (text or file) is required."),
            Self::EmptyUpload => write!(f, "Uploaded file is empty."),
            Self::UploadTooLarge { limit, .. } => {
                write!(f, "Uploaded file exceeds the {limit} byte limit.")
            }
        }
    }
}

impl Error for ValidationError {}
