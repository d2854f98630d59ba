//! Core domain logic for time capsules.
//! This crate is the single source of truth for lock-window and ownership
//! invariants.

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod media;
pub mod model;
pub mod repo;
pub mod sentiment;
pub mod service;

pub use api::{ApiDeps, ApiFailure, ApiResult, CapsuleApi, CapsuleDetail};
pub use auth::{bearer_token, StaticTokenVerifier, TokenVerifier};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig, LoggingConfig, MediaConfig};
pub use error::{CapsuleError, CapsuleResult, ErrorKind};
pub use logging::{default_log_level, init_logging, logging_status};
pub use media::{FsObjectStore, MediaError, MemoryObjectStore, ObjectStore};
pub use model::capsule::{Capsule, CapsuleId, CapsulePatch, LockState, NewCapsule, PrincipalId};
pub use model::content::{Content, ContentPayload, ContentSubmission, ContentType};
pub use model::validation::ValidationError;
pub use repo::capsule_repo::{CapsuleStore, RepoError, RepoResult, SqliteCapsuleStore};
pub use sentiment::{LexiconScorer, SentimentScorer};
pub use service::aggregate::{ContentAggregator, Mood, SentimentSummary};
pub use service::ingestion::ContentIngestion;
pub use service::lifecycle::{CapsuleLifecycle, CapsuleView};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
