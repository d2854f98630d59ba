//! Capsule use-case services.
//!
//! # Responsibility
//! - Enforce authorization and time-gating rules above the store.
//! - Keep the API facade decoupled from storage details.
//!
//! # Invariants
//! - Authorization is evaluated before any lock-state check.
//! - Lock state is always derived from the injected `Clock`.

pub mod access;
pub mod aggregate;
pub mod ingestion;
pub mod lifecycle;
