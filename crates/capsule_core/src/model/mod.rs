//! Capsule domain model.
//!
//! # Responsibility
//! - Define the capsule/content records shared by store, services and API.
//! - Hold pure derivations that need no storage (lock state, content kind).
//!
//! # Invariants
//! - Lock state is derived from `unlock_at` and "now"; it is never persisted.
//! - Content is immutable once created and always belongs to one capsule.

pub mod capsule;
pub mod content;
pub mod validation;
