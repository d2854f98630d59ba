//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the capsule store contract used by lifecycle/ingestion services.
//! - Isolate SQLite query details from business orchestration.
//!
//! # Invariants
//! - Time-gated writes re-check the lock state inside their own transaction.
//! - Capsule deletion removes every owned content row in the same transaction.
//! - Read paths reject invalid persisted rows instead of masking them.

pub mod capsule_repo;
