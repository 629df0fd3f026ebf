//! Domain model for owned records.
//!
//! # Responsibility
//! - Define the article and post records exchanged by every layer.
//! - Own input-shape validation for create/update payloads.
//!
//! # Invariants
//! - Every record is identified by a store-generated `RecordId`.
//! - The owner field is stamped at creation and never changes.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod article;
pub mod post;
pub mod record;
