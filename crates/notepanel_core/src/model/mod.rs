//! Domain model for workspace notes and AI transform actions.
//!
//! # Responsibility
//! - Define the note record shared by the store, the edit session and the
//!   remote service seam.
//! - Define the wire bodies exchanged with the note service.
//!
//! # Invariants
//! - A note id is assigned by the remote service and never changes.
//! - A note belongs to exactly one workspace for its whole lifetime.

pub mod note;
