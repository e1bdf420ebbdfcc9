//! Client-side panel state.
//!
//! # Responsibility
//! - Own the note collection (`NoteStore`) and the edit session
//!   (`EditSession`) of one panel.
//!
//! # Invariants
//! - Each piece of state is mutated only through its own operations.

pub mod edit_session;
pub mod note_store;
