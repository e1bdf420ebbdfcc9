//! Panel use-case services.
//!
//! # Responsibility
//! - Orchestrate remote calls and local state into user-level actions.
//! - Keep UI hosts decoupled from wire and locking details.

pub mod panel_controller;
pub mod preview;
pub mod transform_coordinator;
