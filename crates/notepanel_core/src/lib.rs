//! Client-side core of the workspace notes panel.
//! This crate owns note list state, the edit session state machine and
//! AI transform coordination against a remote note service.

pub mod config;
pub mod logging;
pub mod model;
pub mod remote;
pub mod service;
pub mod state;

pub use config::{ClientConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteId, TransformAction, UnknownTransformAction, WorkspaceId};
pub use remote::http::HttpNoteService;
pub use remote::{CredentialProvider, NoteService, RemoteError, RemoteResult, StaticCredential};
pub use service::panel_controller::{
    NoteListItem, PanelController, PanelError, PanelResult, PanelView, DEFAULT_NOTE_TITLE,
};
pub use service::preview::derive_preview;
pub use service::transform_coordinator::{
    TransformCoordinator, TransformError, TransformPermit, TransformRequest,
};
pub use state::edit_session::{Draft, EditSession, EditState, SessionError};
pub use state::note_store::{LoadOutcome, LoadToken, NoteStore, StoreEpoch};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
