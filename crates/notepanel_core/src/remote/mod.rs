//! Remote note service contracts.
//!
//! # Responsibility
//! - Define the async seam (`NoteService`) through which the panel talks to
//!   the note service.
//! - Define the bearer credential seam (`CredentialProvider`).
//! - Classify every non-success outcome as `RemoteError`.
//!
//! # Invariants
//! - Implementations never retry, refresh credentials or apply hidden
//!   timeouts; auth failures surface as ordinary `RemoteError::Status`.
//! - Successful writes return the server's view of the note.

pub mod http;

use crate::model::note::{Note, NoteId, TransformAction, WorkspaceId};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result alias for remote note service calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure of a note service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Connection, TLS or timeout failure before a response arrived.
    Transport(String),
    /// Non-success HTTP status.
    Status { status: u16, message: String },
    /// Response body did not match the wire contract.
    Decode(String),
    /// Client could not be constructed from configuration.
    InvalidConfig(String),
}

impl RemoteError {
    /// Returns whether the service rejected the bearer credential.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(details) => write!(f, "note service unreachable: {details}"),
            Self::Status { status, message } => {
                write!(f, "note service returned HTTP {status}: {message}")
            }
            Self::Decode(details) => write!(f, "unexpected note service response: {details}"),
            Self::InvalidConfig(details) => write!(f, "invalid note service client config: {details}"),
        }
    }
}

impl Error for RemoteError {}

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            return Self::Decode(value.to_string());
        }
        if let Some(status) = value.status() {
            return Self::Status {
                status: status.as_u16(),
                message: value.to_string(),
            };
        }
        Self::Transport(value.to_string())
    }
}

/// Supplies the bearer credential attached to every request.
///
/// Owned by the host application session; this crate only reads it.
pub trait CredentialProvider: Send + Sync {
    /// Returns the current bearer token, or `None` when signed out.
    fn bearer_token(&self) -> Option<String>;
}

/// Fixed credential, typically read once from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCredential {
    token: Option<String>,
}

impl StaticCredential {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|value| !value.trim().is_empty()),
        }
    }
}

impl CredentialProvider for StaticCredential {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Async contract of the remote note service.
#[async_trait]
pub trait NoteService: Send + Sync {
    /// Lists notes of one workspace in display order.
    async fn list_notes(&self, workspace_id: WorkspaceId) -> RemoteResult<Vec<Note>>;
    /// Creates one note; the response carries the assigned id.
    async fn create_note(
        &self,
        workspace_id: WorkspaceId,
        title: &str,
        content: &str,
    ) -> RemoteResult<Note>;
    /// Replaces title and content of one note.
    async fn update_note(&self, note_id: NoteId, title: &str, content: &str) -> RemoteResult<Note>;
    /// Deletes one note. `Ok` means the service acknowledged deletion.
    async fn delete_note(&self, note_id: NoteId) -> RemoteResult<()>;
    /// Runs an AI transform over the stored note content and returns the
    /// rewritten text. Never writes the note.
    async fn transform_note(&self, note_id: NoteId, action: TransformAction)
        -> RemoteResult<String>;
}
