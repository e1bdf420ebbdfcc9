//! Typed HTTP client for the note service.
//!
//! # Responsibility
//! - Map each `NoteService` operation onto its method/path/body.
//! - Attach the bearer credential to every request.
//! - Turn non-success responses into `RemoteError::Status` with the
//!   service's `detail` message when one is present.

use crate::config::ClientConfig;
use crate::model::note::{
    CreateNoteBody, Note, NoteId, TransformAction, TransformBody, TransformResponse,
    UpdateNoteBody, WorkspaceId,
};
use crate::remote::{CredentialProvider, NoteService, RemoteError, RemoteResult, StaticCredential};
use async_trait::async_trait;
use log::debug;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

/// `NoteService` over HTTP+JSON.
pub struct HttpNoteService {
    base_url: String,
    client: reqwest::Client,
    credentials: Arc<dyn CredentialProvider>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl HttpNoteService {
    /// Builds a client from configuration, using `api_token` as a static
    /// credential.
    pub fn new(config: &ClientConfig) -> RemoteResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| RemoteError::InvalidConfig(err.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            credentials: Arc::new(StaticCredential::new(config.api_token.clone())),
        })
    }

    /// Replaces the credential source, e.g. with the host session store.
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = credentials;
        self
    }

    fn notes_url(&self) -> String {
        format!("{}/notes", self.base_url)
    }

    fn note_url(&self, note_id: NoteId) -> String {
        format!("{}/notes/{note_id}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Status {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let response = self.send(request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| RemoteError::Decode(err.to_string()))
    }
}

#[async_trait]
impl NoteService for HttpNoteService {
    async fn list_notes(&self, workspace_id: WorkspaceId) -> RemoteResult<Vec<Note>> {
        debug!("event=http_request module=remote op=list_notes workspace_id={workspace_id}");
        let request = self
            .client
            .get(self.notes_url())
            .query(&[("workspace_id", workspace_id)]);
        self.send_json(request).await
    }

    async fn create_note(
        &self,
        workspace_id: WorkspaceId,
        title: &str,
        content: &str,
    ) -> RemoteResult<Note> {
        debug!("event=http_request module=remote op=create_note workspace_id={workspace_id}");
        let request = self.client.post(self.notes_url()).json(&CreateNoteBody {
            workspace_id,
            title,
            content,
        });
        self.send_json(request).await
    }

    async fn update_note(&self, note_id: NoteId, title: &str, content: &str) -> RemoteResult<Note> {
        debug!("event=http_request module=remote op=update_note note_id={note_id}");
        let request = self
            .client
            .patch(self.note_url(note_id))
            .json(&UpdateNoteBody { title, content });
        self.send_json(request).await
    }

    async fn delete_note(&self, note_id: NoteId) -> RemoteResult<()> {
        debug!("event=http_request module=remote op=delete_note note_id={note_id}");
        self.send(self.client.delete(self.note_url(note_id)))
            .await
            .map(|_| ())
    }

    async fn transform_note(
        &self,
        note_id: NoteId,
        action: TransformAction,
    ) -> RemoteResult<String> {
        debug!("event=http_request module=remote op=transform_note note_id={note_id} action={action}");
        let request = self
            .client
            .post(format!("{}/transform", self.note_url(note_id)))
            .json(&TransformBody { action });
        let response: TransformResponse = self.send_json(request).await?;
        Ok(response.transformed_text)
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
