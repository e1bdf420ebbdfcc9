//! AI transform coordination.
//!
//! # Responsibility
//! - Issue transform requests against the note service.
//! - Enforce panel-wide single-flight: one transform in flight at a time.
//! - Feed a successful result into the edit session.
//!
//! # Invariants
//! - The busy check and the busy set happen under one lock section, before
//!   the first suspension point.
//! - The busy flag is released when the `TransformPermit` drops, on success,
//!   failure, or when the invoking future is dropped mid-flight.
//! - A failed or superseded transform leaves the edit session untouched.
//! - A result is applied only if the store epoch is the one observed when
//!   the request was issued; the epoch check and the session write share
//!   the session lock.
//! - Transforms never write the note store.

use crate::model::note::{NoteId, TransformAction};
use crate::remote::{NoteService, RemoteError};
use crate::state::edit_session::{Draft, EditSession};
use crate::state::note_store::NoteStore;
use log::{info, warn};
use parking_lot::Mutex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One transform invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformRequest {
    pub note_id: NoteId,
    pub action: TransformAction,
}

/// Failure of a transform invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// Another transform is already in flight; nothing was sent.
    Busy,
    /// The note service call failed.
    Remote(RemoteError),
    /// The note disappeared from the panel before the result arrived.
    NoteNotFound(NoteId),
    /// The panel closed or switched workspace before the result arrived.
    Superseded(NoteId),
}

impl Display for TransformError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => f.write_str("another transformation is already running"),
            Self::Remote(err) => write!(f, "transformation failed: {err}"),
            Self::NoteNotFound(note_id) => {
                write!(f, "transformation discarded: note {note_id} is no longer listed")
            }
            Self::Superseded(note_id) => {
                write!(f, "transformation discarded: panel moved on from note {note_id}")
            }
        }
    }
}

impl Error for TransformError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }
}

/// Exclusive right to run one transform. Dropping it clears the busy flag.
#[derive(Debug)]
pub struct TransformPermit<'a> {
    coordinator: &'a TransformCoordinator,
    request: TransformRequest,
}

impl TransformPermit<'_> {
    pub fn request(&self) -> TransformRequest {
        self.request
    }
}

impl Drop for TransformPermit<'_> {
    fn drop(&mut self) {
        *self.coordinator.in_flight.lock() = None;
    }
}

/// Single-flight gate for transform requests.
#[derive(Debug, Default)]
pub struct TransformCoordinator {
    in_flight: Mutex<Option<TransformRequest>>,
}

impl TransformCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    /// Request currently holding the permit.
    pub fn in_flight(&self) -> Option<TransformRequest> {
        *self.in_flight.lock()
    }

    /// Acquires the panel-wide permit, or fails with `Busy`.
    pub fn try_acquire(&self, request: TransformRequest) -> Result<TransformPermit<'_>, TransformError> {
        let mut in_flight = self.in_flight.lock();
        if let Some(current) = *in_flight {
            info!(
                "event=transform_rejected module=transform status=ignored reason=busy note_id={} in_flight_note_id={}",
                request.note_id, current.note_id
            );
            return Err(TransformError::Busy);
        }
        *in_flight = Some(request);
        Ok(TransformPermit {
            coordinator: self,
            request,
        })
    }

    /// Runs one transform and, on success, opens the result as the draft of
    /// `request.note_id` with that note's current title.
    ///
    /// # Errors
    /// - `Busy` when another transform holds the permit; nothing is sent.
    /// - `Remote` when the service call fails.
    /// - `Superseded` when the store epoch advanced while the call was in
    ///   flight.
    /// - `NoteNotFound` when the note is no longer listed.
    pub async fn invoke<S>(
        &self,
        service: &S,
        store: &NoteStore,
        session: &Mutex<EditSession>,
        request: TransformRequest,
    ) -> Result<Draft, TransformError>
    where
        S: NoteService + ?Sized,
    {
        let permit = self.try_acquire(request)?;
        let issued = store.epoch();
        info!(
            "event=transform_start module=transform note_id={} action={}",
            request.note_id, request.action
        );

        let transformed = service
            .transform_note(request.note_id, request.action)
            .await
            .map_err(|err| {
                warn!(
                    "event=transform_finish module=transform status=error note_id={} action={} error={err}",
                    request.note_id, request.action
                );
                TransformError::Remote(err)
            })?;

        let mut session = session.lock();
        if store.epoch() != issued {
            info!(
                "event=transform_finish module=transform status=ignored reason=superseded note_id={}",
                request.note_id
            );
            return Err(TransformError::Superseded(request.note_id));
        }
        let Some(note) = store.get(request.note_id) else {
            warn!(
                "event=transform_finish module=transform status=error reason=note_absent note_id={}",
                request.note_id
            );
            return Err(TransformError::NoteNotFound(request.note_id));
        };

        let draft = session.apply_transform(&note, transformed);
        drop(session);
        drop(permit);
        info!(
            "event=transform_finish module=transform status=ok note_id={} action={}",
            request.note_id, request.action
        );
        Ok(draft)
    }
}
