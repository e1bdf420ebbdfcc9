//! In-memory note collection for one panel.
//!
//! # Responsibility
//! - Hold the ordered notes the panel lists.
//! - Reconcile remote load/create/commit/remove results into that list.
//!
//! # Invariants
//! - Local state changes only after the remote call succeeds; a failed
//!   write leaves the collection exactly as it was.
//! - New notes are prepended; committed notes keep their position.
//! - A note id appears at most once in the collection.
//! - Load responses carry a `LoadToken`; only the most recently issued
//!   token may replace the collection.
//! - A store bound to a workspace only ever holds that workspace's notes.
//!   `reset` rebinds it and advances the `StoreEpoch`; create and load
//!   responses issued under an older epoch or for another workspace are
//!   dropped.
//! - The lock is never held across a remote call.
//!
//! # Known gaps
//! - Load failures are logged and swallowed; callers keep stale data.
//! - A load issued before a local create/commit/remove but completing after
//!   it still replaces the collection with the server snapshot it carried.

use crate::model::note::{Note, NoteId, WorkspaceId};
use crate::remote::{NoteService, RemoteResult};
use log::{info, warn};
use parking_lot::Mutex;

/// Identifies one issued load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadToken(u64);

/// Generation of the collection. Advanced whenever responses still in
/// flight must no longer land (panel closed or re-targeted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StoreEpoch(u64);

/// How a completed load affected the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The collection was replaced with `count` notes.
    Applied { count: usize },
    /// A newer load was issued or the store was re-targeted meanwhile;
    /// the response was dropped.
    Stale,
    /// The remote call failed; the previous collection was kept.
    Failed,
}

#[derive(Debug, Default)]
struct StoreState {
    notes: Vec<Note>,
    last_issued_load: u64,
    epoch: u64,
    workspace_id: Option<WorkspaceId>,
}

impl StoreState {
    fn accepts(&self, workspace_id: WorkspaceId) -> bool {
        self.workspace_id.map_or(true, |bound| bound == workspace_id)
    }

    fn prepend(&mut self, note: Note) {
        self.notes.retain(|existing| existing.id != note.id);
        self.notes.insert(0, note);
    }

    fn replace_in_place(&mut self, note: Note) -> bool {
        match self.notes.iter_mut().find(|existing| existing.id == note.id) {
            Some(slot) => {
                *slot = note;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, note_id: NoteId) -> bool {
        let before = self.notes.len();
        self.notes.retain(|existing| existing.id != note_id);
        self.notes.len() != before
    }
}

/// Ordered note collection owned by one panel.
#[derive(Debug, Default)]
pub struct NoteStore {
    state: Mutex<StoreState>,
}

impl NoteStore {
    /// Creates an unbound store; any workspace's responses are accepted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that only holds notes of `workspace_id`.
    pub fn for_workspace(workspace_id: WorkspaceId) -> Self {
        let store = Self::new();
        store.state.lock().workspace_id = Some(workspace_id);
        store
    }

    /// Workspace the store is bound to, if any.
    pub fn workspace_id(&self) -> Option<WorkspaceId> {
        self.state.lock().workspace_id
    }

    pub fn epoch(&self) -> StoreEpoch {
        StoreEpoch(self.state.lock().epoch)
    }

    /// Advances the epoch so that creates still in flight are dropped when
    /// they land. The collection is kept.
    pub fn advance_epoch(&self) -> StoreEpoch {
        let mut state = self.state.lock();
        state.epoch += 1;
        info!("event=store_epoch module=store epoch={}", state.epoch);
        StoreEpoch(state.epoch)
    }

    /// Rebinds the store to `workspace_id`: clears the collection, advances
    /// the epoch and supersedes every issued load.
    pub fn reset(&self, workspace_id: WorkspaceId) -> StoreEpoch {
        let mut state = self.state.lock();
        state.notes.clear();
        state.workspace_id = Some(workspace_id);
        state.epoch += 1;
        state.last_issued_load += 1;
        info!(
            "event=store_reset module=store workspace_id={workspace_id} epoch={}",
            state.epoch
        );
        StoreEpoch(state.epoch)
    }

    /// Copy of the current collection in display order.
    pub fn notes(&self) -> Vec<Note> {
        self.state.lock().notes.clone()
    }

    pub fn get(&self, note_id: NoteId) -> Option<Note> {
        self.state
            .lock()
            .notes
            .iter()
            .find(|note| note.id == note_id)
            .cloned()
    }

    pub fn contains(&self, note_id: NoteId) -> bool {
        self.state.lock().notes.iter().any(|note| note.id == note_id)
    }

    pub fn len(&self) -> usize {
        self.state.lock().notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().notes.is_empty()
    }

    /// Issues a new load token, superseding every earlier one.
    pub fn begin_load(&self) -> LoadToken {
        let mut state = self.state.lock();
        state.last_issued_load += 1;
        LoadToken(state.last_issued_load)
    }

    /// Applies a load response if `token` is still the latest issued.
    pub fn finish_load(&self, token: LoadToken, result: RemoteResult<Vec<Note>>) -> LoadOutcome {
        self.apply_load(token, None, result)
    }

    fn apply_load(
        &self,
        token: LoadToken,
        workspace_id: Option<WorkspaceId>,
        result: RemoteResult<Vec<Note>>,
    ) -> LoadOutcome {
        let mut state = self.state.lock();
        if token.0 != state.last_issued_load {
            info!(
                "event=notes_load module=store status=ignored reason=stale token={} latest={}",
                token.0, state.last_issued_load
            );
            return LoadOutcome::Stale;
        }
        if let Some(requested) = workspace_id.filter(|ws| !state.accepts(*ws)) {
            info!(
                "event=notes_load module=store status=ignored reason=foreign_workspace workspace_id={requested}"
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(notes) => {
                let count = notes.len();
                state.notes = notes;
                info!("event=notes_load module=store status=ok count={count}");
                LoadOutcome::Applied { count }
            }
            Err(err) => {
                warn!(
                    "event=notes_load module=store status=error kept={} error={err}",
                    state.notes.len()
                );
                LoadOutcome::Failed
            }
        }
    }

    /// Fetches the workspace's notes and replaces the collection.
    ///
    /// Failures are not returned: the previous collection stays in place and
    /// the outcome is `LoadOutcome::Failed`. A response for a workspace the
    /// store is no longer bound to is `LoadOutcome::Stale`.
    pub async fn load<S>(&self, service: &S, workspace_id: WorkspaceId) -> LoadOutcome
    where
        S: NoteService + ?Sized,
    {
        let token = self.begin_load();
        let result = service.list_notes(workspace_id).await;
        self.apply_load(token, Some(workspace_id), result)
    }

    /// Creates a note remotely and prepends the server's copy.
    ///
    /// Returns `Ok(None)` when the response no longer belongs here: the
    /// epoch advanced while the call was in flight, or the note is not in
    /// the store's workspace. The note then exists remotely but is not
    /// listed until the next load.
    ///
    /// # Errors
    /// - The remote create failed; the collection is unchanged.
    pub async fn create<S>(
        &self,
        service: &S,
        workspace_id: WorkspaceId,
        title: &str,
        content: &str,
    ) -> RemoteResult<Option<Note>>
    where
        S: NoteService + ?Sized,
    {
        let issued = self.epoch();
        let note = service
            .create_note(workspace_id, title, content)
            .await
            .inspect_err(|err| {
                warn!("event=note_create module=store status=error workspace_id={workspace_id} error={err}");
            })?;

        let mut state = self.state.lock();
        if state.epoch != issued.0
            || note.workspace_id != workspace_id
            || !state.accepts(note.workspace_id)
        {
            info!(
                "event=note_create module=store status=ignored reason=superseded note_id={} workspace_id={}",
                note.id, note.workspace_id
            );
            return Ok(None);
        }
        state.prepend(note.clone());
        info!("event=note_create module=store status=ok note_id={}", note.id);
        Ok(Some(note))
    }

    /// Writes title/content remotely and replaces the entry in place.
    ///
    /// The server copy is returned even when the note is no longer listed.
    ///
    /// # Errors
    /// - The remote update failed; the collection is unchanged.
    pub async fn commit<S>(
        &self,
        service: &S,
        note_id: NoteId,
        title: &str,
        content: &str,
    ) -> RemoteResult<Note>
    where
        S: NoteService + ?Sized,
    {
        let note = service
            .update_note(note_id, title, content)
            .await
            .inspect_err(|err| {
                warn!("event=note_commit module=store status=error note_id={note_id} error={err}");
            })?;
        if self.state.lock().replace_in_place(note.clone()) {
            info!("event=note_commit module=store status=ok note_id={note_id}");
        } else {
            info!("event=note_commit module=store status=ok note_id={note_id} local=absent");
        }
        Ok(note)
    }

    /// Deletes a note remotely, then drops it locally.
    ///
    /// Returns `Ok(false)` without calling the service when the note is not
    /// in the collection.
    ///
    /// # Errors
    /// - The remote delete failed; the note stays listed.
    pub async fn remove<S>(&self, service: &S, note_id: NoteId) -> RemoteResult<bool>
    where
        S: NoteService + ?Sized,
    {
        if !self.contains(note_id) {
            info!("event=note_remove module=store status=ignored reason=absent note_id={note_id}");
            return Ok(false);
        }

        service.delete_note(note_id).await.inspect_err(|err| {
            warn!("event=note_remove module=store status=error note_id={note_id} error={err}");
        })?;
        let removed = self.state.lock().remove(note_id);
        info!("event=note_remove module=store status=ok note_id={note_id} removed={removed}");
        Ok(removed)
    }
}
