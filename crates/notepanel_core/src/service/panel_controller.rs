//! Notes panel controller.
//!
//! # Responsibility
//! - Own panel visibility and the per-panel note store, edit session and
//!   transform coordinator.
//! - Translate user intents (open, create, edit, save, delete, transform,
//!   close) into store/session/coordinator operations.
//! - Project the current state into a `PanelView` for rendering.
//!
//! # Invariants
//! - `open` always reloads; nothing is cached across opens.
//! - `close` and note switches drop uncommitted drafts without prompting.
//! - `close` and `switch_workspace` advance the store epoch before touching
//!   the session, so creates and transforms still in flight cannot land in
//!   a hidden or re-targeted panel.
//! - Failed create/save/delete/transform calls return an error and leave
//!   local state as it was before the attempt.
//! - No lock is held across a remote call, so overlapping calls may
//!   complete in any order.

use crate::model::note::{Note, NoteId, TransformAction, WorkspaceId};
use crate::remote::{NoteService, RemoteError};
use crate::service::preview::derive_preview;
use crate::service::transform_coordinator::{
    TransformCoordinator, TransformError, TransformRequest,
};
use crate::state::edit_session::{Draft, EditSession, EditState, SessionError};
use crate::state::note_store::{LoadOutcome, NoteStore};
use log::{info, warn};
use parking_lot::Mutex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Title given to notes created from the panel.
pub const DEFAULT_NOTE_TITLE: &str = "New Note";

/// Result alias for panel actions.
pub type PanelResult<T> = Result<T, PanelError>;

/// User-visible failure of a panel action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelError {
    /// Note service call failed.
    Remote(RemoteError),
    /// Transform was rejected or failed.
    Transform(TransformError),
    /// Action does not fit the current edit state.
    Session(SessionError),
    /// Referenced note is not in the panel's list.
    NoteNotFound(NoteId),
    /// The panel closed or switched workspace before the response arrived.
    Superseded,
}

impl Display for PanelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(err) => write!(f, "{err}"),
            Self::Transform(err) => write!(f, "{err}"),
            Self::Session(err) => write!(f, "{err}"),
            Self::NoteNotFound(note_id) => write!(f, "note not found: {note_id}"),
            Self::Superseded => f.write_str("panel moved on before the response arrived"),
        }
    }
}

impl Error for PanelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Remote(err) => Some(err),
            Self::Transform(err) => Some(err),
            Self::Session(err) => Some(err),
            Self::NoteNotFound(_) | Self::Superseded => None,
        }
    }
}

impl From<RemoteError> for PanelError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

impl From<TransformError> for PanelError {
    fn from(value: TransformError) -> Self {
        Self::Transform(value)
    }
}

impl From<SessionError> for PanelError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

/// One row of the rendered note list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListItem {
    pub id: NoteId,
    pub title: String,
    pub preview: Option<String>,
    /// `YYYY-MM-DD` of the last server-side update.
    pub updated_on: String,
    pub is_editing: bool,
    pub menu_open: bool,
}

/// Render snapshot of the whole panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub visible: bool,
    pub loading: bool,
    pub transforming: bool,
    pub items: Vec<NoteListItem>,
    pub draft: Option<Draft>,
}

impl PanelView {
    /// Whether the "no notes yet" placeholder applies.
    pub fn is_empty(&self) -> bool {
        !self.loading && self.items.is_empty()
    }
}

#[derive(Debug)]
struct PanelFlags {
    workspace_id: WorkspaceId,
    visible: bool,
    loading: bool,
}

/// Controller for one notes panel instance.
pub struct PanelController<S: NoteService> {
    service: S,
    flags: Mutex<PanelFlags>,
    store: NoteStore,
    session: Mutex<EditSession>,
    transforms: TransformCoordinator,
}

impl<S: NoteService> PanelController<S> {
    /// Creates a hidden panel for `workspace_id`.
    pub fn new(service: S, workspace_id: WorkspaceId) -> Self {
        Self {
            service,
            flags: Mutex::new(PanelFlags {
                workspace_id,
                visible: false,
                loading: true,
            }),
            store: NoteStore::for_workspace(workspace_id),
            session: Mutex::new(EditSession::new()),
            transforms: TransformCoordinator::new(),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn workspace_id(&self) -> WorkspaceId {
        self.flags.lock().workspace_id
    }

    pub fn is_visible(&self) -> bool {
        self.flags.lock().visible
    }

    /// True until the panel's first load completes.
    pub fn is_loading(&self) -> bool {
        self.flags.lock().loading
    }

    pub fn is_transforming(&self) -> bool {
        self.transforms.is_busy()
    }

    pub fn notes(&self) -> Vec<Note> {
        self.store.notes()
    }

    pub fn edit_state(&self) -> EditState {
        self.session.lock().state().clone()
    }

    pub fn draft(&self) -> Option<Draft> {
        self.session.lock().draft().cloned()
    }

    pub fn transform_menu(&self) -> Option<NoteId> {
        self.session.lock().transform_menu()
    }

    /// Shows the panel and reloads its notes.
    pub async fn open(&self) -> LoadOutcome {
        let workspace_id = {
            let mut flags = self.flags.lock();
            flags.visible = true;
            flags.workspace_id
        };
        info!("event=panel_open module=panel workspace_id={workspace_id}");
        self.reload().await
    }

    /// Hides the panel. Any open draft and transform menu are dropped, and
    /// creates or transforms still in flight will not reopen a draft.
    pub fn close(&self) {
        self.flags.lock().visible = false;
        self.store.advance_epoch();
        let discarded = self.session.lock().reset();
        info!(
            "event=panel_close module=panel draft_discarded={}",
            discarded.is_some()
        );
    }

    /// Fetches the workspace's notes. Failures keep the current list and
    /// are only logged.
    pub async fn reload(&self) -> LoadOutcome {
        let workspace_id = self.workspace_id();
        let outcome = self.store.load(&self.service, workspace_id).await;
        if outcome != LoadOutcome::Stale {
            self.flags.lock().loading = false;
        }
        outcome
    }

    /// Points the panel at another workspace: empties the list, drops the
    /// draft and menu, and reloads when visible. Responses of calls issued
    /// for the previous workspace are discarded when they land.
    pub async fn switch_workspace(&self, workspace_id: WorkspaceId) -> Option<LoadOutcome> {
        let visible = {
            let mut flags = self.flags.lock();
            flags.workspace_id = workspace_id;
            flags.visible
        };
        self.store.reset(workspace_id);
        self.session.lock().reset();
        info!("event=panel_switch_workspace module=panel workspace_id={workspace_id}");
        if visible {
            Some(self.reload().await)
        } else {
            None
        }
    }

    /// Creates a `"New Note"` note and opens it for editing.
    ///
    /// If the user opened another draft while the create was in flight,
    /// the new note is listed but the newer draft is kept.
    ///
    /// # Errors
    /// - `Remote` when the create fails; the session returns to the state
    ///   it had before the call.
    /// - `Superseded` when the panel closed or switched workspace while the
    ///   call was in flight; the note exists remotely but is not listed.
    pub async fn create_note(&self) -> PanelResult<Note> {
        let issued = self.store.epoch();
        let previous = self.session.lock().start_create();
        let workspace_id = self.workspace_id();
        let created = self
            .store
            .create(&self.service, workspace_id, DEFAULT_NOTE_TITLE, "")
            .await;

        let mut session = self.session.lock();
        let current = self.store.epoch() == issued;
        match created {
            Ok(Some(note)) if current => {
                if !session.bind_created(&note) {
                    info!(
                        "event=draft_bind module=panel status=ignored note_id={}",
                        note.id
                    );
                }
                Ok(note)
            }
            Ok(_) => {
                info!("event=note_create module=panel status=ignored reason=superseded workspace_id={workspace_id}");
                Err(PanelError::Superseded)
            }
            Err(err) => {
                if current {
                    session.abandon_create(previous);
                }
                Err(err.into())
            }
        }
    }

    /// Opens `note_id` for editing, dropping any other draft.
    ///
    /// Returns the discarded draft, if there was one.
    pub fn start_edit(&self, note_id: NoteId) -> PanelResult<Option<Draft>> {
        let note = self
            .store
            .get(note_id)
            .ok_or(PanelError::NoteNotFound(note_id))?;
        Ok(self.session.lock().start_edit(&note))
    }

    pub fn set_draft_title(&self, title: impl Into<String>) -> PanelResult<()> {
        Ok(self.session.lock().set_title(title)?)
    }

    pub fn set_draft_content(&self, content: impl Into<String>) -> PanelResult<()> {
        Ok(self.session.lock().set_content(content)?)
    }

    pub fn cancel_edit(&self) -> Option<Draft> {
        self.session.lock().cancel()
    }

    /// Commits the open draft. If the draft was switched or edited while
    /// the commit was in flight, the newer draft stays open.
    ///
    /// # Errors
    /// - `Session(NotEditing)` when no draft is open.
    /// - `Session(UnboundDraft)` while the draft's create is in flight.
    /// - `Remote` when the update fails; the draft stays open for retry.
    pub async fn save(&self) -> PanelResult<Note> {
        let draft = self.session.lock().commit_target()?;
        let note_id = draft.note_id().ok_or(SessionError::UnboundDraft)?;
        let note = self
            .store
            .commit(&self.service, note_id, draft.title(), draft.content())
            .await?;
        if !self.session.lock().finish_save(&draft) {
            info!("event=draft_save module=panel status=ok note_id={note_id} session=moved_on");
        }
        Ok(note)
    }

    /// Deletes a note once the service acknowledges it. Deleting a note that
    /// is not listed is a no-op returning `Ok(false)`.
    ///
    /// # Errors
    /// - `Remote` when the delete fails; the note and any draft of it stay.
    pub async fn delete_note(&self, note_id: NoteId) -> PanelResult<bool> {
        let removed = self.store.remove(&self.service, note_id).await?;
        if removed {
            let mut session = self.session.lock();
            if session.editing_note() == Some(note_id) {
                session.cancel();
            }
            if session.transform_menu() == Some(note_id) {
                session.close_transform_menu();
            }
        }
        Ok(removed)
    }

    /// Toggles the transform menu of `note_id`; returns whether it is open.
    pub fn toggle_transform_menu(&self, note_id: NoteId) -> bool {
        self.session.lock().toggle_transform_menu(note_id)
    }

    /// Runs an AI transform and opens its result as the note's draft.
    ///
    /// # Errors
    /// - `Transform(Busy)` while another transform is in flight anywhere in
    ///   the panel.
    /// - `Transform(Superseded)` when the panel closed or switched workspace
    ///   before the result arrived; the session is left alone.
    /// - `Transform(Remote | NoteNotFound)` as returned by the coordinator.
    pub async fn transform(&self, note_id: NoteId, action: TransformAction) -> PanelResult<Draft> {
        let request = TransformRequest { note_id, action };
        self.transforms
            .invoke(&self.service, &self.store, &self.session, request)
            .await
            .map_err(|err| {
                if !matches!(err, TransformError::Busy | TransformError::Superseded(_)) {
                    warn!("event=transform_surface module=panel note_id={note_id} error={err}");
                }
                PanelError::from(err)
            })
    }

    /// Whether the open draft differs from its stored note.
    pub fn has_unsaved_changes(&self) -> bool {
        self.session.lock().has_unsaved_changes(&self.store)
    }

    /// Render snapshot of the panel.
    pub fn view(&self) -> PanelView {
        let (visible, loading) = {
            let flags = self.flags.lock();
            (flags.visible, flags.loading)
        };
        let notes = self.store.notes();
        let (editing, menu, draft) = {
            let session = self.session.lock();
            (
                session.editing_note(),
                session.transform_menu(),
                session.draft().cloned(),
            )
        };

        let items = notes
            .into_iter()
            .map(|note| NoteListItem {
                id: note.id,
                preview: derive_preview(&note.content),
                updated_on: note.updated_at.format("%Y-%m-%d").to_string(),
                is_editing: editing == Some(note.id),
                menu_open: menu == Some(note.id),
                title: note.title,
            })
            .collect();

        PanelView {
            visible,
            loading,
            transforming: self.transforms.is_busy(),
            items,
            draft,
        }
    }
}
