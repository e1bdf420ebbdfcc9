//! Edit session state machine.
//!
//! # Responsibility
//! - Track the single note draft a panel is editing, if any.
//! - Track which note's transform menu is open, independently of editing.
//!
//! # Invariants
//! - At most one draft exists per session.
//! - A draft owns copies of the note fields; editing it never touches the
//!   stored note until a commit succeeds.
//! - Switching to another note, cancelling, or resetting discards the
//!   current draft without merging it anywhere.

use crate::model::note::{Note, NoteId};
use crate::state::note_store::NoteStore;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Invalid edit session operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// No draft is open.
    NotEditing,
    /// The draft is waiting for its note to be created.
    UnboundDraft,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotEditing => f.write_str("no note is being edited"),
            Self::UnboundDraft => f.write_str("draft is not bound to a created note yet"),
        }
    }
}

impl Error for SessionError {}

/// Uncommitted title/content pair for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    note_id: Option<NoteId>,
    title: String,
    content: String,
}

impl Draft {
    fn blank() -> Self {
        Self {
            note_id: None,
            title: String::new(),
            content: String::new(),
        }
    }

    fn from_note(note: &Note) -> Self {
        Self {
            note_id: Some(note.id),
            title: note.title.clone(),
            content: note.content.clone(),
        }
    }

    /// Target note, or `None` while a create is still in flight.
    pub fn note_id(&self) -> Option<NoteId> {
        self.note_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    fn is_blank(&self) -> bool {
        self.title.is_empty() && self.content.is_empty()
    }
}

/// Editing lifecycle of a panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Idle,
    Editing(Draft),
}

/// Edit state plus the transform menu sub-mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSession {
    state: EditState,
    transform_menu: Option<NoteId>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            EditState::Idle => None,
            EditState::Editing(draft) => Some(draft),
        }
    }

    /// Note targeted by the open draft.
    pub fn editing_note(&self) -> Option<NoteId> {
        self.draft().and_then(Draft::note_id)
    }

    pub fn is_idle(&self) -> bool {
        self.state == EditState::Idle
    }

    /// Opens a blank, unbound draft and returns the state it replaced.
    pub fn start_create(&mut self) -> EditState {
        let previous = std::mem::replace(&mut self.state, EditState::Editing(Draft::blank()));
        log_discard("start_create", &previous);
        previous
    }

    /// Binds the created note to the unbound draft. Fields still blank are
    /// seeded from the note.
    ///
    /// Returns `false` when the session moved on while the create was in
    /// flight; the session is then left alone.
    pub fn bind_created(&mut self, note: &Note) -> bool {
        let EditState::Editing(draft) = &mut self.state else {
            return false;
        };
        if draft.note_id.is_some() {
            return false;
        }

        draft.note_id = Some(note.id);
        if draft.title.is_empty() {
            draft.title = note.title.clone();
        }
        if draft.content.is_empty() {
            draft.content = note.content.clone();
        }
        true
    }

    /// Restores `previous` if the unbound draft opened by `start_create` is
    /// still current. Used when the create call fails.
    pub fn abandon_create(&mut self, previous: EditState) {
        if matches!(&self.state, EditState::Editing(draft) if draft.note_id.is_none()) {
            self.state = previous;
        }
    }

    /// Opens a draft seeded from `note`, discarding any other draft.
    ///
    /// Returns the discarded draft so callers can tell the user about it.
    pub fn start_edit(&mut self, note: &Note) -> Option<Draft> {
        let previous = std::mem::replace(&mut self.state, EditState::Editing(Draft::from_note(note)));
        log_discard("start_edit", &previous);
        match previous {
            EditState::Editing(draft) => Some(draft),
            EditState::Idle => None,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), SessionError> {
        self.draft_mut()?.title = title.into();
        Ok(())
    }

    pub fn set_content(&mut self, content: impl Into<String>) -> Result<(), SessionError> {
        self.draft_mut()?.content = content.into();
        Ok(())
    }

    /// Drops the draft and returns to `Idle`.
    pub fn cancel(&mut self) -> Option<Draft> {
        match std::mem::take(&mut self.state) {
            EditState::Editing(draft) => Some(draft),
            EditState::Idle => None,
        }
    }

    /// Snapshot of the draft to commit.
    pub fn commit_target(&self) -> Result<Draft, SessionError> {
        let draft = self.draft().ok_or(SessionError::NotEditing)?;
        if draft.note_id.is_none() {
            return Err(SessionError::UnboundDraft);
        }
        Ok(draft.clone())
    }

    /// Returns to `Idle` after `saved` was committed, unless the draft was
    /// switched or edited further while the commit was in flight.
    pub fn finish_save(&mut self, saved: &Draft) -> bool {
        if self.draft() == Some(saved) {
            self.state = EditState::Idle;
            return true;
        }
        false
    }

    /// Opens a draft for `note` holding `transformed` as content and the
    /// note's current title; closes the transform menu. Returns the new
    /// draft.
    pub fn apply_transform(&mut self, note: &Note, transformed: String) -> Draft {
        let draft = Draft {
            note_id: Some(note.id),
            title: note.title.clone(),
            content: transformed,
        };
        let previous = std::mem::replace(&mut self.state, EditState::Editing(draft.clone()));
        self.transform_menu = None;
        log_discard("apply_transform", &previous);
        draft
    }

    /// Toggles the transform menu for `note_id`; returns whether it is open.
    pub fn toggle_transform_menu(&mut self, note_id: NoteId) -> bool {
        if self.transform_menu == Some(note_id) {
            self.transform_menu = None;
            false
        } else {
            self.transform_menu = Some(note_id);
            true
        }
    }

    pub fn close_transform_menu(&mut self) {
        self.transform_menu = None;
    }

    pub fn transform_menu(&self) -> Option<NoteId> {
        self.transform_menu
    }

    /// Drops everything: draft and menu. Used when the panel closes.
    pub fn reset(&mut self) -> Option<Draft> {
        self.transform_menu = None;
        self.cancel()
    }

    /// Whether the draft differs from the note it targets in `store`.
    ///
    /// An unbound draft counts as unsaved when it is not blank; a draft
    /// whose note is no longer listed always does.
    pub fn has_unsaved_changes(&self, store: &NoteStore) -> bool {
        let Some(draft) = self.draft() else {
            return false;
        };
        let Some(note_id) = draft.note_id else {
            return !draft.is_blank();
        };
        match store.get(note_id) {
            Some(note) => draft.title != note.title || draft.content != note.content,
            None => true,
        }
    }

    fn draft_mut(&mut self) -> Result<&mut Draft, SessionError> {
        match &mut self.state {
            EditState::Editing(draft) => Ok(draft),
            EditState::Idle => Err(SessionError::NotEditing),
        }
    }
}

fn log_discard(trigger: &str, previous: &EditState) {
    if let EditState::Editing(draft) = previous {
        let note_id = draft
            .note_id
            .map_or_else(|| "unbound".to_string(), |id| id.to_string());
        info!("event=draft_discarded module=session trigger={trigger} note_id={note_id}");
    }
}

#[cfg(test)]
mod tests {
    use super::{EditSession, EditState, SessionError};
    use crate::model::note::Note;
    use crate::state::note_store::NoteStore;
    use chrono::Utc;

    fn note(id: i64, title: &str, content: &str) -> Note {
        Note {
            id,
            workspace_id: 1,
            title: title.to_string(),
            content: content.to_string(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn start_edit_copies_fields_without_aliasing() {
        let stored = note(5, "Title", "Body");
        let store = NoteStore::new();
        let token = store.begin_load();
        store.finish_load(token, Ok(vec![stored.clone()]));
        let mut session = EditSession::new();
        assert!(session.start_edit(&stored).is_none());
        assert!(!session.has_unsaved_changes(&store));

        session.set_content("changed").unwrap();
        assert_eq!(stored.content, "Body");
        assert_eq!(session.draft().unwrap().content(), "changed");
        assert!(session.has_unsaved_changes(&store));
    }

    #[test]
    fn switching_notes_discards_previous_draft_verbatim() {
        let five = note(5, "five", "5");
        let seven = note(7, "seven", "7");
        let mut session = EditSession::new();
        session.start_edit(&five);
        session.set_title("unsaved").unwrap();

        let discarded = session.start_edit(&seven).unwrap();
        assert_eq!(discarded.note_id(), Some(5));
        assert_eq!(discarded.title(), "unsaved");

        let draft = session.draft().unwrap();
        assert_eq!(draft.note_id(), Some(7));
        assert_eq!(draft.title(), "seven");
        assert_eq!(draft.content(), "7");
    }

    #[test]
    fn cancel_returns_to_idle() {
        let mut session = EditSession::new();
        session.start_edit(&note(1, "a", "b"));
        assert!(session.cancel().is_some());
        assert!(session.is_idle());
        assert_eq!(session.set_title("x"), Err(SessionError::NotEditing));
    }

    #[test]
    fn unbound_draft_cannot_be_committed_until_bound() {
        let mut session = EditSession::new();
        session.start_create();
        assert_eq!(session.commit_target(), Err(SessionError::UnboundDraft));

        session.set_content("typed early").unwrap();
        assert!(session.bind_created(&note(9, "New Note", "")));
        let draft = session.commit_target().unwrap();
        assert_eq!(draft.note_id(), Some(9));
        assert_eq!(draft.title(), "New Note");
        assert_eq!(draft.content(), "typed early");
    }

    #[test]
    fn abandon_create_restores_previous_state() {
        let mut session = EditSession::new();
        session.start_edit(&note(3, "t", "c"));
        let previous = session.start_create();
        session.abandon_create(previous);
        assert_eq!(session.editing_note(), Some(3));
    }

    #[test]
    fn finish_save_keeps_newer_edits() {
        let mut session = EditSession::new();
        session.start_edit(&note(1, "a", "b"));
        let saved = session.commit_target().unwrap();
        session.set_content("typed during save").unwrap();

        assert!(!session.finish_save(&saved));
        assert!(!session.is_idle());

        let saved = session.commit_target().unwrap();
        assert!(session.finish_save(&saved));
        assert_eq!(session.state(), &EditState::Idle);
    }

    #[test]
    fn transform_menu_is_independent_of_editing() {
        let mut session = EditSession::new();
        session.start_edit(&note(1, "a", "b"));
        assert!(session.toggle_transform_menu(2));
        assert_eq!(session.transform_menu(), Some(2));
        assert_eq!(session.editing_note(), Some(1));
        assert!(!session.toggle_transform_menu(2));
        assert_eq!(session.transform_menu(), None);
    }

    #[test]
    fn apply_transform_uses_note_title_not_open_draft() {
        let mut session = EditSession::new();
        session.start_edit(&note(1, "other", "draft"));
        session.toggle_transform_menu(4);

        session.apply_transform(&note(4, "Four", "old"), "summary".to_string());
        let draft = session.draft().unwrap();
        assert_eq!(draft.note_id(), Some(4));
        assert_eq!(draft.title(), "Four");
        assert_eq!(draft.content(), "summary");
        assert_eq!(session.transform_menu(), None);
    }

    #[test]
    fn unsaved_changes_for_unbound_and_unlisted_drafts() {
        let store = NoteStore::new();
        let mut session = EditSession::new();
        assert!(!session.has_unsaved_changes(&store));

        session.start_create();
        assert!(!session.has_unsaved_changes(&store));
        session.set_title("typed").unwrap();
        assert!(session.has_unsaved_changes(&store));

        session.start_edit(&note(8, "gone", ""));
        assert!(session.has_unsaved_changes(&store));
    }
}
