#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use notepanel_core::{
    Note, NoteId, NoteService, RemoteError, RemoteResult, TransformAction, WorkspaceId,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Create,
    Update,
    Delete,
    Transform,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(WorkspaceId),
    Create {
        workspace_id: WorkspaceId,
        title: String,
        content: String,
    },
    Update {
        note_id: NoteId,
        title: String,
        content: String,
    },
    Delete(NoteId),
    Transform(NoteId, TransformAction),
}

impl Call {
    fn op(&self) -> Op {
        match self {
            Self::List(_) => Op::List,
            Self::Create { .. } => Op::Create,
            Self::Update { .. } => Op::Update,
            Self::Delete(_) => Op::Delete,
            Self::Transform(..) => Op::Transform,
        }
    }
}

#[derive(Default)]
struct FakeState {
    notes: Vec<Note>,
    next_id: NoteId,
    clock: i64,
    failures: HashMap<Op, VecDeque<RemoteError>>,
    gates: HashMap<Op, VecDeque<oneshot::Receiver<()>>>,
    calls: Vec<Call>,
}

impl FakeState {
    fn tick(&mut self) -> chrono::DateTime<Utc> {
        self.clock += 1;
        Utc.timestamp_opt(1_700_000_000 + self.clock, 0)
            .single()
            .expect("valid fake timestamp")
    }
}

/// In-memory note service. Each call is recorded and applied when it
/// arrives; `hold_next` delays the response until the sender fires.
pub struct FakeNoteService {
    state: Mutex<FakeState>,
}

pub fn note(id: NoteId, workspace_id: WorkspaceId, title: &str, content: &str) -> Note {
    Note {
        id,
        workspace_id,
        title: title.to_string(),
        content: content.to_string(),
        updated_at: Utc
            .timestamp_opt(1_700_000_000, 0)
            .single()
            .expect("valid fake timestamp"),
    }
}

impl FakeNoteService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_id: 1,
                ..FakeState::default()
            }),
        }
    }

    /// Server-side notes, listed in the given order.
    pub fn with_notes(notes: Vec<Note>) -> Self {
        let service = Self::new();
        {
            let mut state = service.state.lock();
            state.next_id = notes.iter().map(|n| n.id).max().unwrap_or(0) + 1;
            state.notes = notes;
        }
        service
    }

    pub fn set_next_id(&self, next_id: NoteId) {
        self.state.lock().next_id = next_id;
    }

    /// Adds a note server-side, as another client would.
    pub fn seed(&self, workspace_id: WorkspaceId, title: &str, content: &str) -> Note {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        let mut created = note(id, workspace_id, title, content);
        created.updated_at = state.tick();
        state.notes.insert(0, created.clone());
        created
    }

    pub fn fail_next(&self, op: Op, error: RemoteError) {
        self.state
            .lock()
            .failures
            .entry(op)
            .or_default()
            .push_back(error);
    }

    pub fn hold_next(&self, op: Op) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().gates.entry(op).or_default().push_back(rx);
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.op() == op)
            .count()
    }

    pub fn server_note(&self, note_id: NoteId) -> Option<Note> {
        self.state
            .lock()
            .notes
            .iter()
            .find(|n| n.id == note_id)
            .cloned()
    }

    fn begin(&self, call: Call) -> (Option<RemoteError>, Option<oneshot::Receiver<()>>) {
        let op = call.op();
        let mut state = self.state.lock();
        state.calls.push(call);
        let failure = state.failures.get_mut(&op).and_then(VecDeque::pop_front);
        let gate = state.gates.get_mut(&op).and_then(VecDeque::pop_front);
        (failure, gate)
    }

    fn not_found(note_id: NoteId) -> RemoteError {
        RemoteError::Status {
            status: 404,
            message: format!("Note {note_id} not found"),
        }
    }
}

async fn released(gate: Option<oneshot::Receiver<()>>) {
    if let Some(rx) = gate {
        let _ = rx.await;
    }
}

#[async_trait]
impl NoteService for FakeNoteService {
    async fn list_notes(&self, workspace_id: WorkspaceId) -> RemoteResult<Vec<Note>> {
        let (failure, gate) = self.begin(Call::List(workspace_id));
        let result = match failure {
            Some(err) => Err(err),
            None => Ok(self
                .state
                .lock()
                .notes
                .iter()
                .filter(|n| n.workspace_id == workspace_id)
                .cloned()
                .collect()),
        };
        released(gate).await;
        result
    }

    async fn create_note(
        &self,
        workspace_id: WorkspaceId,
        title: &str,
        content: &str,
    ) -> RemoteResult<Note> {
        let (failure, gate) = self.begin(Call::Create {
            workspace_id,
            title: title.to_string(),
            content: content.to_string(),
        });
        let result = match failure {
            Some(err) => Err(err),
            None => Ok(self.seed(workspace_id, title, content)),
        };
        released(gate).await;
        result
    }

    async fn update_note(&self, note_id: NoteId, title: &str, content: &str) -> RemoteResult<Note> {
        let (failure, gate) = self.begin(Call::Update {
            note_id,
            title: title.to_string(),
            content: content.to_string(),
        });
        let result = match failure {
            Some(err) => Err(err),
            None => {
                let mut state = self.state.lock();
                let updated_at = state.tick();
                let updated = state.notes.iter_mut().find(|n| n.id == note_id).map(|stored| {
                    stored.title = title.to_string();
                    stored.content = content.to_string();
                    stored.updated_at = updated_at;
                    stored.clone()
                });
                updated.ok_or_else(|| Self::not_found(note_id))
            }
        };
        released(gate).await;
        result
    }

    async fn delete_note(&self, note_id: NoteId) -> RemoteResult<()> {
        let (failure, gate) = self.begin(Call::Delete(note_id));
        let result = match failure {
            Some(err) => Err(err),
            None => {
                let mut state = self.state.lock();
                let before = state.notes.len();
                state.notes.retain(|n| n.id != note_id);
                if state.notes.len() == before {
                    Err(Self::not_found(note_id))
                } else {
                    Ok(())
                }
            }
        };
        released(gate).await;
        result
    }

    async fn transform_note(
        &self,
        note_id: NoteId,
        action: TransformAction,
    ) -> RemoteResult<String> {
        let (failure, gate) = self.begin(Call::Transform(note_id, action));
        let result = match failure {
            Some(err) => Err(err),
            None => self
                .server_note(note_id)
                .map(|n| format!("{action}: {}", n.content))
                .ok_or_else(|| Self::not_found(note_id)),
        };
        released(gate).await;
        result
    }
}

/// Asserts `future` is parked (typically on a held response) without
/// consuming it.
pub async fn assert_parked<F: Future + Unpin>(future: &mut F) {
    let polled = tokio::time::timeout(Duration::from_millis(20), future).await;
    assert!(polled.is_err(), "future should still be waiting on a held response");
}
