//! Note record and transform action model.
//!
//! # Responsibility
//! - Define `Note` as returned by the note service.
//! - Define the closed set of AI transform actions.
//! - Define request/response bodies for the note service wire contract.
//!
//! # Invariants
//! - `Note::id` and `Note::workspace_id` are server-assigned and immutable.
//! - `updated_at` is refreshed by the server on every successful update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Server-assigned note identifier, unique within a workspace.
pub type NoteId = i64;

/// Opaque identifier of the workspace that owns a note.
pub type WorkspaceId = i64;

/// Persistent note entity as held by the note service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub workspace_id: WorkspaceId,
    /// User-editable, may be empty.
    #[serde(default)]
    pub title: String,
    /// User-editable, may be empty.
    #[serde(default)]
    pub content: String,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// AI rewrite operation applied to a note's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformAction {
    Expand,
    Improve,
    Summarize,
    Continue,
    Translate,
}

impl TransformAction {
    /// All actions in menu order.
    pub const ALL: [TransformAction; 5] = [
        Self::Expand,
        Self::Improve,
        Self::Summarize,
        Self::Continue,
        Self::Translate,
    ];

    /// Stable wire/label name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expand => "expand",
            Self::Improve => "improve",
            Self::Summarize => "summarize",
            Self::Continue => "continue",
            Self::Translate => "translate",
        }
    }
}

impl Display for TransformAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown transform action name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTransformAction(pub String);

impl Display for UnknownTransformAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown transform action `{}`; expected expand|improve|summarize|continue|translate",
            self.0
        )
    }
}

impl Error for UnknownTransformAction {}

impl FromStr for TransformAction {
    type Err = UnknownTransformAction;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| UnknownTransformAction(value.to_string()))
    }
}

/// Body of `POST /notes`.
#[derive(Debug, Serialize)]
pub struct CreateNoteBody<'a> {
    pub workspace_id: WorkspaceId,
    pub title: &'a str,
    pub content: &'a str,
}

/// Body of `PATCH /notes/{id}`.
#[derive(Debug, Serialize)]
pub struct UpdateNoteBody<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

/// Body of `POST /notes/{id}/transform`.
#[derive(Debug, Serialize)]
pub struct TransformBody {
    pub action: TransformAction,
}

/// Success response of `POST /notes/{id}/transform`.
#[derive(Debug, Deserialize)]
pub struct TransformResponse {
    #[serde(
        rename = "transformedText",
        alias = "transformed",
        alias = "transformed_text"
    )]
    pub transformed_text: String,
}

/// Server timestamps arrive either as RFC 3339 or as naive ISO strings that
/// are UTC by convention.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp `{raw}`")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let trimmed = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    }
}

#[cfg(test)]
mod tests {
    use super::{timestamp, Note, TransformAction, TransformResponse};
    use chrono::{Datelike, Timelike};

    #[test]
    fn note_accepts_naive_and_offset_timestamps() {
        let naive: Note = serde_json::from_str(
            r#"{"id":5,"workspace_id":1,"title":"t","content":"c","updated_at":"2024-03-01T10:20:30.123456"}"#,
        )
        .unwrap();
        assert_eq!(naive.updated_at.day(), 1);
        assert_eq!(naive.updated_at.hour(), 10);

        let offset = timestamp::parse("2024-03-01T12:20:30+02:00").unwrap();
        assert_eq!(offset, naive.updated_at.with_nanosecond(0).unwrap());
    }

    #[test]
    fn note_tolerates_missing_title_and_extra_fields() {
        let note: Note = serde_json::from_str(
            r#"{"id":7,"workspace_id":2,"content":"body","created_at":"2024-01-01T00:00:00","updated_at":"2024-01-02T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(note.title, "");
        assert_eq!(note.content, "body");
    }

    #[test]
    fn transform_response_accepts_field_aliases() {
        for body in [
            r#"{"transformedText":"x"}"#,
            r#"{"transformed":"x"}"#,
            r#"{"transformed_text":"x"}"#,
        ] {
            let parsed: TransformResponse = serde_json::from_str(body).unwrap();
            assert_eq!(parsed.transformed_text, "x");
        }
    }

    #[test]
    fn transform_action_parses_case_insensitively() {
        assert_eq!(
            " Summarize ".parse::<TransformAction>().unwrap(),
            TransformAction::Summarize
        );
        let error = "shorten".parse::<TransformAction>().unwrap_err();
        assert!(error.to_string().contains("shorten"));
    }

    #[test]
    fn transform_action_serializes_as_lowercase_name() {
        let json = serde_json::to_string(&TransformAction::Continue).unwrap();
        assert_eq!(json, "\"continue\"");
    }
}
