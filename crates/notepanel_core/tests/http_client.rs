use notepanel_core::{
    ClientConfig, CredentialProvider, HttpNoteService, NoteService, RemoteError, TransformAction,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn note_json(id: i64, title: &str, content: &str) -> serde_json::Value {
    json!({
        "id": id,
        "workspace_id": 4,
        "title": title,
        "content": content,
        "created_at": "2024-05-01T09:00:00",
        "updated_at": "2024-05-02T10:30:00.250000"
    })
}

fn client(server: &MockServer) -> HttpNoteService {
    let config = ClientConfig::new(&format!("{}/api/", server.uri()))
        .unwrap()
        .with_api_token("token-123");
    HttpNoteService::new(&config).unwrap()
}

#[tokio::test]
async fn list_sends_workspace_and_bearer_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notes"))
        .and(query_param("workspace_id", "4"))
        .and(header("authorization", "Bearer token-123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([note_json(2, "b", ""), note_json(1, "a", "x")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let notes = client(&server).list_notes(4).await.unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].id, 2);
    assert_eq!(notes[1].content, "x");
}

#[tokio::test]
async fn create_posts_workspace_title_and_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/notes"))
        .and(body_json(json!({"workspace_id": 4, "title": "New Note", "content": ""})))
        .respond_with(ResponseTemplate::new(200).set_body_json(note_json(5, "New Note", "")))
        .expect(1)
        .mount(&server)
        .await;

    let created = client(&server).create_note(4, "New Note", "").await.unwrap();
    assert_eq!(created.id, 5);
    assert_eq!(created.workspace_id, 4);
}

#[tokio::test]
async fn update_patches_note_path() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/notes/5"))
        .and(body_json(json!({"title": "Meeting Notes", "content": "Discuss roadmap"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(note_json(5, "Meeting Notes", "Discuss roadmap")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let updated = client(&server)
        .update_note(5, "Meeting Notes", "Discuss roadmap")
        .await
        .unwrap();
    assert_eq!(updated.title, "Meeting Notes");
}

#[tokio::test]
async fn delete_accepts_empty_acknowledgement() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/notes/5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).delete_note(5).await.unwrap();
}

#[tokio::test]
async fn transform_posts_action_and_reads_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/notes/5/transform"))
        .and(body_json(json!({"action": "summarize"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"transformedText": "short"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server)
        .transform_note(5, TransformAction::Summarize)
        .await
        .unwrap();
    assert_eq!(text, "short");
}

#[tokio::test]
async fn error_status_carries_detail_message() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/notes/9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Note not found"})))
        .mount(&server)
        .await;

    let error = client(&server).update_note(9, "t", "c").await.unwrap_err();
    assert_eq!(
        error,
        RemoteError::Status {
            status: 404,
            message: "Note not found".to_string(),
        }
    );
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"not\":\"a list\"}"))
        .mount(&server)
        .await;

    let error = client(&server).list_notes(4).await.unwrap_err();
    assert!(matches!(error, RemoteError::Decode(_)));
}

struct SessionToken;

impl CredentialProvider for SessionToken {
    fn bearer_token(&self) -> Option<String> {
        Some("from-session".to_string())
    }
}

#[tokio::test]
async fn custom_credential_provider_is_used_per_request() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/notes/1"))
        .and(header("authorization", "Bearer from-session"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let service = client(&server).with_credentials(Arc::new(SessionToken));
    service.delete_note(1).await.unwrap();
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
    let error = HttpNoteService::new(&config)
        .unwrap()
        .list_notes(1)
        .await
        .unwrap_err();
    assert!(matches!(error, RemoteError::Transport(_)));
}
