//! CLI smoke driver for the notes panel core.
//!
//! # Responsibility
//! - Drive a `PanelController` against a running note service from the
//!   shell, one panel action per invocation.
//! - Keep output line-oriented for quick manual checks.

use notepanel_core::{
    init_logging, ClientConfig, HttpNoteService, LoadOutcome, Note, NoteId, PanelController,
    TransformAction, WorkspaceId,
};
use std::process::ExitCode;

const COMMANDS: [&str; 5] = ["list", "create", "save", "delete", "transform"];

const USAGE: &str = "usage: notepanel_cli <command>
  version
  list <workspace_id>
  create <workspace_id> <title> [content]
  save <workspace_id> <note_id> <title> <content>
  delete <workspace_id> <note_id>
  transform <workspace_id> <note_id> <expand|improve|summarize|continue|translate>

environment: NOTEPANEL_API_BASE_URL (required), NOTEPANEL_API_TOKEN,
  NOTEPANEL_REQUEST_TIMEOUT_SECS, NOTEPANEL_LOG_LEVEL, NOTEPANEL_LOG_DIR";

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String]) -> Result<(), String> {
    let command = args.first().map(String::as_str).ok_or(USAGE)?;
    if command == "version" {
        println!("notepanel_core version={}", notepanel_core::core_version());
        return Ok(());
    }
    if !COMMANDS.contains(&command) {
        return Err(format!("unknown command `{command}`\n{USAGE}"));
    }
    let workspace_id: WorkspaceId = parse_arg(args, 1, "workspace_id")?;

    let config = ClientConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(&config.log_level, log_dir).map_err(|err| err.to_string())?;
    }
    let service = HttpNoteService::new(&config).map_err(|err| err.to_string())?;
    let panel = PanelController::new(service, workspace_id);

    if let LoadOutcome::Failed = panel.open().await {
        return Err(format!("could not load notes of workspace {workspace_id}"));
    }

    match command {
        "list" => {
            for note in panel.notes() {
                print_note(&note);
            }
        }
        "create" => {
            let title = args.get(2).ok_or(USAGE)?;
            panel.create_note().await.map_err(|err| err.to_string())?;
            panel.set_draft_title(title.as_str()).map_err(|err| err.to_string())?;
            if let Some(content) = args.get(3) {
                panel
                    .set_draft_content(content.as_str())
                    .map_err(|err| err.to_string())?;
            }
            let saved = panel.save().await.map_err(|err| err.to_string())?;
            print_note(&saved);
        }
        "save" => {
            let note_id: NoteId = parse_arg(args, 2, "note_id")?;
            let title = args.get(3).ok_or(USAGE)?;
            let content = args.get(4).ok_or(USAGE)?;
            panel.start_edit(note_id).map_err(|err| err.to_string())?;
            panel.set_draft_title(title.as_str()).map_err(|err| err.to_string())?;
            panel
                .set_draft_content(content.as_str())
                .map_err(|err| err.to_string())?;
            let saved = panel.save().await.map_err(|err| err.to_string())?;
            print_note(&saved);
        }
        "delete" => {
            let note_id: NoteId = parse_arg(args, 2, "note_id")?;
            let removed = panel.delete_note(note_id).await.map_err(|err| err.to_string())?;
            println!("note_id={note_id} removed={removed}");
        }
        "transform" => {
            let note_id: NoteId = parse_arg(args, 2, "note_id")?;
            let action: TransformAction = args
                .get(3)
                .ok_or(USAGE)?
                .parse()
                .map_err(|err: notepanel_core::UnknownTransformAction| err.to_string())?;
            let draft = panel
                .transform(note_id, action)
                .await
                .map_err(|err| err.to_string())?;
            println!("{}", draft.content());
        }
        _ => return Err(USAGE.to_string()),
    }

    Ok(())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], index: usize, name: &str) -> Result<T, String> {
    let raw = args.get(index).ok_or(USAGE)?;
    raw.parse()
        .map_err(|_| format!("invalid {name} `{raw}`\n{USAGE}"))
}

fn print_note(note: &Note) {
    println!(
        "{}\t{}\t{}",
        note.id,
        note.updated_at.format("%Y-%m-%d %H:%M"),
        note.title
    );
}
