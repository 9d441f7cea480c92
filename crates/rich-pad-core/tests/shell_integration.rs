// Integration tests for the editor shell.
//
// These run the shell against on-disk stores, closing and reopening them
// between steps the way separate editor sessions would.

use std::path::Path;
use std::sync::Arc;

use rich_pad_config::{AppConfig, DocumentStore, DEFAULT_CONTENT};
use rich_pad_core::{
    ContentSurface, EditorShell, HistoryConfig, HistoryError, MemorySurface, ToolbarAction,
    VersionHistory, VersionStore,
};
use tempfile::TempDir;

const DOC_KEY: &str = "editor-content";

struct Session {
    shell: EditorShell<MemorySurface>,
    documents: Arc<DocumentStore>,
}

fn open_session(dir: &Path) -> Session {
    let documents =
        Arc::new(DocumentStore::open(&AppConfig::document_db_path(dir)).expect("open documents"));
    let versions = VersionStore::open(dir).expect("open versions");
    let config = HistoryConfig::default();

    let initial = EditorShell::<MemorySurface>::initial_content(
        Some(&documents),
        DOC_KEY,
        DEFAULT_CONTENT,
    );
    let history = VersionHistory::load_or_seed(&initial, config, Some(versions));
    let mut shell = EditorShell::new(MemorySurface::default(), history);
    shell.attach_document(Arc::clone(&documents), DOC_KEY);
    Session { shell, documents }
}

fn edit(shell: &mut EditorShell<MemorySurface>, markup: &str) {
    shell.start_edit().expect("start edit");
    shell.surface_mut().replace_all(markup);
    shell.save().expect("save");
}

#[test]
fn test_first_run_shows_sample_content() {
    let dir = TempDir::new().unwrap();
    let session = open_session(dir.path());

    assert_eq!(
        session.shell.surface().content().as_deref(),
        Some(DEFAULT_CONTENT)
    );
    assert_eq!(session.shell.history().versions().len(), 1);
    assert_eq!(session.shell.history().current_id(), "initial");
    // Nothing has been saved yet, so the document slot is still empty.
    assert!(session.documents.load(DOC_KEY).unwrap().is_none());
}

#[test]
fn test_saves_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let mut session = open_session(dir.path());
        edit(&mut session.shell, "<p>draft one</p>");
        edit(&mut session.shell, "<p>draft two</p>");
    }

    let session = open_session(dir.path());
    let history = session.shell.history();
    assert_eq!(history.versions().len(), 3);
    assert_eq!(history.latest().content, "<p>draft two</p>");
    assert_eq!(
        session.shell.surface().content().as_deref(),
        Some("<p>draft two</p>")
    );
    assert_eq!(
        session.documents.load(DOC_KEY).unwrap().as_deref(),
        Some("<p>draft two</p>")
    );
}

#[test]
fn test_lost_history_reseeds_from_saved_document() {
    let dir = TempDir::new().unwrap();
    {
        let mut session = open_session(dir.path());
        edit(&mut session.shell, "<p>kept in slot</p>");
    }
    {
        let versions = VersionStore::open(dir.path()).unwrap();
        versions.delete("editor-versions").unwrap();
    }

    let session = open_session(dir.path());
    let history = session.shell.history();
    assert_eq!(history.versions().len(), 1);
    assert_eq!(history.latest().id, "initial");
    assert_eq!(history.latest().content, "<p>kept in slot</p>");
}

#[test]
fn test_restore_is_persisted_with_provenance() {
    let dir = TempDir::new().unwrap();
    let first_id;
    {
        let mut session = open_session(dir.path());
        first_id = session.shell.history().current_id().to_string();
        edit(&mut session.shell, "<p>rewrite</p>");

        session.shell.request_restore(&first_id).unwrap();
        let restored = session.shell.confirm_restore().unwrap().unwrap();
        assert_eq!(restored.content, DEFAULT_CONTENT);
    }

    let session = open_session(dir.path());
    let latest = session.shell.history().latest();
    assert!(latest.is_restore());
    assert_eq!(latest.restored_from.as_ref().unwrap().id, first_id);
    assert_eq!(latest.content, DEFAULT_CONTENT);
    assert_eq!(session.shell.history().versions().len(), 3);
    // The slot keeps the last explicit save.
    assert_eq!(
        session.documents.load(DOC_KEY).unwrap().as_deref(),
        Some("<p>rewrite</p>")
    );
}

#[test]
fn test_toolbar_session_end_to_end() {
    let dir = TempDir::new().unwrap();
    let mut session = open_session(dir.path());
    let shell = &mut session.shell;

    shell.start_edit().unwrap();
    shell.surface_mut().replace_all("<p>Revenue</p>");
    for token in ["h2", "align:center", "table:2x2", "add-row-after"] {
        let action: ToolbarAction = token.parse().unwrap();
        shell.dispatch(action).unwrap();
    }
    let saved = shell.save().unwrap();

    assert!(saved
        .content
        .starts_with("<h2 style=\"text-align: center\">Revenue</h2><table class=\"financial-table\">"));
    assert_eq!(saved.content.matches("<tr>").count(), 3);
    assert!(shell.toolbar().is_none());
}

#[test]
fn test_view_is_blocked_while_editing() {
    let dir = TempDir::new().unwrap();
    let mut session = open_session(dir.path());
    edit(&mut session.shell, "<p>second</p>");
    let first = session.shell.history().versions().as_slice()[0].id.clone();

    session.shell.start_edit().unwrap();
    assert!(matches!(
        session.shell.load_version(&first),
        Err(HistoryError::EditInProgress)
    ));
    assert!(matches!(
        session.shell.request_restore(&first),
        Err(HistoryError::EditInProgress)
    ));
    session.shell.cancel().unwrap();
    session.shell.load_version(&first).unwrap();
    assert_eq!(
        session.shell.surface().content().as_deref(),
        Some(DEFAULT_CONTENT)
    );
}
