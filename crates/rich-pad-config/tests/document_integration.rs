use rich_pad_config::{AppConfig, DocumentStore};

#[test]
fn test_document_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = AppConfig::document_db_path(dir.path());

    let store = DocumentStore::open(&db_path).unwrap();
    store.save("editor-content", "<p>Hello, world!</p>").unwrap();
    drop(store);

    let store2 = DocumentStore::open(&db_path).unwrap();
    assert_eq!(
        store2.load("editor-content").unwrap().unwrap(),
        "<p>Hello, world!</p>"
    );
}

#[test]
fn test_slots_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let store = DocumentStore::open(&AppConfig::document_db_path(dir.path())).unwrap();

    store.save("editor-content", "<p>main</p>").unwrap();
    store.save("scratch", "<p>scratch</p>").unwrap();
    store.delete("scratch").unwrap();

    assert_eq!(
        store.load("editor-content").unwrap().as_deref(),
        Some("<p>main</p>")
    );
    assert!(store.load("scratch").unwrap().is_none());
}

#[test]
fn test_large_document() {
    let dir = tempfile::tempdir().unwrap();
    let store = DocumentStore::open(&AppConfig::document_db_path(dir.path())).unwrap();

    let large = "<p>".to_string() + &"x".repeat(500_000) + "</p>";
    store.save("editor-content", &large).unwrap();
    assert_eq!(store.load("editor-content").unwrap().unwrap().len(), large.len());
}
