use super::*;
use crate::kernel::preview::{PreviewDocument, DeviceMode};
use crate::kernel::services::ports::PreviewConfig;
use crate::kernel::PreviewState;
use crate::models::ConsoleLevel;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

fn snapshot(files: &[(&str, &str)]) -> Snapshot {
    files
        .iter()
        .map(|(p, c)| (p.to_string(), c.to_string()))
        .collect()
}

fn store_with(files: &[(&str, &str)]) -> Store {
    let mut store = Store::new(PreviewState::new(&PreviewConfig::default()));
    store.dispatch(Action::LoadProject {
        snapshot: snapshot(files),
        external_root: None,
    });
    store
}

fn batch(path: &str, content: &str) -> Action {
    Action::ApplyBatch {
        files: vec![ProjectFile::new(path, content)],
        summary: None,
    }
}

fn content<'a>(store: &'a Store, path: &str) -> &'a str {
    store.state().project.get(path).unwrap()
}

fn stack(store: &Store, path: &str) -> Vec<String> {
    store.state().history.entry(path).unwrap().stack().to_vec()
}

fn document(generation: u64) -> PreviewDocument {
    PreviewDocument {
        generation,
        entry: "index.html".to_string(),
        html: format!("<p>{}</p>", generation),
        bindings: BTreeMap::new(),
    }
}

fn has_rebuild(result: &DispatchResult) -> bool {
    result
        .effects
        .iter()
        .any(|e| matches!(e, Effect::Rebuild { .. }))
}

#[test]
fn test_load_project_builds_tree_and_requests_rebuild() {
    let mut store = Store::new(PreviewState::default());
    let result = store.dispatch(Action::LoadProject {
        snapshot: snapshot(&[("src/app.js", "1"), ("index.html", "<p></p>")]),
        external_root: None,
    });

    assert!(has_rebuild(&result));
    let state = store.state();
    assert_eq!(state.active_file.as_deref(), Some("index.html"));
    let names: Vec<&str> = state.tree.sorted_children().into_iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["src", "index.html"]);
}

#[test]
fn test_five_quick_edits_commit_once() {
    let mut store = store_with(&[("app.js", "")]);
    let start = Instant::now();

    for (i, text) in ["c", "co", "con", "cons", "const"].iter().enumerate() {
        let result = store.dispatch(Action::EditFile {
            path: "app.js".to_string(),
            content: text.to_string(),
            now: start + Duration::from_millis(100 * i as u64),
        });
        assert!(has_rebuild(&result));
    }
    assert_eq!(content(&store, "app.js"), "const");
    assert_eq!(stack(&store, "app.js"), vec![""]);

    store.dispatch(Action::Tick {
        now: start + Duration::from_millis(1000),
    });
    assert_eq!(stack(&store, "app.js"), vec![""]);

    store.dispatch(Action::Tick {
        now: start + Duration::from_millis(1200),
    });
    assert_eq!(stack(&store, "app.js"), vec!["", "const"]);
}

#[test]
fn test_batch_edits_commit_immediately() {
    let mut store = store_with(&[("a.txt", "A")]);

    store.dispatch(batch("a.txt", "B"));
    store.dispatch(batch("a.txt", "C"));

    assert_eq!(stack(&store, "a.txt"), vec!["A", "B", "C"]);
    assert_eq!(store.state().history.entry("a.txt").unwrap().pointer(), 2);
}

#[test]
fn test_commit_after_undo_truncates_redo_branch() {
    let mut store = store_with(&[("a.txt", "A")]);
    store.dispatch(Action::SetActiveFile(Some("a.txt".to_string())));
    store.dispatch(batch("a.txt", "B"));
    store.dispatch(batch("a.txt", "C"));

    let result = store.dispatch(Action::Undo);
    assert!(has_rebuild(&result));
    assert_eq!(content(&store, "a.txt"), "B");
    assert_eq!(store.state().history.entry("a.txt").unwrap().pointer(), 1);

    store.dispatch(batch("a.txt", "D"));
    assert_eq!(stack(&store, "a.txt"), vec!["A", "B", "D"]);

    let result = store.dispatch(Action::Redo);
    assert!(!result.state_changed);
    assert_eq!(content(&store, "a.txt"), "D");
}

#[test]
fn test_undo_then_redo_restores_identical_content() {
    let mut store = store_with(&[("a.txt", "one\n")]);
    store.dispatch(Action::SetActiveFile(Some("a.txt".to_string())));
    store.dispatch(batch("a.txt", "two\n"));
    store.dispatch(batch("a.txt", "three\n"));
    store.dispatch(Action::Undo);
    let before = content(&store, "a.txt").to_string();

    store.dispatch(Action::Undo);
    store.dispatch(Action::Redo);

    assert_eq!(content(&store, "a.txt"), before);
}

#[test]
fn test_undo_flushes_pending_typing() {
    let mut store = store_with(&[("a.txt", "A")]);
    store.dispatch(Action::SetActiveFile(Some("a.txt".to_string())));
    store.dispatch(Action::EditFile {
        path: "a.txt".to_string(),
        content: "AB".to_string(),
        now: Instant::now(),
    });
    assert!(store.state().can_undo());

    store.dispatch(Action::Undo);
    assert_eq!(content(&store, "a.txt"), "A");

    store.dispatch(Action::Redo);
    assert_eq!(content(&store, "a.txt"), "AB");
    assert!(!store.state().debouncer.is_pending("a.txt"));
}

#[test]
fn test_batch_keeps_pending_typing_as_own_step() {
    let mut store = store_with(&[("a.txt", "A")]);
    store.dispatch(Action::SetActiveFile(Some("a.txt".to_string())));
    store.dispatch(Action::EditFile {
        path: "a.txt".to_string(),
        content: "AB".to_string(),
        now: Instant::now(),
    });

    store.dispatch(batch("a.txt", "generated"));
    assert_eq!(stack(&store, "a.txt"), vec!["A", "AB", "generated"]);
    assert!(!store.state().debouncer.is_pending("a.txt"));

    store.dispatch(Action::Undo);
    assert_eq!(content(&store, "a.txt"), "AB");
    store.dispatch(Action::Undo);
    assert_eq!(content(&store, "a.txt"), "A");
}

#[test]
fn test_history_boundaries_are_noops() {
    let mut store = store_with(&[("a.txt", "A")]);
    store.dispatch(Action::SetActiveFile(Some("a.txt".to_string())));

    assert!(!store.dispatch(Action::Undo).state_changed);
    assert!(!store.dispatch(Action::Redo).state_changed);
    assert_eq!(content(&store, "a.txt"), "A");
}

#[test]
fn test_history_follows_active_file_only() {
    let mut store = store_with(&[("a.txt", "A"), ("b.txt", "B")]);
    store.dispatch(batch("a.txt", "A2"));
    store.dispatch(batch("b.txt", "B2"));

    store.dispatch(Action::SetActiveFile(Some("a.txt".to_string())));
    store.dispatch(Action::KeyChord("ctrl+z".to_string()));

    assert_eq!(content(&store, "a.txt"), "A");
    assert_eq!(content(&store, "b.txt"), "B2");

    store.dispatch(Action::SetActiveFile(Some("b.txt".to_string())));
    store.dispatch(Action::KeyChord("cmd+z".to_string()));
    store.dispatch(Action::KeyChord("ctrl+shift+z".to_string()));
    assert_eq!(content(&store, "b.txt"), "B2");
    assert_eq!(content(&store, "a.txt"), "A");
}

#[test]
fn test_batch_summary_is_logged_and_new_files_enter_tree() {
    let mut store = store_with(&[("index.html", "")]);
    store.dispatch(Action::ApplyBatch {
        files: vec![ProjectFile::new("src/new.js", "x")],
        summary: Some("Added a script".to_string()),
    });

    let state = store.state();
    assert!(state.tree.find("src/new.js").is_some());
    let last = state.console.records().last().unwrap();
    assert_eq!(last.level, ConsoleLevel::System);
    assert_eq!(last.display_args(), "Added a script");
}

#[test]
fn test_document_result_renders_and_clears_console() {
    let mut store = store_with(&[("index.html", "")]);
    store.dispatch(Action::Console(ConsoleRecord::system("old")));

    let result = store.dispatch(Action::BuildFinished {
        generation: 1,
        result: Ok(BuildOutput::Document(document(1))),
    });

    assert!(matches!(result.effects.as_slice(), [Effect::Render(doc)] if doc.generation == 1));
    assert!(store.state().console.is_empty());
    assert_eq!(store.state().preview.generation, 1);
}

#[test]
fn test_build_error_keeps_previous_document_as_stale() {
    let mut store = store_with(&[("index.html", "")]);
    store.dispatch(Action::BuildFinished {
        generation: 1,
        result: Ok(BuildOutput::Document(document(1))),
    });

    store.dispatch(Action::BuildFinished {
        generation: 2,
        result: Err(BuildError::Transpile {
            path: "app.ts".to_string(),
            message: "Unexpected token (1:5)".to_string(),
        }),
    });

    let pane = &store.state().preview;
    assert!(pane.stale);
    assert_eq!(pane.document.as_ref().map(|d| d.generation), Some(1));
    assert_eq!(pane.error_message(), Some("Unexpected token (1:5)"));
    assert!(store.state().console.is_empty());

    store.dispatch(Action::BuildFinished {
        generation: 3,
        result: Ok(BuildOutput::Document(document(3))),
    });
    let pane = &store.state().preview;
    assert!(!pane.stale);
    assert!(pane.build_error.is_none());
}

#[test]
fn test_older_build_results_are_ignored() {
    let mut store = store_with(&[("index.html", "")]);
    store.dispatch(Action::BuildFinished {
        generation: 4,
        result: Ok(BuildOutput::Document(document(4))),
    });

    let result = store.dispatch(Action::BuildFinished {
        generation: 3,
        result: Ok(BuildOutput::Empty { generation: 3 }),
    });

    assert!(!result.state_changed);
    assert_eq!(
        store.state().preview.document.as_ref().map(|d| d.generation),
        Some(4)
    );
}

#[test]
fn test_empty_result_is_not_an_error() {
    let mut store = store_with(&[("app.js", "")]);
    store.dispatch(Action::BuildFinished {
        generation: 1,
        result: Ok(BuildOutput::Empty { generation: 1 }),
    });

    let pane = &store.state().preview;
    assert!(pane.empty);
    assert!(pane.build_error.is_none());
    assert!(pane.document.is_none());
}

#[test]
fn test_autosave_persists_only_changed_revisions() {
    let mut store = store_with(&[("a.txt", "A")]);
    let start = Instant::now();
    let interval = PreviewConfig::default().autosave_interval();

    assert!(store.dispatch(Action::Tick { now: start }).effects.is_empty());

    let result = store.dispatch(Action::Tick {
        now: start + interval,
    });
    match result.effects.as_slice() {
        [Effect::Persist { session }] => {
            assert_eq!(session.files.get("a.txt").map(String::as_str), Some("A"));
            assert_eq!(session.active_file.as_deref(), Some("a.txt"));
        }
        other => panic!("unexpected effects: {:?}", other),
    }

    let result = store.dispatch(Action::Tick {
        now: start + interval * 2,
    });
    assert!(result.effects.is_empty());
}

#[test]
fn test_autosave_skipped_with_external_root() {
    let mut store = Store::new(PreviewState::default());
    store.dispatch(Action::LoadProject {
        snapshot: snapshot(&[("a.txt", "A")]),
        external_root: Some(PathBuf::from("/tmp/project")),
    });
    let start = Instant::now();
    store.dispatch(Action::Tick { now: start });

    let result = store.dispatch(Action::Tick {
        now: start + Duration::from_secs(60),
    });

    assert!(result.effects.is_empty());
}

#[test]
fn test_restore_loads_session_without_resaving() {
    let mut store = Store::new(PreviewState::default());
    let session = SavedSession::new(
        snapshot(&[("index.html", "<p></p>"), ("b.js", "")]),
        Some("b.js".to_string()),
    );

    let result = store.dispatch(Action::Restore(session));

    assert!(has_rebuild(&result));
    let state = store.state();
    assert_eq!(state.active_file.as_deref(), Some("b.js"));
    assert_eq!(state.console.records()[0].level, ConsoleLevel::System);
    assert_eq!(state.autosave.saved_revision, Some(state.project.revision()));
}

#[test]
fn test_cancelled_file_error_is_silent() {
    let mut store = store_with(&[]);

    assert!(!store.dispatch(Action::FileOpFailed(FileError::Cancelled)).state_changed);
    assert!(store.state().notice.is_none());

    store.dispatch(Action::FileOpFailed(FileError::PermissionDenied(PathBuf::from(
        "/root/secret",
    ))));
    assert_eq!(
        store.state().notice.as_deref(),
        Some("Permission denied: /root/secret")
    );

    assert!(store.dispatch(Action::DismissNotice).state_changed);
    assert!(store.state().notice.is_none());
}

#[test]
fn test_save_to_directory_requires_external_root() {
    let mut store = store_with(&[("a.txt", "A")]);
    let result = store.dispatch(Action::SaveToDirectory);
    assert!(result.effects.is_empty());
    assert!(store.state().notice.is_some());

    store.dispatch(Action::LoadProject {
        snapshot: snapshot(&[("a.txt", "A")]),
        external_root: Some(PathBuf::from("/work/site")),
    });
    let result = store.dispatch(Action::SaveToDirectory);
    assert!(matches!(
        result.effects.as_slice(),
        [Effect::WriteDirectory { root, .. }] if root == &PathBuf::from("/work/site")
    ));
}

#[test]
fn test_toggle_folder_and_device() {
    let mut store = store_with(&[("src/a.js", ""), ("index.html", "")]);

    assert!(store.dispatch(Action::ToggleFolder("src".to_string())).state_changed);
    let rows = store.state().tree_rows();
    assert_eq!(rows.len(), 3);
    assert!(!store.dispatch(Action::ToggleFolder("index.html".to_string())).state_changed);

    assert!(store.dispatch(Action::SetDevice(DeviceMode::Mobile)).state_changed);
    assert!(!store.dispatch(Action::SetDevice(DeviceMode::Mobile)).state_changed);
}

#[test]
fn test_reset_clears_everything() {
    let mut store = store_with(&[("a.txt", "A")]);
    store.dispatch(batch("a.txt", "B"));

    let result = store.dispatch(Action::ResetProject);

    assert!(has_rebuild(&result));
    let state = store.state();
    assert!(state.project.is_empty());
    assert!(state.history.entry("a.txt").is_none());
    assert!(state.tree.is_leaf());
    assert!(state.active_file.is_none());
}
