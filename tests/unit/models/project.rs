use super::*;

#[test]
fn test_normalize_path() {
    assert_eq!(normalize_path("./src/app.js"), "src/app.js");
    assert_eq!(normalize_path("/index.html"), "index.html");
    assert_eq!(normalize_path("src\\main.tsx"), "src/main.tsx");
    assert_eq!(normalize_path("Src/App.js"), "Src/App.js");
}

#[test]
fn test_extension_of() {
    assert_eq!(extension_of("src/App.TSX").as_deref(), Some("tsx"));
    assert_eq!(extension_of("styles.css").as_deref(), Some("css"));
    assert_eq!(extension_of("Makefile"), None);
    assert_eq!(extension_of(".gitignore"), None);
}

#[test]
fn test_write_bumps_revision_only_on_change() {
    let mut project = VirtualProject::new();
    let start = project.revision();

    assert!(project.write("index.html", "<p>hi</p>"));
    assert_eq!(project.revision(), start + 1);

    assert!(!project.write("index.html", "<p>hi</p>"));
    assert_eq!(project.revision(), start + 1);

    assert!(project.write("./index.html", "<p>bye</p>"));
    assert_eq!(project.get("index.html"), Some("<p>bye</p>"));
    assert_eq!(project.len(), 1);
}

#[test]
fn test_apply_batch_reports_changed_paths() {
    let mut project = VirtualProject::from_snapshot(Snapshot::from([
        ("a.js".to_string(), "1".to_string()),
        ("b.js".to_string(), "2".to_string()),
    ]));

    let changed = project.apply_batch(&[
        ProjectFile::new("a.js", "1"),
        ProjectFile::new("b.js", "3"),
        ProjectFile::new("c/d.css", "body {}"),
    ]);

    assert_eq!(changed, vec!["b.js".to_string(), "c/d.css".to_string()]);
    assert_eq!(project.get("b.js"), Some("3"));
    assert_eq!(project.len(), 3);
}

#[test]
fn test_reset_drops_files_and_binding() {
    let mut project = VirtualProject::new();
    project.write("index.html", "x");
    project.bind_external(Some(PathBuf::from("/tmp/site")));

    project.reset();

    assert!(project.is_empty());
    assert!(project.external_root().is_none());
}
