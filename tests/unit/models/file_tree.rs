use super::*;

fn names(node: &TreeNode) -> Vec<&str> {
    node.sorted_children()
        .into_iter()
        .map(|c| c.name.as_str())
        .collect()
}

#[test]
fn test_empty_snapshot_yields_empty_root() {
    let root = build_tree(Vec::<&str>::new());
    assert!(root.is_leaf());
    assert!(root.name.is_empty());
}

#[test]
fn test_bare_filename_is_root_leaf() {
    let root = build_tree(["index.html"]);
    let leaf = root.find("index.html").unwrap();
    assert!(leaf.is_leaf());
    assert_eq!(root.children.len(), 1);
}

#[test]
fn test_shared_folders_are_not_duplicated() {
    let root = build_tree(["src/a.js", "src/b.js", "src/lib/c.js", "src/lib/c.js"]);
    let src = root.find("src").unwrap();
    assert_eq!(src.children.len(), 3);
    assert_eq!(src.find("lib").unwrap().children.len(), 1);
}

#[test]
fn test_folders_sort_before_files() {
    let root = build_tree(["b.js", "a.css", "z/x.js", "c/y.js", "index.html"]);
    assert_eq!(names(&root), vec!["c", "z", "a.css", "b.js", "index.html"]);
}

#[test]
fn test_build_is_permutation_invariant() {
    let paths = [
        "index.html",
        "src/main.tsx",
        "src/components/Button.tsx",
        "src/components/Card.tsx",
        "styles/site.css",
        "README.md",
    ];
    let expected = build_tree(paths);

    let mut reversed = paths;
    reversed.reverse();
    assert_eq!(build_tree(reversed), expected);

    let mut rotated = paths;
    rotated.rotate_left(2);
    assert_eq!(build_tree(rotated), expected);

    let shuffled = [paths[3], paths[0], paths[5], paths[1], paths[4], paths[2]];
    assert_eq!(build_tree(shuffled), expected);
}

#[test]
fn test_empty_segments_are_ignored() {
    let root = build_tree(["/src//app.js", "src/app.js/"]);
    assert_eq!(root.children.len(), 1);
    assert!(root.find("src/app.js").unwrap().is_leaf());
}

#[test]
fn test_flatten_for_view() {
    let root = build_tree(["index.html", "src/app.js", "src/ui/button.js"]);
    let mut expanded = FxHashSet::default();

    let rows = root.flatten_for_view(&expanded);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "src");
    assert!(!rows[0].is_leaf);
    assert!(!rows[0].is_expanded);

    expanded.insert("src".to_string());
    let rows = root.flatten_for_view(&expanded);
    let paths: Vec<&str> = rows.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["src", "src/ui", "src/app.js", "index.html"]);
    assert_eq!(rows[1].depth, 1);

    expanded.insert("src/ui".to_string());
    let rows = root.flatten_for_view(&expanded);
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[2].path, "src/ui/button.js");
    assert_eq!(rows[2].depth, 2);
}
