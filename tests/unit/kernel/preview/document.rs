use super::*;

fn bindings(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_is_external() {
    assert!(is_external("https://cdn.example.com/x.js"));
    assert!(is_external("//cdn.example.com/x.js"));
    assert!(is_external("data:text/css,body{}"));
    assert!(is_external("#top"));
    assert!(is_external(""));
    assert!(!is_external("./app.js"));
    assert!(!is_external("/styles/site.css"));
}

#[test]
fn test_join_relative() {
    assert_eq!(join_relative("site", "app.js").as_deref(), Some("site/app.js"));
    assert_eq!(
        join_relative("site/pages", "../app.js").as_deref(),
        Some("site/app.js")
    );
    assert_eq!(join_relative("", "./a/./b.js").as_deref(), Some("a/b.js"));
    assert_eq!(join_relative("", "../x.js"), None);
}

#[test]
fn test_resolve_reference_strips_prefix_and_query() {
    let map = bindings(&[("app.js", "blob:1"), ("site/app.js", "blob:2")]);

    assert_eq!(resolve_reference("./app.js", "", &map), Some("blob:1"));
    assert_eq!(resolve_reference("/app.js?v=3", "", &map), Some("blob:1"));
    assert_eq!(resolve_reference("app.js", "site", &map), Some("blob:2"));
    assert_eq!(resolve_reference("/app.js", "site", &map), Some("blob:1"));
    assert_eq!(resolve_reference("missing.js", "", &map), None);
}

#[test]
fn test_rewrite_only_bound_references() {
    let map = bindings(&[("app.js", "blob:app"), ("style.css", "blob:css")]);
    let html = concat!(
        "<link rel=\"stylesheet\" href=\"style.css\">",
        "<script src='./app.js'></script>",
        "<script src=\"https://unpkg.com/x.js\"></script>",
        "<img src=logo.png>",
    );

    let (out, count) = rewrite_references(html, "", &map);

    assert_eq!(count, 2);
    assert!(out.contains("href=\"blob:css\""));
    assert!(out.contains("src='blob:app'"));
    assert!(out.contains("src=\"https://unpkg.com/x.js\""));
    assert!(out.contains("src=logo.png"));
    assert!(!out.contains("./app.js"));
}

#[test]
fn test_script_and_style_bodies_are_not_rewritten() {
    let map = bindings(&[("app.js", "blob:zpreview/1"), ("bg.png", "blob:zpreview/2")]);
    let html = concat!(
        "<script>var src = \"app.js\"; console.log(src);</script>",
        "<style>.a { background: url(bg.png); } .b[href=\"app.js\"] {}</style>",
        "<!-- <script src=\"app.js\"></script> -->",
        "<script src=\"app.js\">const href = 'app.js';</script>",
    );

    let (out, count) = rewrite_references(html, "", &map);

    assert_eq!(count, 1);
    assert!(out.starts_with("<script>var src = \"app.js\"; console.log(src);</script>"));
    assert!(out.contains(".b[href=\"app.js\"]"));
    assert!(out.contains("<!-- <script src=\"app.js\"></script> -->"));
    assert!(out.ends_with("<script src=\"blob:zpreview/1\">const href = 'app.js';</script>"));
}

#[test]
fn test_inject_head_before_close_tag() {
    let out = inject_head("<html><head><title>t</title></HEAD><body></body></html>", "<x>");
    assert_eq!(out, "<html><head><title>t</title><x></HEAD><body></body></html>");
}

#[test]
fn test_inject_head_prepends_without_head() {
    assert_eq!(inject_head("<p>hi</p>", "<x>"), "<x><p>hi</p>");
}

#[test]
fn test_import_map_tag_is_sorted_json() {
    let map = bindings(&[("react-dom", "https://b"), ("react", "https://a")]);
    assert_eq!(
        import_map_tag(&map),
        r#"<script type="importmap">{"imports":{"react":"https://a","react-dom":"https://b"}}</script>"#
    );
}
