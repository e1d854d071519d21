use super::*;
use crate::kernel::preview::bridge::console_channel;
use crate::kernel::services::adapters::MemoryBlobStore;
use crate::models::ConsoleLevel;
use serde_json::json;
use std::collections::BTreeMap;

fn sandbox() -> (HeadlessSandbox, Arc<MemoryBlobStore>) {
    let blobs = Arc::new(MemoryBlobStore::new());
    let sandbox = HeadlessSandbox::new(blobs.clone()).unwrap();
    (sandbox, blobs)
}

fn document(html: &str, bindings: BTreeMap<String, String>) -> PreviewDocument {
    PreviewDocument {
        generation: 1,
        entry: "index.html".to_string(),
        html: html.to_string(),
        bindings,
    }
}

#[test]
fn test_runs_inline_and_bound_scripts_in_order() {
    let (sandbox, blobs) = sandbox();
    let uri = blobs.create("application/javascript", "console.log('from file');");
    let html = format!(
        "<script>console.log('inline');</script><script src=\"{}\"></script>",
        uri
    );
    let doc = document(&html, BTreeMap::from([("app.js".to_string(), uri)]));
    let (tx, mut rx) = console_channel("t");

    let report = sandbox.render(&doc, &tx).unwrap();
    let args: Vec<_> = rx.drain().into_iter().map(|r| r.args).collect();

    assert_eq!(report.scripts_run, 2);
    assert_eq!(args, vec![vec![json!("inline")], vec![json!("from file")]]);
}

#[test]
fn test_skips_bridge_importmap_and_external_scripts() {
    let (sandbox, _) = sandbox();
    let html = concat!(
        "<script data-zpreview-bridge>console.log('bridge');</script>",
        "<script type=\"importmap\">{\"imports\":{}}</script>",
        "<script type=\"text/template\">console.log('tpl');</script>",
        "<script src=\"https://cdn.example.com/lib.js\"></script>",
        "<script type=\"module\">console.log('module');</script>",
    );
    let (tx, mut rx) = console_channel("t");

    let report = sandbox.render(&document(html, BTreeMap::new()), &tx).unwrap();
    let records = rx.drain();

    assert_eq!(report.scripts_run, 1);
    assert_eq!(report.scripts_skipped, 1);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].args, vec![json!("module")]);
}

#[test]
fn test_uncaught_error_is_labelled_with_file() {
    let (sandbox, blobs) = sandbox();
    let uri = blobs.create("application/javascript", "\nthrow new TypeError('nope');");
    let html = format!("<script src=\"{}\"></script>", uri);
    let doc = document(&html, BTreeMap::from([("src/main.js".to_string(), uri)]));
    let (tx, mut rx) = console_channel("t");

    let report = sandbox.render(&doc, &tx).unwrap();
    let records = rx.drain();

    assert_eq!(report.uncaught, 1);
    assert_eq!(records[0].level, ConsoleLevel::Error);
    assert_eq!(
        records[0].args,
        vec![json!("Uncaught TypeError: nope (src/main.js:2)")]
    );
}

#[test]
fn test_revoked_binding_is_skipped() {
    let (sandbox, blobs) = sandbox();
    let uri = blobs.create("application/javascript", "console.log('x');");
    blobs.revoke(&uri);
    let html = format!("<script src=\"{}\"></script>", uri);
    let doc = document(&html, BTreeMap::from([("app.js".to_string(), uri)]));
    let (tx, mut rx) = console_channel("t");

    let report = sandbox.render(&doc, &tx).unwrap();

    assert_eq!(report.scripts_skipped, 1);
    assert!(rx.drain().is_empty());
}
