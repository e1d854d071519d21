use super::*;
use std::collections::BTreeMap;

fn document(html: &str) -> PreviewDocument {
    PreviewDocument {
        generation: 1,
        entry: "index.html".to_string(),
        html: html.to_string(),
        bindings: BTreeMap::new(),
    }
}

#[test]
fn test_host_page_sandboxes_without_same_origin() {
    let page = host_page(&document("<p>hi</p>"), DeviceMode::Desktop, "t");
    assert!(page.contains("sandbox=\"allow-scripts allow-modals allow-forms allow-popups\""));
    assert!(!page.contains("allow-same-origin"));
}

#[test]
fn test_host_page_escapes_srcdoc() {
    let page = host_page(
        &document("<script>console.log(\"a & b\")</script>"),
        DeviceMode::Desktop,
        "t",
    );
    assert!(page.contains(
        "srcdoc=\"&lt;script&gt;console.log(&quot;a &amp; b&quot;)&lt;/script&gt;\""
    ));
}

#[test]
fn test_device_mode_only_changes_wrapper() {
    let doc = document("<p>hi</p>");
    let desktop = host_page(&doc, DeviceMode::Desktop, "t");
    let mobile = host_page(&doc, DeviceMode::Mobile, "t");

    assert!(mobile.contains("width:375px;height:667px;"));
    assert!(mobile.contains("device-mobile"));
    assert!(desktop.contains("width:100%"));

    let srcdoc = |page: &str| {
        let start = page.find("srcdoc=\"").unwrap();
        page[start..].split('>').next().unwrap().to_string()
    };
    assert_eq!(srcdoc(&desktop), srcdoc(&mobile));
}

#[test]
fn test_host_script_filters_by_tag() {
    let page = host_page(&document(""), DeviceMode::Tablet, "custom-tag");
    assert!(page.contains("var TAG = \"custom-tag\";"));
}

#[test]
fn test_device_mode_names() {
    assert_eq!(DeviceMode::from_name("Tablet"), Some(DeviceMode::Tablet));
    assert_eq!(DeviceMode::from_name("phone"), Some(DeviceMode::Mobile));
    assert_eq!(DeviceMode::from_name("watch"), None);
    assert_eq!(DeviceMode::default(), DeviceMode::Desktop);
    assert_eq!(DeviceMode::Tablet.viewport(), Some((768, 1024)));
}
