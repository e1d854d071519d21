//! 宿主页面：把文档嵌入无 `allow-same-origin` 的 sandbox iframe

use super::DeviceMode;
use crate::kernel::preview::pipeline::PreviewDocument;

/// iframe 权限：允许脚本与模块，但与宿主不同源
pub const SANDBOX_PERMISSIONS: &str = "allow-scripts allow-modals allow-forms allow-popups";

const HOST_SCRIPT: &str = r#"(function () {
  var TAG = __TAG__;
  var frame = document.getElementById("zpreview-frame");
  var list = document.getElementById("zpreview-console");
  window.addEventListener("message", function (event) {
    if (event.source !== frame.contentWindow) return;
    var data = event.data;
    if (!data || data.tag !== TAG) return;
    if (data.level === "clear") { list.innerHTML = ""; return; }
    var item = document.createElement("li");
    item.className = "level-" + data.level;
    item.textContent = (data.args || []).map(function (arg) {
      return typeof arg === "string" ? arg : JSON.stringify(arg);
    }).join(" ");
    list.appendChild(item);
  });
})();"#;

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + value.len() / 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn device_style(device: DeviceMode) -> String {
    match device.viewport() {
        Some((width, height)) => format!(
            "width:{width}px;height:{height}px;margin:16px auto;border:12px solid #222;border-radius:24px;"
        ),
        None => "width:100%;height:70vh;".to_string(),
    }
}

pub fn host_page(document: &PreviewDocument, device: DeviceMode, tag: &str) -> String {
    let tag_literal = serde_json::to_string(tag).unwrap_or_else(|_| "\"\"".to_string());
    let script = HOST_SCRIPT.replace("__TAG__", &tag_literal);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>zpreview: {title}</title>
<style>
body {{ margin: 0; font-family: sans-serif; background: #f3f3f3; }}
.device {{ overflow: hidden; background: #fff; }}
.device iframe {{ border: 0; width: 100%; height: 100%; }}
#zpreview-console {{ font-family: monospace; margin: 0; padding: 8px 24px; }}
#zpreview-console .level-warn {{ color: #a60; }}
#zpreview-console .level-error {{ color: #c00; }}
</style>
</head>
<body>
<div class="device device-{device}" style="{style}">
<iframe id="zpreview-frame" sandbox="{permissions}" srcdoc="{srcdoc}"></iframe>
</div>
<ol id="zpreview-console"></ol>
<script>{script}</script>
</body>
</html>
"#,
        title = escape_attr(&document.entry),
        device = device.as_str(),
        style = device_style(device),
        permissions = SANDBOX_PERMISSIONS,
        srcdoc = escape_attr(&document.html),
        script = script,
    )
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/preview/sandbox/host.rs"]
mod tests;
