//! Static HTML report artifact (spec.md §6: "self-contained; includes
//! assessment result, gap analysis, rollback actions, and a timeline.
//! No external resources fetched at render time."). Renders by hand
//! rather than pulling in a templating crate — the document is simple
//! enough, and it keeps the "no external resources" guarantee trivially
//! true (no CDN-hosted CSS/JS to forget).

use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};

const STYLE: &str = r#"
body { font-family: -apple-system, Segoe UI, Helvetica, Arial, sans-serif; margin: 2rem; color: #1a1a1a; }
h1, h2 { border-bottom: 1px solid #ddd; padding-bottom: 0.3rem; }
table { border-collapse: collapse; width: 100%; margin-bottom: 1.5rem; }
th, td { text-align: left; padding: 0.4rem 0.6rem; border-bottom: 1px solid #eee; }
.blocked { color: #b00020; font-weight: 600; }
.warning { color: #a36a00; }
.ok { color: #1a7f37; }
.timeline li { margin-bottom: 0.4rem; }
"#;

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn priority_class(priority: &str) -> &'static str {
    match priority {
        "Blocked" => "blocked",
        "Warning" => "warning",
        _ => "",
    }
}

/// Renders the report for one capability assessment plus whatever
/// deployment/rollback/timeline context the caller has at hand. `extra`
/// is a free-form JSON object (deployment id, rollback report, event
/// history) rendered as a flat key/value table beneath the gap
/// analysis — callers decide what's relevant to include per command.
pub fn render(domain: &str, assessment: &Value, extra: &Value) -> String {
    let gaps = assessment
        .get("gap_analysis")
        .and_then(|g| g.get("gaps"))
        .and_then(|g| g.as_array())
        .cloned()
        .unwrap_or_default();

    let mut gap_rows = String::new();
    for gap in &gaps {
        let capability = gap.get("capability").and_then(|v| v.as_str()).unwrap_or("-");
        let status = gap.get("status").and_then(|v| v.as_str()).unwrap_or("-");
        let priority = gap.get("priority").and_then(|v| v.as_str()).unwrap_or("-");
        let reason = gap.get("reason").and_then(|v| v.as_str()).unwrap_or("");
        gap_rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td class=\"{}\">{}</td><td>{}</td></tr>\n",
            escape(capability),
            escape(status),
            priority_class(priority),
            escape(priority),
            escape(reason)
        ));
    }

    let confidence = assessment.get("confidence").and_then(|v| v.as_u64()).unwrap_or(0);

    let mut extra_rows = String::new();
    if let Value::Object(map) = extra {
        for (key, value) in map {
            extra_rows.push_str(&format!("<tr><td>{}</td><td>{}</td></tr>\n", escape(key), escape(&value.to_string())));
        }
    }

    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>Deployment report: {domain}</title>\n\
         <style>{STYLE}</style></head><body>\n\
         <h1>Deployment report: {domain}</h1>\n\
         <p>Confidence: <strong>{confidence}</strong>/100</p>\n\
         <h2>Capability gaps</h2>\n\
         <table><thead><tr><th>Capability</th><th>Status</th><th>Priority</th><th>Reason</th></tr></thead>\n\
         <tbody>{gap_rows}</tbody></table>\n\
         <h2>Run detail</h2>\n\
         <table><tbody>{extra_rows}</tbody></table>\n\
         </body></html>\n",
        domain = escape(domain),
    )
}

pub fn write(reports_root: &Path, domain: &str, html: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(reports_root)?;
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();
    let path = reports_root.join(format!("{}-{stamp}.html", sanitize_filename(domain)));
    std::fs::write(&path, html)?;
    Ok(path)
}

fn sanitize_filename(domain: &str) -> String {
    domain.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '-' }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_includes_domain_and_confidence() {
        let assessment = json!({ "confidence": 72, "gap_analysis": { "gaps": [] } });
        let html = render("api.example.com", &assessment, &json!({}));
        assert!(html.contains("api.example.com"));
        assert!(html.contains("72"));
        assert!(!html.contains("http://") && !html.contains("https://"));
    }

    #[test]
    fn render_marks_blocked_gaps() {
        let assessment = json!({
            "confidence": 40,
            "gap_analysis": { "gaps": [
                { "capability": "database", "status": "Missing", "priority": "Blocked", "reason": "missing D1:Edit" }
            ] }
        });
        let html = render("api.example.com", &assessment, &json!({}));
        assert!(html.contains("class=\"blocked\""));
    }

    #[test]
    fn write_creates_file_under_reports_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "api.example.com", "<html></html>").unwrap();
        assert!(path.exists());
    }
}
