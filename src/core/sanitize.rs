//! Markdown-safe rendering of provider output

use regex::Regex;
use std::sync::OnceLock;

fn markdown_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\\`*_~]").expect("static regex"))
}

/// Escape characters that chat clients render as markdown
pub fn sanitize(value: &str) -> String {
    markdown_chars().replace_all(value, r"\$0").into_owned()
}

/// Keep the first `n` characters, appending an ellipsis when cut
pub fn truncate(value: &str, n: usize) -> String {
    if value.chars().count() > n {
        let kept: String = value.chars().take(n).collect();
        format!("{}…", kept)
    } else {
        value.to_string()
    }
}
