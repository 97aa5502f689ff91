use std::sync::LazyLock;

use regex::Regex;

static DASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{2010}-\x{2015}\x{2212}]").unwrap());
static ASCII_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\r\n\x0C]+").unwrap());

/// Collapse every whitespace run (nbsp included) to one space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse ASCII whitespace runs only. Non-breaking spaces survive,
/// leading and trailing spaces are kept.
pub fn collapse_ascii_whitespace(s: &str) -> String {
    ASCII_WS_RE.replace_all(s, " ").into_owned()
}

pub fn normalize_dashes(s: &str) -> String {
    DASH_RE.replace_all(s, "-").into_owned()
}

/// Key used for marker comparison: whitespace-collapsed, lowercase.
pub fn marker_key(s: &str) -> String {
    collapse_whitespace(s).to_lowercase()
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Text-node escaping: quotes stay literal.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// True when nothing but whitespace and non-breaking spaces remain.
pub fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || c == '\u{a0}')
}
