//! Inline sanitizer for paragraph and list-item markup.
//!
//! Reduces rich markup to `strong`, `em`, `a` and `br`, restyles every
//! hyperlink with the brand's link style and normalizes text. Running it on
//! its own output is a no-op.

use scraper::node::Node;
use scraper::{ElementRef, Html};

use crate::text::{collapse_ascii_whitespace, escape_html, escape_text, is_blank, normalize_dashes};

/// Presentational style forced onto every hyperlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStyle {
    pub color: &'static str,
    pub underline: bool,
}

impl LinkStyle {
    pub fn css(&self) -> String {
        let decoration = if self.underline { "underline" } else { "none" };
        format!("color:{};text-decoration:{};", self.color, decoration)
    }
}

fn is_allowed_tag(tag: &str) -> bool {
    matches!(tag, "strong" | "b" | "em" | "i" | "a" | "br")
}

fn is_drop_content_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "noscript" | "template")
}

/// Clean the inner markup of one paragraph or list item.
pub fn sanitize_inline(fragment: &str, link: &LinkStyle) -> String {
    let doc = Html::parse_fragment(fragment);
    let style = escape_html(&link.css());
    let mut out = String::with_capacity(fragment.len());
    write_children(doc.root_element(), &style, &mut out);
    out.trim().to_string()
}

/// A fragment is empty when its visible text is nothing but whitespace and
/// nbsp.
pub fn is_empty_fragment(fragment: &str) -> bool {
    let doc = Html::parse_fragment(fragment);
    is_blank(&visible_text(doc.root_element()))
}

/// Text of `el` the way the sanitizer would keep it: script-like elements
/// contribute nothing.
pub fn visible_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    if is_drop_content_tag(&el.value().name().to_ascii_lowercase()) {
        return out;
    }
    collect_visible(el, &mut out);
    out
}

fn collect_visible(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) if is_drop_content_tag(&e.name().to_ascii_lowercase()) => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_visible(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn write_children(el: ElementRef<'_>, style: &str, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => push_text(text, out),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    write_element(child_el, style, out);
                }
            }
            _ => {}
        }
    }
}

fn write_element(el: ElementRef<'_>, style: &str, out: &mut String) {
    let tag = el.value().name().to_ascii_lowercase();
    if is_drop_content_tag(&tag) {
        return;
    }
    if !is_allowed_tag(&tag) {
        push_text(&visible_text(el), out);
        return;
    }

    match tag.as_str() {
        "br" => out.push_str("<br />"),
        "a" => {
            out.push_str("<a");
            if let Some(href) = el.value().attr("href") {
                out.push_str(" href=\"");
                out.push_str(&escape_html(href.trim()));
                out.push('"');
            }
            out.push_str(" target=\"_blank\" style=\"");
            out.push_str(style);
            out.push_str("\">");
            write_children(el, style, out);
            out.push_str("</a>");
        }
        _ => {
            let canonical = match tag.as_str() {
                "b" | "strong" => "strong",
                _ => "em",
            };
            out.push('<');
            out.push_str(canonical);
            out.push('>');
            write_children(el, style, out);
            out.push_str("</");
            out.push_str(canonical);
            out.push('>');
        }
    }
}

fn push_text(text: &str, out: &mut String) {
    let cleaned = normalize_dashes(&collapse_ascii_whitespace(text));
    if cleaned.starts_with(' ') && (out.is_empty() || out.ends_with(' ')) {
        out.push_str(&escape_text(&cleaned[1..]));
    } else {
        out.push_str(&escape_text(&cleaned));
    }
}
