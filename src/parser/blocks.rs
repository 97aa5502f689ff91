use scraper::node::Node;
use scraper::{ElementRef, Html};

use crate::sanitize::visible_text;
use crate::text::{collapse_whitespace, escape_text, normalize_dashes};

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { html: String, text: String },
    List { ordered: bool, items: Vec<ListItem> },
    Image { src: String, alt: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub html: String,
    pub text: String,
}

impl Block {
    /// Visible text of blocks that can act as a marker.
    pub fn marker_text(&self) -> Option<&str> {
        match self {
            Block::Heading { text, .. } | Block::Paragraph { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Flatten a rendered document into content blocks in document order.
///
/// Wrapping containers are descended into, so a heading inside a `<div>`
/// and the paragraphs after that `<div>` still come out as siblings.
pub fn classify_document(html: &str) -> Vec<Block> {
    let doc = Html::parse_document(html);
    let mut blocks = Vec::new();
    walk(doc.root_element(), &mut blocks);
    blocks
}

fn walk(el: ElementRef<'_>, blocks: &mut Vec<Block>) {
    for child in el.children() {
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let tag = child.value().name().to_ascii_lowercase();
        match tag.as_str() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag.as_bytes()[1] - b'0';
                blocks.push(Block::Heading {
                    level,
                    text: plain_text(child),
                });
            }
            "p" => classify_paragraph(child, blocks),
            "ul" | "ol" => {
                let mut items = Vec::new();
                collect_items(child, &mut items);
                blocks.push(Block::List {
                    ordered: tag == "ol",
                    items,
                });
            }
            "img" => blocks.extend(image(child)),
            "head" | "script" | "style" | "noscript" | "template" => {}
            "html" | "body" | "div" | "section" | "article" | "main" | "header" | "footer"
            | "blockquote" | "center" | "span" | "table" | "thead" | "tbody" | "tfoot"
            | "tr" | "td" | "th" => walk(child, blocks),
            _ => {}
        }
    }
}

/// Text and images of a paragraph come out as separate blocks in document
/// order; a picture inline with text is not lost to the sanitizer.
fn classify_paragraph(p: ElementRef<'_>, blocks: &mut Vec<Block>) {
    if !contains_image(p) {
        blocks.push(Block::Paragraph {
            html: p.inner_html(),
            text: plain_text(p),
        });
        return;
    }
    let mut html = String::new();
    let mut text = String::new();
    split_images(p, &mut html, &mut text, blocks);
    flush_run(&mut html, &mut text, blocks);
}

fn is_image(el: &ElementRef<'_>) -> bool {
    el.value().name().eq_ignore_ascii_case("img")
}

fn contains_image(el: ElementRef<'_>) -> bool {
    el.descendants().filter_map(ElementRef::wrap).any(|e| is_image(&e))
}

fn split_images(el: ElementRef<'_>, html: &mut String, text: &mut String, blocks: &mut Vec<Block>) {
    for node in el.children() {
        match node.value() {
            Node::Text(t) => {
                html.push_str(&escape_text(t));
                text.push_str(t);
            }
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(node) else {
                    continue;
                };
                if is_image(&child) {
                    flush_run(html, text, blocks);
                    blocks.extend(image(child));
                } else if contains_image(child) {
                    split_images(child, html, text, blocks);
                } else {
                    html.push_str(&child.html());
                    text.push_str(&visible_text(child));
                }
            }
            _ => {}
        }
    }
}

fn flush_run(html: &mut String, text: &mut String, blocks: &mut Vec<Block>) {
    let normalized = normalize_dashes(&collapse_whitespace(text));
    if !normalized.is_empty() {
        blocks.push(Block::Paragraph {
            html: html.trim().to_string(),
            text: normalized,
        });
    }
    html.clear();
    text.clear();
}

/// Direct `<li>` children become items; nested lists follow their parent
/// item as items of the same list.
fn collect_items(list: ElementRef<'_>, items: &mut Vec<ListItem>) {
    for li in list.children().filter_map(ElementRef::wrap) {
        if !li.value().name().eq_ignore_ascii_case("li") {
            continue;
        }
        let mut html = String::new();
        let mut text = String::new();
        let mut nested = Vec::new();
        for node in li.children() {
            match node.value() {
                Node::Text(t) => {
                    html.push_str(&escape_text(t));
                    text.push_str(t);
                }
                Node::Element(e) if matches!(e.name(), "ul" | "ol") => {
                    nested.extend(ElementRef::wrap(node));
                }
                Node::Element(_) => {
                    if let Some(e) = ElementRef::wrap(node) {
                        html.push_str(&e.html());
                        text.push_str(&visible_text(e));
                    }
                }
                _ => {}
            }
        }
        items.push(ListItem {
            html: html.trim().to_string(),
            text: normalize_dashes(&collapse_whitespace(&text)),
        });
        for sub in nested {
            collect_items(sub, items);
        }
    }
}

fn image(el: ElementRef<'_>) -> Option<Block> {
    let src = el.value().attr("src")?.trim();
    if src.is_empty() {
        return None;
    }
    Some(Block::Image {
        src: src.to_string(),
        alt: el.value().attr("alt").unwrap_or("").trim().to_string(),
    })
}

fn plain_text(el: ElementRef<'_>) -> String {
    normalize_dashes(&collapse_whitespace(&visible_text(el)))
}
