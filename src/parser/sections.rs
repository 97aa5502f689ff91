use std::sync::LazyLock;

use regex::Regex;

use super::blocks::Block;
use crate::sanitize::{is_empty_fragment, sanitize_inline, LinkStyle};
use crate::text::{is_blank, marker_key};

static BOLD_WRAPPER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^<(?:b|strong)(?:\s[^>]*)?>([^<]*)</(?:b|strong)>$").unwrap()
});

const TERMINAL_PUNCTUATION: &[char] = &['.', '!', '?', ';', ',', '\u{2026}'];

/// Predicate deciding whether a paragraph acts as a sub-section title.
pub type TitleClassifier = fn(&Block) -> bool;

/// Start-of-section predicate over normalized (collapsed, lowercase) text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Exact(String),
    Prefix(String),
}

impl Marker {
    pub fn exact(text: &str) -> Self {
        Marker::Exact(marker_key(text))
    }

    pub fn prefix(text: &str) -> Self {
        Marker::Prefix(marker_key(text))
    }

    pub fn matches(&self, text: &str) -> bool {
        let key = marker_key(text);
        match self {
            Marker::Exact(m) => key == *m,
            Marker::Prefix(p) => key.starts_with(p.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Paragraph,
    List,
    Image,
}

/// What happens to content between the marker and the first sub-heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preamble {
    Discard,
    Keep,
}

/// One configuration of the marker-bounded walk.
#[derive(Clone)]
pub struct SectionRule {
    pub start: Marker,
    /// Heading level that opens a sub-section (topic).
    pub sub_level: Option<u8>,
    /// Paragraphs accepted by this classifier also open a sub-section.
    pub title_lines: Option<TitleClassifier>,
    /// Marker keys that end the section even without a heading tag.
    pub stop: Vec<String>,
    pub preamble: Preamble,
    pub content: &'static [ContentKind],
}

const ALL_CONTENT: &[ContentKind] = &[ContentKind::Paragraph, ContentKind::List, ContentKind::Image];

impl SectionRule {
    /// A single section titled with the marker text.
    pub fn flat(start: Marker) -> Self {
        Self {
            start,
            sub_level: None,
            title_lines: None,
            stop: Vec::new(),
            preamble: Preamble::Discard,
            content: ALL_CONTENT,
        }
    }

    /// Topics opened by headings of `level` under the marker.
    pub fn topics(start: Marker, level: u8) -> Self {
        Self {
            sub_level: Some(level),
            ..Self::flat(start)
        }
    }

    pub fn with_title_lines(mut self, classifier: TitleClassifier) -> Self {
        self.title_lines = Some(classifier);
        self
    }

    pub fn stop_at(mut self, names: &[&str]) -> Self {
        self.stop.extend(names.iter().map(|n| marker_key(n)));
        self
    }

    pub fn keep_preamble(mut self) -> Self {
        self.preamble = Preamble::Keep;
        self
    }

    pub fn only(mut self, content: &'static [ContentKind]) -> Self {
        self.content = content;
        self
    }

    fn opens_topics(&self) -> bool {
        self.sub_level.is_some() || self.title_lines.is_some()
    }

    fn is_stop(&self, text: &str) -> bool {
        let key = marker_key(text);
        self.stop.iter().any(|s| *s == key)
    }

    fn accepts(&self, kind: ContentKind) -> bool {
        self.content.contains(&kind)
    }
}

/// Sanitized inline markup with its plain text.
#[derive(Debug, Clone, PartialEq)]
pub struct Inline {
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Paragraph(Inline),
    List { ordered: bool, items: Vec<Inline> },
    Image { src: String, alt: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub body: Vec<Content>,
}

impl Section {
    fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            body: Vec::new(),
        }
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Inline> {
        self.body.iter().filter_map(|c| match c {
            Content::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    pub fn list_items(&self) -> impl Iterator<Item = &Inline> {
        self.body.iter().flat_map(|c| match c {
            Content::List { items, .. } => items.as_slice(),
            _ => &[][..],
        })
    }
}

/// Walk `blocks` from the first occurrence of the rule's marker and collect
/// its sections. A document without the marker yields an empty list.
pub fn extract(blocks: &[Block], rule: &SectionRule, link: &LinkStyle) -> Vec<Section> {
    let Some((start, marker)) = blocks
        .iter()
        .enumerate()
        .find(|(_, b)| b.marker_text().is_some_and(|t| rule.start.matches(t)))
    else {
        return Vec::new();
    };

    let boundary = match marker {
        Block::Heading { level, .. } => *level,
        _ => rule.sub_level.map(|l| l.saturating_sub(1)).unwrap_or(6),
    };

    let mut sections = Vec::new();
    let mut current = if !rule.opens_topics() {
        Some(Section::titled(marker.marker_text().unwrap_or_default()))
    } else if rule.preamble == Preamble::Keep {
        Some(Section::titled(""))
    } else {
        None
    };

    for block in &blocks[start + 1..] {
        if block.marker_text().is_some_and(|t| rule.is_stop(t)) {
            break;
        }
        match block {
            Block::Heading { level, text } => {
                if *level <= boundary {
                    break;
                }
                if Some(*level) == rule.sub_level {
                    close(&mut sections, current.take());
                    current = Some(Section::titled(text));
                }
                continue;
            }
            Block::Paragraph { text, .. } if rule.title_lines.is_some_and(|f| f(block)) => {
                close(&mut sections, current.take());
                current = Some(Section::titled(text));
                continue;
            }
            _ => {}
        }

        if let (Some(section), Some(content)) = (current.as_mut(), to_content(block, rule, link)) {
            section.body.push(content);
        }
    }
    close(&mut sections, current);
    sections
}

fn close(sections: &mut Vec<Section>, section: Option<Section>) {
    if let Some(section) = section {
        // an untitled preamble with nothing in it is not a section
        if !section.title.is_empty() || !section.body.is_empty() {
            sections.push(section);
        }
    }
}

fn to_content(block: &Block, rule: &SectionRule, link: &LinkStyle) -> Option<Content> {
    match block {
        Block::Paragraph { html, text } if rule.accepts(ContentKind::Paragraph) => {
            if is_empty_fragment(html) {
                return None;
            }
            Some(Content::Paragraph(Inline {
                html: sanitize_inline(html, link),
                text: text.clone(),
            }))
        }
        Block::List { ordered, items } if rule.accepts(ContentKind::List) => {
            let items: Vec<Inline> = items
                .iter()
                .filter(|i| !is_blank(&i.text))
                .map(|i| Inline {
                    html: sanitize_inline(&i.html, link),
                    text: i.text.clone(),
                })
                .collect();
            if items.is_empty() {
                return None;
            }
            Some(Content::List {
                ordered: *ordered,
                items,
            })
        }
        Block::Image { src, alt } if rule.accepts(ContentKind::Image) => Some(Content::Image {
            src: src.clone(),
            alt: alt.clone(),
        }),
        _ => None,
    }
}

/// Heuristic pseudo-heading: a bold wrapper around at most 80 characters,
/// or at most 60 characters without terminal punctuation.
///
/// Short sentences without a full stop are classified as titles too.
pub fn looks_like_title_line(block: &Block) -> bool {
    let Block::Paragraph { html, text } = block else {
        return false;
    };
    if text.is_empty() {
        return false;
    }
    let chars = text.chars().count();
    if chars <= 80 && BOLD_WRAPPER_RE.is_match(html.trim()) {
        return true;
    }
    chars <= 60 && !text.ends_with(TERMINAL_PUNCTUATION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::blocks::classify_document;

    fn link() -> LinkStyle {
        LinkStyle {
            color: "#123456",
            underline: true,
        }
    }

    fn run(html: &str, rule: &SectionRule) -> Vec<Section> {
        extract(&classify_document(html), rule, &link())
    }

    #[test]
    fn spotlight_topics() {
        let html = "<h2>Spotlight</h2><h3>Story One</h3><p>Hello <b>World</b></p><h3>Story Two</h3><h2>Events</h2><p>later</p>";
        let topics = run(html, &SectionRule::topics(Marker::exact("spotlight"), 3));
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].title, "Story One");
        assert_eq!(
            topics[0].body,
            vec![Content::Paragraph(Inline {
                html: "Hello <strong>World</strong>".into(),
                text: "Hello World".into()
            })]
        );
        assert_eq!(topics[1].title, "Story Two");
        assert!(topics[1].body.is_empty());
    }

    #[test]
    fn bodies_follow_document_order() {
        let html = "<h2>Spotlight</h2><h3>A</h3><p>a1</p><p>a2</p><h3>B</h3><p>b1</p>";
        let topics = run(html, &SectionRule::topics(Marker::exact("Spotlight"), 3));
        let texts = |s: &Section| s.paragraphs().map(|p| p.text.clone()).collect::<Vec<_>>();
        assert_eq!(texts(&topics[0]), vec!["a1", "a2"]);
        assert_eq!(texts(&topics[1]), vec!["b1"]);
    }

    #[test]
    fn missing_marker_is_empty() {
        let topics = run("<h2>Other</h2><p>x</p>", &SectionRule::topics(Marker::exact("Spotlight"), 3));
        assert!(topics.is_empty());
    }

    #[test]
    fn stops_at_equal_level_without_sub_markers() {
        let html = "<h2>Spotlight</h2><p>orphan</p><h2>Next</h2><h3>Not ours</h3><p>x</p>";
        let topics = run(html, &SectionRule::topics(Marker::exact("Spotlight"), 3));
        assert!(topics.is_empty());
    }

    #[test]
    fn preamble_kept_or_discarded() {
        let html = "<h2>News</h2><p>intro</p><h3>Item</h3><p>body</p>";
        let discarded = run(html, &SectionRule::topics(Marker::exact("news"), 3));
        assert_eq!(discarded.len(), 1);
        let kept = run(html, &SectionRule::topics(Marker::exact("news"), 3).keep_preamble());
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].title, "");
        assert_eq!(kept[0].paragraphs().next().unwrap().text, "intro");
    }

    #[test]
    fn flat_section_with_list() {
        let html = "<p><b>In this edition:</b></p><ul><li>Item A</li><li>Item B</li></ul><h2>Spotlight</h2>";
        let sections = run(
            html,
            &SectionRule::flat(Marker::exact("In this edition:")).only(&[ContentKind::List]),
        );
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "In this edition:");
        let items: Vec<_> = sections[0].list_items().map(|i| i.text.as_str()).collect();
        assert_eq!(items, vec!["Item A", "Item B"]);
    }

    #[test]
    fn prefix_marker() {
        let html = "<h1>Welcome to the May edition</h1><p>Hi all.</p><h1>End</h1>";
        let sections = run(html, &SectionRule::flat(Marker::prefix("welcome")));
        assert_eq!(sections[0].paragraphs().count(), 1);
    }

    #[test]
    fn blank_paragraphs_dropped() {
        let html = "<h2>Notes</h2><p>&nbsp;</p><p>   </p><p>real</p><ul><li>&nbsp;</li></ul>";
        let sections = run(html, &SectionRule::flat(Marker::exact("notes")));
        assert_eq!(sections[0].body.len(), 1);
    }

    #[test]
    fn title_lines_and_stop_set() {
        let html = "<p>Highlights</p>\
                    <p><strong>New grant awarded</strong></p><p>The lab received funding this year.</p>\
                    <p>Second story</p><p>More detail follows here, as usual.</p>\
                    <p><b>Publications</b></p><p>Not part of highlights.</p>";
        let rule = SectionRule::flat(Marker::exact("highlights"))
            .with_title_lines(looks_like_title_line)
            .stop_at(&["Publications"]);
        let stories = run(html, &rule);
        let titles: Vec<_> = stories.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["New grant awarded", "Second story"]);
        assert_eq!(stories[1].paragraphs().count(), 1);
    }

    #[test]
    fn title_heuristic() {
        let para = |html: &str, text: &str| Block::Paragraph {
            html: html.into(),
            text: text.into(),
        };
        assert!(looks_like_title_line(&para("<b>Bold title</b>", "Bold title")));
        assert!(looks_like_title_line(&para("Short line", "Short line")));
        assert!(!looks_like_title_line(&para("Short sentence.", "Short sentence.")));
        let long = "x".repeat(61);
        assert!(!looks_like_title_line(&para(&long, &long)));
        let bold_long = format!("<strong>{}</strong>", "y".repeat(75));
        assert!(looks_like_title_line(&para(&bold_long, &"y".repeat(75))));
        assert!(!looks_like_title_line(&para("", "")));
        assert!(!looks_like_title_line(&Block::Heading {
            level: 2,
            text: "x".into()
        }));
    }

    #[test]
    fn inline_picture_kept_as_image() {
        let sections = run(
            "<h2>Spotlight</h2><h3>Story</h3><p>Photo: <img src=\"pic.png\"></p>",
            &SectionRule::topics(Marker::exact("spotlight"), 3),
        );
        assert_eq!(sections.len(), 1);
        assert_eq!(
            sections[0].body,
            vec![
                Content::Paragraph(Inline { html: "Photo:".into(), text: "Photo:".into() }),
                Content::Image { src: "pic.png".into(), alt: String::new() },
            ]
        );
    }

    #[test]
    fn script_only_paragraph_dropped() {
        let sections = run(
            "<h2>Notes</h2><p><script>track()</script></p><p>real</p>",
            &SectionRule::flat(Marker::exact("notes")),
        );
        let texts: Vec<&str> = sections[0].paragraphs().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["real"]);
    }
}
