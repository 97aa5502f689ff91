//! Newsletter registry: brand styles and section layouts per publication.

use crate::parser::sections::{looks_like_title_line, ContentKind, Marker, SectionRule};
use crate::sanitize::LinkStyle;
use crate::text::escape_html;

/// Presentational constants of one publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brand {
    pub font_family: &'static str,
    pub text_color: &'static str,
    pub heading_color: &'static str,
    pub link_color: &'static str,
    pub accent_color: &'static str,
    pub font_size: &'static str,
    pub title_size: &'static str,
    pub line_height: &'static str,
    pub underline_links: bool,
}

impl Brand {
    pub fn link_style(&self) -> LinkStyle {
        LinkStyle {
            color: self.link_color,
            underline: self.underline_links,
        }
    }

    /// Brand tokens available to every layout and wrapper template.
    pub fn template_values(&self) -> [(&'static str, String); 5] {
        [
            ("FONT_FAMILY", escape_html(self.font_family)),
            ("TEXT_COLOR", self.text_color.to_string()),
            ("HEADING_COLOR", self.heading_color.to_string()),
            ("LINK_COLOR", self.link_color.to_string()),
            ("ACCENT_COLOR", self.accent_color.to_string()),
        ]
    }
}

/// How a section's extracted content becomes markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    /// One escaped text row per list item.
    Rows,
    /// Titled stories with their bodies.
    Topics,
    /// Bodies only, no titles.
    Paragraphs,
}

#[derive(Clone)]
pub struct SectionSpec {
    /// Layout token receiving the fragment.
    pub token: &'static str,
    pub rule: SectionRule,
    pub render: RenderKind,
    /// Wrapper template (file name under the newsletter's template dir)
    /// whose `{{%ROWS%}}` receives the fragment.
    pub wrapper: Option<&'static str>,
}

#[derive(Clone)]
pub struct Newsletter {
    pub slug: &'static str,
    pub name: &'static str,
    pub brand: Brand,
    pub sections: Vec<SectionSpec>,
}

pub const SLUGS: &[&str] = &["weekly", "research", "alumni"];

/// Look up a newsletter by the identifier segment of the input path.
pub fn lookup(slug: &str) -> Option<Newsletter> {
    match slug.to_ascii_lowercase().as_str() {
        "weekly" => Some(weekly()),
        "research" => Some(research()),
        "alumni" => Some(alumni()),
        _ => None,
    }
}

fn weekly() -> Newsletter {
    Newsletter {
        slug: "weekly",
        name: "The Weekly",
        brand: Brand {
            font_family: "Helvetica, Arial, sans-serif",
            text_color: "#333333",
            heading_color: "#003366",
            link_color: "#0055a4",
            accent_color: "#f2a900",
            font_size: "15px",
            title_size: "20px",
            line_height: "22px",
            underline_links: true,
        },
        sections: vec![
            SectionSpec {
                token: "INTRO",
                rule: SectionRule::flat(Marker::prefix("welcome"))
                    .only(&[ContentKind::Paragraph]),
                render: RenderKind::Paragraphs,
                wrapper: Some("intro.mjml"),
            },
            SectionSpec {
                token: "CONTENTS",
                rule: SectionRule::flat(Marker::prefix("in this edition"))
                    .only(&[ContentKind::List]),
                render: RenderKind::Rows,
                wrapper: Some("contents.mjml"),
            },
            SectionSpec {
                token: "SPOTLIGHT",
                rule: SectionRule::topics(Marker::exact("spotlight"), 3),
                render: RenderKind::Topics,
                wrapper: Some("spotlight.mjml"),
            },
            SectionSpec {
                token: "EVENTS",
                rule: SectionRule::topics(Marker::prefix("events"), 3),
                render: RenderKind::Topics,
                wrapper: Some("events.mjml"),
            },
        ],
    }
}

fn research() -> Newsletter {
    Newsletter {
        slug: "research",
        name: "Research Bulletin",
        brand: Brand {
            font_family: "Georgia, 'Times New Roman', serif",
            text_color: "#222222",
            heading_color: "#5b1a6e",
            link_color: "#5b1a6e",
            accent_color: "#e6dced",
            font_size: "16px",
            title_size: "19px",
            line_height: "24px",
            underline_links: false,
        },
        sections: vec![
            SectionSpec {
                token: "HIGHLIGHTS",
                rule: SectionRule::flat(Marker::exact("highlights"))
                    .with_title_lines(looks_like_title_line)
                    .stop_at(&["Publications", "Funding opportunities", "Contact us"]),
                render: RenderKind::Topics,
                wrapper: Some("highlights.mjml"),
            },
            SectionSpec {
                token: "PUBLICATIONS",
                rule: SectionRule::flat(Marker::exact("publications"))
                    .only(&[ContentKind::List])
                    .stop_at(&["Funding opportunities", "Contact us"]),
                render: RenderKind::Rows,
                wrapper: Some("publications.mjml"),
            },
            SectionSpec {
                token: "FUNDING",
                rule: SectionRule::flat(Marker::prefix("funding"))
                    .with_title_lines(looks_like_title_line)
                    .stop_at(&["Contact us"])
                    .keep_preamble(),
                render: RenderKind::Topics,
                wrapper: Some("funding.mjml"),
            },
        ],
    }
}

fn alumni() -> Newsletter {
    Newsletter {
        slug: "alumni",
        name: "Alumni Update",
        brand: Brand {
            font_family: "Verdana, Geneva, sans-serif",
            text_color: "#3c3c3c",
            heading_color: "#8b0000",
            link_color: "#8b0000",
            accent_color: "#fbe9e7",
            font_size: "14px",
            title_size: "18px",
            line_height: "21px",
            underline_links: true,
        },
        sections: vec![
            SectionSpec {
                token: "NEWS",
                rule: SectionRule::topics(Marker::exact("news"), 3).keep_preamble(),
                render: RenderKind::Topics,
                wrapper: Some("news.mjml"),
            },
            SectionSpec {
                token: "CLASS_NOTES",
                rule: SectionRule::topics(Marker::exact("class notes"), 3),
                render: RenderKind::Topics,
                wrapper: Some("class_notes.mjml"),
            },
            SectionSpec {
                token: "DATES",
                rule: SectionRule::flat(Marker::prefix("save the date"))
                    .only(&[ContentKind::List, ContentKind::Paragraph]),
                render: RenderKind::Rows,
                wrapper: Some("dates.mjml"),
            },
        ],
    }
}
