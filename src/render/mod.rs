//! Fragment builders: extracted sections → brand-styled MJML.

pub mod template;

use crate::newsletter::{Brand, RenderKind};
use crate::parser::sections::{Content, Section};
use crate::text::escape_html;

pub fn render(kind: RenderKind, sections: &[Section], brand: &Brand) -> String {
    match kind {
        RenderKind::Rows => rows(sections, brand),
        RenderKind::Topics => topics(sections, brand, true),
        RenderKind::Paragraphs => topics(sections, brand, false),
    }
}

/// One text row per list item, falling back to paragraphs when the
/// sections hold no list.
pub fn rows(sections: &[Section], brand: &Brand) -> String {
    let mut texts: Vec<&str> = sections
        .iter()
        .flat_map(|s| s.list_items())
        .map(|i| i.text.as_str())
        .collect();
    if texts.is_empty() {
        texts = sections
            .iter()
            .flat_map(|s| s.paragraphs())
            .map(|p| p.text.as_str())
            .collect();
    }

    texts
        .into_iter()
        .map(|t| {
            format!(
                "<mj-text padding=\"4px 25px\" font-family=\"{}\" font-size=\"{}\" line-height=\"{}\" color=\"{}\">{}</mj-text>\n",
                escape_html(brand.font_family),
                brand.font_size,
                brand.line_height,
                brand.text_color,
                escape_html(t)
            )
        })
        .collect()
}

fn topics(sections: &[Section], brand: &Brand, with_titles: bool) -> String {
    let mut out = String::new();
    for (i, section) in sections.iter().enumerate() {
        if with_titles && i > 0 {
            out.push_str(&format!(
                "<mj-divider padding=\"8px 25px\" border-width=\"1px\" border-color=\"{}\" />\n",
                brand.accent_color
            ));
        }
        if with_titles && !section.title.is_empty() {
            out.push_str(&format!(
                "<mj-text padding=\"16px 25px 4px\" font-family=\"{}\" font-size=\"{}\" font-weight=\"bold\" color=\"{}\">{}</mj-text>\n",
                escape_html(brand.font_family),
                brand.title_size,
                brand.heading_color,
                escape_html(&section.title)
            ));
        }
        render_body(&section.body, brand, &mut out);
    }
    out
}

/// Text content is grouped into one `<mj-text>` per run; images break runs.
fn render_body(body: &[Content], brand: &Brand, out: &mut String) {
    let mut run = String::new();
    for content in body {
        match content {
            Content::Paragraph(p) => {
                run.push_str(&format!("<p style=\"margin:0 0 12px;\">{}</p>", p.html));
            }
            Content::List { ordered, items } => {
                let tag = if *ordered { "ol" } else { "ul" };
                run.push_str(&format!("<{} style=\"margin:0 0 12px;padding-left:20px;\">", tag));
                for item in items {
                    run.push_str(&format!("<li>{}</li>", item.html));
                }
                run.push_str(&format!("</{}>", tag));
            }
            Content::Image { src, alt } => {
                flush_text(&mut run, brand, out);
                out.push_str(&format!(
                    "<mj-image padding=\"8px 25px\" src=\"{}\" alt=\"{}\" />\n",
                    escape_html(src),
                    escape_html(alt)
                ));
            }
        }
    }
    flush_text(&mut run, brand, out);
}

fn flush_text(run: &mut String, brand: &Brand, out: &mut String) {
    if run.is_empty() {
        return;
    }
    out.push_str(&format!(
        "<mj-text padding=\"4px 25px\" font-family=\"{}\" font-size=\"{}\" line-height=\"{}\" color=\"{}\">{}</mj-text>\n",
        escape_html(brand.font_family),
        brand.font_size,
        brand.line_height,
        brand.text_color,
        run
    ));
    run.clear();
}
