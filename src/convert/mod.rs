//! Source document → HTML.
//!
//! `.docx` files are unpacked and their WordprocessingML rendered to plain
//! semantic HTML: headings, paragraphs, lists, bold/italic runs, hyperlinks
//! and embedded images as data URIs. `.html`/`.htm` inputs are already
//! converted and pass through untouched.

pub mod docx;

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;
use tracing::{debug, info};

use crate::error::BuildError;
use crate::text::{escape_html, escape_text};
use docx::{Inline, Numbering, Paragraph, Relationship};

pub async fn to_html(path: &Path) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "html" | "htm" => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        "docx" => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            info!("Converting {} ({} bytes)", path.display(), bytes.len());
            let html = tokio::task::spawn_blocking(move || docx_to_html(&bytes))
                .await
                .context("Conversion task failed")?
                .map_err(|e| BuildError::Conversion(format!("{:#}", e)))?;
            Ok(html)
        }
        other => Err(BuildError::Conversion(format!(
            "unsupported document type '.{}' for {}",
            other,
            path.display()
        ))
        .into()),
    }
}

/// Render a `.docx` archive as an HTML document.
pub fn docx_to_html(bytes: &[u8]) -> Result<String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("Not a .docx (zip) archive")?;

    let body = read_entry(&mut archive, "word/document.xml")?
        .context("Archive has no word/document.xml")?;
    let rels = match read_entry(&mut archive, "word/_rels/document.xml.rels")? {
        Some(xml) => docx::parse_relationships(&xml)?,
        None => HashMap::new(),
    };
    let numbering = match read_entry(&mut archive, "word/numbering.xml")? {
        Some(xml) => docx::parse_numbering(&xml)?,
        None => Numbering::default(),
    };
    let styles = match read_entry(&mut archive, "word/styles.xml")? {
        Some(xml) => docx::parse_styles(&xml)?,
        None => HashMap::new(),
    };

    let paragraphs = docx::parse_body(&body)?;
    let images = encode_images(&mut archive, &rels)?;
    debug!(
        paragraphs = paragraphs.len(),
        images = images.len(),
        "Parsed document body"
    );

    Ok(render_html(&paragraphs, &rels, &numbering, &styles, &images))
}

fn read_entry<R: Read + Seek>(archive: &mut zip::ZipArchive<R>, name: &str) -> Result<Option<String>> {
    Ok(read_entry_bytes(archive, name)?.map(|b| String::from_utf8_lossy(&b).into_owned()))
}

fn read_entry_bytes<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)
                .with_context(|| format!("Failed to read {} from archive", name))?;
            Ok(Some(bytes))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Image relationships → `data:` URIs, keyed by relationship id.
fn encode_images<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    rels: &HashMap<String, Relationship>,
) -> Result<HashMap<String, String>> {
    let mut images = HashMap::new();
    for (id, rel) in rels.iter().filter(|(_, r)| r.is_image) {
        let path = match rel.target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("word/{}", rel.target),
        };
        let Some(bytes) = read_entry_bytes(archive, &path)? else {
            debug!("Image {} missing from archive", path);
            continue;
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        images.insert(id.clone(), format!("data:{};base64,{}", mime_type(&path), encoded));
    }
    Ok(images)
}

fn mime_type(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// `Heading1`/`heading 1` → 1, `Title` → 1, `Subtitle` → 2.
fn heading_level(style_id: &str, styles: &HashMap<String, String>) -> Option<u8> {
    let name = styles.get(style_id).map(String::as_str).unwrap_or(style_id);
    let key: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    match key.as_str() {
        "title" => Some(1),
        "subtitle" => Some(2),
        _ => key
            .strip_prefix("heading")
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| (1..=6).contains(n)),
    }
}

fn render_html(
    paragraphs: &[Paragraph],
    rels: &HashMap<String, Relationship>,
    numbering: &Numbering,
    styles: &HashMap<String, String>,
    images: &HashMap<String, String>,
) -> String {
    let mut out = String::from("<html><body>\n");
    let mut open_list: Option<bool> = None;

    for p in paragraphs {
        let inline = render_inlines(&p.inlines, rels, images);

        if let Some((num_id, ilvl)) = &p.numbering {
            let ordered = numbering.is_ordered(num_id, *ilvl);
            if open_list != Some(ordered) {
                close_list(&mut out, open_list.take());
                out.push_str(if ordered { "<ol>\n" } else { "<ul>\n" });
                open_list = Some(ordered);
            }
            out.push_str(&format!("<li>{}</li>\n", inline));
            continue;
        }
        close_list(&mut out, open_list.take());

        match p.style.as_deref().and_then(|s| heading_level(s, styles)) {
            Some(level) => out.push_str(&format!("<h{0}>{1}</h{0}>\n", level, inline)),
            None => out.push_str(&format!("<p>{}</p>\n", inline)),
        }
    }
    close_list(&mut out, open_list);
    out.push_str("</body></html>\n");
    out
}

fn close_list(out: &mut String, list: Option<bool>) {
    match list {
        Some(true) => out.push_str("</ol>\n"),
        Some(false) => out.push_str("</ul>\n"),
        None => {}
    }
}

fn render_inlines(
    inlines: &[Inline],
    rels: &HashMap<String, Relationship>,
    images: &HashMap<String, String>,
) -> String {
    let mut out = String::new();
    let mut open_link: Option<&str> = None;

    for inline in inlines {
        let link = inline.link();
        if link != open_link {
            if open_link.is_some() {
                out.push_str("</a>");
            }
            if let Some(id) = link {
                match rels.get(id) {
                    Some(rel) => out.push_str(&format!("<a href=\"{}\">", escape_html(&rel.target))),
                    None => out.push_str("<a>"),
                }
            }
            open_link = link;
        }

        match inline {
            Inline::Text {
                text, bold, italic, ..
            } => {
                let mut s = escape_text(text);
                if *italic {
                    s = format!("<em>{}</em>", s);
                }
                if *bold {
                    s = format!("<strong>{}</strong>", s);
                }
                out.push_str(&s);
            }
            Inline::Image { rel_id, .. } => {
                if let Some(uri) = images.get(rel_id) {
                    out.push_str(&format!("<img src=\"{}\" alt=\"\" />", uri));
                }
            }
            Inline::Break => out.push_str("<br />"),
        }
    }
    if open_link.is_some() {
        out.push_str("</a>");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const W: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#;

    fn build_docx(body: &str, extra: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        write!(zip, "<w:document {}><w:body>{}</w:body></w:document>", W, body).unwrap();
        for (name, data) in extra {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn para(style: Option<&str>, text: &str) -> String {
        let ppr = style
            .map(|s| format!("<w:pPr><w:pStyle w:val=\"{}\"/></w:pPr>", s))
            .unwrap_or_default();
        format!("<w:p>{}<w:r><w:t>{}</w:t></w:r></w:p>", ppr, text)
    }

    fn list_item(num_id: &str, text: &str) -> String {
        format!(
            "<w:p><w:pPr><w:numPr><w:ilvl w:val=\"0\"/><w:numId w:val=\"{}\"/></w:numPr></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>",
            num_id, text
        )
    }

    #[test]
    fn headings_lists_and_paragraphs() {
        let body = [
            para(Some("Heading2"), "In this edition:"),
            list_item("1", "Item A"),
            list_item("1", "Item B"),
            list_item("2", "Step 1"),
            para(None, "Tom &amp; Jerry"),
            para(Some("Title"), "Big"),
        ]
        .concat();
        let numbering = br#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/></w:lvl></w:abstractNum>
<w:abstractNum w:abstractNumId="1"><w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl></w:abstractNum>
<w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
<w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>
</w:numbering>"#;
        let bytes = build_docx(&body, &[("word/numbering.xml", numbering)]);
        let html = docx_to_html(&bytes).unwrap();
        assert_eq!(
            html,
            "<html><body>\n<h2>In this edition:</h2>\n<ul>\n<li>Item A</li>\n<li>Item B</li>\n</ul>\n\
             <ol>\n<li>Step 1</li>\n</ol>\n<p>Tom &amp; Jerry</p>\n<h1>Big</h1>\n</body></html>\n"
        );
    }

    #[test]
    fn runs_links_and_images() {
        let body = r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Bold</w:t></w:r><w:r><w:t xml:space="preserve"> see </w:t></w:r><w:hyperlink r:id="rId2"><w:r><w:rPr><w:i/></w:rPr><w:t>here</w:t></w:r></w:hyperlink></w:p><w:p><w:r><w:drawing><a:blip r:embed="rId3"/></w:drawing></w:r></w:p>"#;
        let rels = br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.org/x" TargetMode="External"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
</Relationships>"#;
        let bytes = build_docx(
            body,
            &[
                ("word/_rels/document.xml.rels", rels),
                ("word/media/image1.png", b"\x89PNG"),
            ],
        );
        let html = docx_to_html(&bytes).unwrap();
        assert!(html.contains(
            "<p><strong>Bold</strong> see <a href=\"https://example.org/x\"><em>here</em></a></p>"
        ));
        assert!(html.contains("<p><img src=\"data:image/png;base64,iVBORw==\" alt=\"\" /></p>"));
    }

    #[test]
    fn styles_resolve_localized_headings() {
        let styles = br#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:styleId="berschrift3"><w:name w:val="heading 3"/></w:style></w:styles>"#;
        let bytes = build_docx(&para(Some("berschrift3"), "Story"), &[("word/styles.xml", styles)]);
        let html = docx_to_html(&bytes).unwrap();
        assert!(html.contains("<h3>Story</h3>"));
    }

    #[test]
    fn not_a_zip() {
        assert!(docx_to_html(b"plain text").is_err());
    }

    #[tokio::test]
    async fn unsupported_extension() {
        let err = to_html(Path::new("notes.pdf")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::Conversion(_))
        ));
    }

    #[tokio::test]
    async fn docx_file_round() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issue.docx");
        std::fs::write(&path, build_docx(&para(Some("Heading1"), "Hi"), &[])).unwrap();
        let html = to_html(&path).await.unwrap();
        assert!(html.contains("<h1>Hi</h1>"));
    }
}
