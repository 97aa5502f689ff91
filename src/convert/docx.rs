//! WordprocessingML parts read with quick-xml: body paragraphs, relationships,
//! numbering definitions and style names.

use std::collections::HashMap;

use anyhow::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub style: Option<String>,
    /// (numId, ilvl) when the paragraph is a list item.
    pub numbering: Option<(String, u8)>,
    pub inlines: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text {
        text: String,
        bold: bool,
        italic: bool,
        link: Option<String>,
    },
    Image {
        rel_id: String,
        link: Option<String>,
    },
    Break,
}

impl Inline {
    pub fn link(&self) -> Option<&str> {
        match self {
            Inline::Text { link, .. } | Inline::Image { link, .. } => link.as_deref(),
            Inline::Break => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub target: String,
    pub is_image: bool,
}

/// numId → abstractNumId, abstractNumId → (ilvl → numFmt).
#[derive(Debug, Clone, Default)]
pub struct Numbering {
    nums: HashMap<String, String>,
    formats: HashMap<String, HashMap<u8, String>>,
}

impl Numbering {
    /// Unknown definitions are treated as bullets.
    pub fn is_ordered(&self, num_id: &str, ilvl: u8) -> bool {
        self.nums
            .get(num_id)
            .and_then(|abs| self.formats.get(abs))
            .and_then(|levels| levels.get(&ilvl))
            .is_some_and(|fmt| fmt != "bullet" && fmt != "none")
    }
}

fn attr(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// `<w:b/>` is on; `w:val="0"`, `"false"` or `"off"` turn it off.
fn toggle(e: &BytesStart<'_>) -> bool {
    !matches!(attr(e, b"val").as_deref(), Some("0" | "false" | "off"))
}

#[derive(Default)]
struct BodyState {
    paragraphs: Vec<Paragraph>,
    current: Option<Paragraph>,
    p_depth: u32,
    in_ppr: bool,
    num_id: Option<String>,
    ilvl: u8,
    in_run: bool,
    in_rpr: bool,
    bold: bool,
    italic: bool,
    in_text: bool,
    link: Option<String>,
}

impl BodyState {
    fn open(&mut self, e: &BytesStart<'_>) {
        match e.local_name().as_ref() {
            b"p" => {
                if self.p_depth == 0 {
                    self.current = Some(Paragraph {
                        style: None,
                        numbering: None,
                        inlines: Vec::new(),
                    });
                    self.num_id = None;
                    self.ilvl = 0;
                }
                self.p_depth += 1;
            }
            b"pPr" => self.in_ppr = true,
            b"pStyle" if self.in_ppr => {
                if let Some(p) = self.current.as_mut() {
                    p.style = attr(e, b"val");
                }
            }
            b"numId" if self.in_ppr => self.num_id = attr(e, b"val"),
            b"ilvl" if self.in_ppr => {
                self.ilvl = attr(e, b"val").and_then(|v| v.parse().ok()).unwrap_or(0);
            }
            b"hyperlink" => self.link = attr(e, b"id"),
            b"r" => {
                self.in_run = true;
                self.bold = false;
                self.italic = false;
            }
            b"rPr" if self.in_run => self.in_rpr = true,
            b"b" if self.in_rpr => self.bold = toggle(e),
            b"i" if self.in_rpr => self.italic = toggle(e),
            b"rStyle" if self.in_rpr => match attr(e, b"val").as_deref() {
                Some("Strong") => self.bold = true,
                Some("Emphasis") => self.italic = true,
                _ => {}
            },
            b"t" if self.in_run => self.in_text = true,
            b"tab" if self.in_run => self.push_text(" "),
            b"br" | b"cr" if self.in_run => {
                if attr(e, b"type").as_deref() != Some("page") {
                    self.push(Inline::Break);
                }
            }
            b"blip" => {
                if let Some(rel_id) = attr(e, b"embed") {
                    let link = self.link.clone();
                    self.push(Inline::Image { rel_id, link });
                }
            }
            b"imagedata" => {
                if let Some(rel_id) = attr(e, b"id") {
                    let link = self.link.clone();
                    self.push(Inline::Image { rel_id, link });
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, local: &[u8]) {
        match local {
            b"p" => {
                self.p_depth = self.p_depth.saturating_sub(1);
                if self.p_depth == 0 {
                    if let Some(mut p) = self.current.take() {
                        p.numbering = self
                            .num_id
                            .take()
                            .filter(|id| id != "0")
                            .map(|id| (id, self.ilvl));
                        self.paragraphs.push(p);
                    }
                }
            }
            b"pPr" => self.in_ppr = false,
            b"hyperlink" => self.link = None,
            b"r" => {
                self.in_run = false;
                self.in_rpr = false;
            }
            b"rPr" => self.in_rpr = false,
            b"t" => self.in_text = false,
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        let inline = Inline::Text {
            text: text.to_string(),
            bold: self.bold,
            italic: self.italic,
            link: self.link.clone(),
        };
        self.push(inline);
    }

    fn push(&mut self, inline: Inline) {
        if let Some(p) = self.current.as_mut() {
            p.inlines.push(inline);
        }
    }
}

/// Paragraphs of `word/document.xml` in document order. Paragraphs nested
/// in text boxes are merged into their host paragraph.
pub fn parse_body(xml: &str) -> Result<Vec<Paragraph>> {
    let mut reader = Reader::from_str(xml);
    let mut state = BodyState::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => state.open(&e),
            Ok(Event::Empty(e)) => {
                state.open(&e);
                state.close(e.local_name().as_ref());
            }
            Ok(Event::Text(e)) if state.in_text => {
                let text = e.unescape()?;
                state.push_text(&text);
            }
            Ok(Event::End(e)) => state.close(e.local_name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(state.paragraphs)
}

/// `word/_rels/document.xml.rels`: relationship id → target.
pub fn parse_relationships(xml: &str) -> Result<HashMap<String, Relationship>> {
    let mut reader = Reader::from_str(xml);
    let mut rels = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) = (attr(&e, b"Id"), attr(&e, b"Target")) {
                    let is_image = attr(&e, b"Type").is_some_and(|t| t.ends_with("/image"));
                    rels.insert(id, Relationship { target, is_image });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

/// `word/numbering.xml`.
pub fn parse_numbering(xml: &str) -> Result<Numbering> {
    let mut reader = Reader::from_str(xml);
    let mut numbering = Numbering::default();
    let mut abstract_id: Option<String> = None;
    let mut level: Option<u8> = None;
    let mut num_id: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"abstractNum" => abstract_id = attr(&e, b"abstractNumId"),
                b"lvl" => level = attr(&e, b"ilvl").and_then(|v| v.parse().ok()),
                b"numFmt" => {
                    if let (Some(abs), Some(lvl), Some(fmt)) =
                        (abstract_id.as_ref(), level, attr(&e, b"val"))
                    {
                        numbering
                            .formats
                            .entry(abs.clone())
                            .or_default()
                            .insert(lvl, fmt);
                    }
                }
                b"num" => num_id = attr(&e, b"numId"),
                b"abstractNumId" => {
                    if let (Some(num), Some(abs)) = (num_id.as_ref(), attr(&e, b"val")) {
                        numbering.nums.insert(num.clone(), abs);
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"abstractNum" => abstract_id = None,
                b"lvl" => level = None,
                b"num" => num_id = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(numbering)
}

/// `word/styles.xml`: style id → display name.
pub fn parse_styles(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut styles = HashMap::new();
    let mut style_id: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"style" => style_id = attr(&e, b"styleId"),
                b"name" => {
                    if let (Some(id), Some(name)) = (style_id.as_ref(), attr(&e, b"val")) {
                        styles.insert(id.clone(), name);
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"style" => style_id = None,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(styles)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<w:body>
<w:p><w:pPr><w:pStyle w:val="Heading2"/><w:rPr><w:b/></w:rPr></w:pPr><w:r><w:t>Spotlight</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Hello </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>World</w:t></w:r><w:r><w:rPr><w:i w:val="0"/></w:rPr><w:t xml:space="preserve"> &amp; co</w:t></w:r></w:p>
<w:p><w:hyperlink r:id="rId9"><w:r><w:t>link</w:t></w:r></w:hyperlink><w:r><w:br/><w:t>after</w:t></w:r></w:p>
<w:p><w:pPr><w:numPr><w:ilvl w:val="1"/><w:numId w:val="3"/></w:numPr></w:pPr><w:r><w:t>Item</w:t></w:r></w:p>
<w:p/>
</w:body>
</w:document>"#;

    #[test]
    fn body_paragraphs() {
        let paras = parse_body(BODY).unwrap();
        assert_eq!(paras.len(), 5);
        assert_eq!(paras[0].style.as_deref(), Some("Heading2"));
        assert_eq!(
            paras[0].inlines,
            vec![Inline::Text {
                text: "Spotlight".into(),
                bold: false,
                italic: false,
                link: None
            }]
        );
        assert_eq!(
            paras[1].inlines[1],
            Inline::Text {
                text: "World".into(),
                bold: true,
                italic: false,
                link: None
            }
        );
        assert!(matches!(&paras[1].inlines[2], Inline::Text { text, italic: false, .. } if text == " & co"));
        assert_eq!(paras[2].inlines[0].link(), Some("rId9"));
        assert_eq!(paras[2].inlines[1], Inline::Break);
        assert_eq!(paras[2].inlines[2].link(), None);
        assert_eq!(paras[3].numbering, Some(("3".to_string(), 1)));
        assert!(paras[4].inlines.is_empty());
    }

    #[test]
    fn relationships() {
        let xml = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.org/?a=1&amp;b=2" TargetMode="External"/>
<Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
</Relationships>"#;
        let rels = parse_relationships(xml).unwrap();
        assert_eq!(rels["rId9"].target, "https://example.org/?a=1&b=2");
        assert!(!rels["rId9"].is_image);
        assert!(rels["rId4"].is_image);
    }

    #[test]
    fn numbering_formats() {
        let xml = r#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/></w:lvl></w:abstractNum>
<w:abstractNum w:abstractNumId="1"><w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl><w:lvl w:ilvl="1"><w:numFmt w:val="bullet"/></w:lvl></w:abstractNum>
<w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
<w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>
</w:numbering>"#;
        let n = parse_numbering(xml).unwrap();
        assert!(!n.is_ordered("1", 0));
        assert!(n.is_ordered("2", 0));
        assert!(!n.is_ordered("2", 1));
        assert!(!n.is_ordered("9", 0));
    }

    #[test]
    fn style_names() {
        let xml = r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:style w:type="paragraph" w:styleId="berschrift1"><w:name w:val="heading 1"/></w:style>
<w:style w:type="paragraph" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
</w:styles>"#;
        let styles = parse_styles(xml).unwrap();
        assert_eq!(styles["berschrift1"], "heading 1");
        assert_eq!(styles.len(), 2);
    }
}
