pub mod blocks;
pub mod sections;

use crate::sanitize::LinkStyle;
use blocks::Block;
use sections::{Section, SectionRule};

/// Two-pass extraction: document HTML → blocks, then one walk per rule.
pub fn extract_all<'r>(
    html: &str,
    rules: impl IntoIterator<Item = &'r SectionRule>,
    link: &LinkStyle,
) -> Vec<Vec<Section>> {
    let blocks: Vec<Block> = blocks::classify_document(html);
    rules
        .into_iter()
        .map(|rule| sections::extract(&blocks, rule, link))
        .collect()
}
