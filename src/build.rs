//! One build: validate → convert → extract → render → substitute → compile → write.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::error::BuildError;
use crate::job::BuildJob;
use crate::newsletter::{self, Brand, Newsletter};
use crate::parser;
use crate::render::{self, template::Template};
use crate::settings::Settings;
use crate::text::escape_html;
use crate::{compile, convert};

const LAYOUT: &str = "layout.mjml";

#[derive(Debug)]
pub struct BuildOutput {
    pub markup_path: PathBuf,
    pub html_path: PathBuf,
    /// (token, sections extracted) per configured section.
    pub counts: Vec<(&'static str, usize)>,
}

/// Templates of one newsletter, all loaded before conversion starts.
pub struct Templates {
    pub layout: Template,
    pub wrappers: HashMap<&'static str, Template>,
}

impl Templates {
    pub async fn load(newsletter: &Newsletter, dir: &Path) -> Result<Self> {
        let layout = Template::load(&dir.join(LAYOUT)).await?;
        debug!(template = %layout.name, tokens = ?layout.tokens(), "Loaded layout");
        for spec in &newsletter.sections {
            if !layout.has_token(spec.token) {
                warn!(token = spec.token, "Layout has no placeholder for section");
            }
        }
        let mut wrappers = HashMap::new();
        for name in newsletter.sections.iter().filter_map(|s| s.wrapper) {
            wrappers.insert(name, Template::load(&dir.join(name)).await?);
        }
        Ok(Self { layout, wrappers })
    }
}

pub async fn run(input: &Path, settings: &Settings) -> Result<BuildOutput> {
    let job = BuildJob::from_input(input, &settings.input_root)?;
    let newsletter = newsletter::lookup(&job.slug).ok_or_else(|| BuildError::UnknownNewsletter {
        slug: job.slug.clone(),
        known: newsletter::SLUGS.join(", "),
    })?;
    if !tokio::fs::try_exists(input).await.unwrap_or(false) {
        return Err(BuildError::MissingInput(input.to_path_buf()).into());
    }
    info!(newsletter = newsletter.name, edition = %job.edition_label(), "Building {}", input.display());

    let templates = Templates::load(&newsletter, &settings.template_root.join(newsletter.slug)).await?;
    let html = convert::to_html(input).await?;

    let (markup, counts) = assemble(&newsletter, &templates, &html, &job);
    let compiled = compile::compile(&markup)?;

    let (markup_path, html_path) = job.output_paths(&settings.output_root);
    if let Some(dir) = markup_path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    write_outputs(&[
        (html_path.as_path(), compiled.as_str()),
        (markup_path.as_path(), markup.as_str()),
    ])
    .await?;

    Ok(BuildOutput {
        markup_path,
        html_path,
        counts,
    })
}

/// Write every output to a `.tmp` sibling, then rename them into place in
/// order. On any failure the staged files and the outputs already renamed
/// are removed, so a run never leaves a partial set behind.
async fn write_outputs(outputs: &[(&Path, &str)]) -> Result<()> {
    let staged: Vec<PathBuf> = outputs.iter().map(|(path, _)| staging_path(path)).collect();
    let mut placed = 0;

    let result: Result<()> = async {
        for ((path, contents), tmp) in outputs.iter().zip(&staged) {
            tokio::fs::write(tmp, contents)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        for ((path, _), tmp) in outputs.iter().zip(&staged) {
            tokio::fs::rename(tmp, path)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            placed += 1;
        }
        Ok(())
    }
    .await;

    if result.is_err() {
        for tmp in &staged {
            let _ = tokio::fs::remove_file(tmp).await;
        }
        for (path, _) in &outputs[..placed] {
            warn!("Removing partial output {}", path.display());
            let _ = tokio::fs::remove_file(path).await;
        }
    }
    result
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Fill `template` with `values` plus whichever brand tokens it declares.
fn fill_branded(template: &Template, mut values: HashMap<&'static str, String>, brand: &Brand) -> String {
    for (token, value) in brand.template_values() {
        if template.has_token(token) {
            values.insert(token, value);
        }
    }
    template.fill(&values)
}

/// Extract every configured section from `html`, render it and fill the
/// layout. Sections missing from the document become empty strings.
pub fn assemble(
    newsletter: &Newsletter,
    templates: &Templates,
    html: &str,
    job: &BuildJob,
) -> (String, Vec<(&'static str, usize)>) {
    let link = newsletter.brand.link_style();
    let extracted = parser::extract_all(html, newsletter.sections.iter().map(|s| &s.rule), &link);

    let mut values: HashMap<&'static str, String> = HashMap::new();
    values.insert("NEWSLETTER", escape_html(newsletter.name));
    values.insert("EDITION", escape_html(&job.edition_label()));
    values.insert("YEAR", job.year.clone());

    let mut counts = Vec::with_capacity(newsletter.sections.len());
    for (spec, sections) in newsletter.sections.iter().zip(&extracted) {
        if sections.is_empty() {
            warn!(token = spec.token, "Section not found in document, omitting");
        } else {
            let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
            info!(token = spec.token, count = sections.len(), ?titles, "Extracted section");
        }
        counts.push((spec.token, sections.len()));

        let fragment = render::render(spec.render, sections, &newsletter.brand);
        let fragment = match spec.wrapper.and_then(|w| templates.wrappers.get(w)) {
            Some(wrapper) if !fragment.is_empty() => {
                fill_branded(wrapper, HashMap::from([("ROWS", fragment)]), &newsletter.brand)
            }
            _ => fragment,
        };
        values.insert(spec.token, fragment);
    }

    (fill_branded(&templates.layout, values, &newsletter.brand), counts)
}
