use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tracing::warn;

use crate::error::BuildError;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{%\s*([A-Za-z0-9_]+)\s*%\}\}").unwrap());

/// Result of one substitution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub output: String,
    /// Tokens found in the template with no supplied value (replaced by "").
    pub missing: Vec<String>,
    /// Supplied values whose token never appears in the template.
    pub unused: Vec<String>,
}

/// Replace every `{{%NAME%}}` in one pass. Inserted text is never scanned
/// again, so tokens inside values survive verbatim.
pub fn substitute(template: &str, values: &HashMap<&str, String>) -> Substitution {
    let mut seen = BTreeSet::new();
    let mut missing = BTreeSet::new();

    let output = TOKEN_RE
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            seen.insert(name.to_string());
            match values.get(name) {
                Some(v) => v.clone(),
                None => {
                    missing.insert(name.to_string());
                    String::new()
                }
            }
        })
        .into_owned();

    let mut unused: Vec<String> = values
        .keys()
        .filter(|k| !seen.contains(**k))
        .map(|k| k.to_string())
        .collect();
    unused.sort();

    Substitution {
        output,
        missing: missing.into_iter().collect(),
        unused,
    }
}

/// A markup template loaded from disk.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    source: String,
}

impl Template {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Load a required template; a missing file is fatal.
    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(BuildError::MissingTemplate(path.to_path_buf()).into());
        }
        let source = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read template {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, source))
    }

    pub fn tokens(&self) -> BTreeSet<String> {
        TOKEN_RE
            .captures_iter(&self.source)
            .map(|c| c[1].to_string())
            .collect()
    }

    pub fn has_token(&self, name: &str) -> bool {
        TOKEN_RE.captures_iter(&self.source).any(|c| &c[1] == name)
    }

    /// Substitute `values`, logging tokens left without a value and values
    /// the template never asks for.
    pub fn fill(&self, values: &HashMap<&str, String>) -> String {
        let result = substitute(&self.source, values);
        for token in &result.missing {
            warn!(template = %self.name, token = %token, "No value for token, left empty");
        }
        for token in &result.unused {
            warn!(template = %self.name, token = %token, "Token not found in template");
        }
        result.output
    }
}
