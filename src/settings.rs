use std::path::PathBuf;

use anyhow::Result;
use config::{Config, Environment};
use serde::Deserialize;

/// Directory layout, overridable with `NEWSLETTER_*` environment variables
/// (`NEWSLETTER_OUTPUT_ROOT=/tmp/out`) and then CLI flags.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Name of the folder that holds `<newsletter>/<year>/<month>/<file>`.
    pub input_root: String,
    pub output_root: PathBuf,
    pub template_root: PathBuf,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("input_root", "documents")?
            .set_default("output_root", "dist")?
            .set_default("template_root", "templates")?
            .add_source(Environment::with_prefix("NEWSLETTER"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::load().unwrap();
        if std::env::var_os("NEWSLETTER_INPUT_ROOT").is_none() {
            assert_eq!(s.input_root, "documents");
        }
        if std::env::var_os("NEWSLETTER_TEMPLATE_ROOT").is_none() {
            assert_eq!(s.template_root, PathBuf::from("templates"));
        }
    }
}
