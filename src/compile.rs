use anyhow::Result;
use mrml::prelude::render::RenderOptions;
use tracing::warn;

use crate::error::BuildError;

/// Compile filled MJML markup to email HTML. Parser warnings are logged and
/// do not block output.
pub fn compile(markup: &str) -> Result<String> {
    let parsed = mrml::parse(markup).map_err(|e| BuildError::Compile(e.to_string()))?;
    for warning in &parsed.warnings {
        warn!("MJML warning: {:?}", warning);
    }
    let html = parsed
        .element
        .render(&RenderOptions::default())
        .map_err(|e| BuildError::Compile(e.to_string()))?;
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_minimal_document() {
        let html = compile(
            "<mjml><mj-body><mj-section><mj-column><mj-text>Hello</mj-text></mj-column></mj-section></mj-body></mjml>",
        )
        .unwrap();
        assert!(html.contains("Hello"));
        assert!(html.contains("<!doctype html>") || html.contains("<!DOCTYPE html>"));
    }

    #[test]
    fn rejects_non_mjml() {
        let err = compile("<div>not mjml").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::Compile(_))
        ));
    }
}
