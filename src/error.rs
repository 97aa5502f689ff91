use std::path::PathBuf;

use thiserror::Error;

/// Conditions that abort a build before any output is written.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("input path {} does not match <{root}>/<newsletter>/<year>/<month>/<file>: {reason}", .path.display())]
    MalformedPath {
        path: PathBuf,
        root: String,
        reason: String,
    },

    #[error("unknown newsletter '{slug}' (expected one of: {known})")]
    UnknownNewsletter { slug: String, known: String },

    #[error("required template not found: {}", .0.display())]
    MissingTemplate(PathBuf),

    #[error("document conversion failed: {0}")]
    Conversion(String),

    #[error("MJML compilation failed: {0}")]
    Compile(String),
}
