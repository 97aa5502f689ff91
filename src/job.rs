use std::path::{Component, Path, PathBuf};

use crate::error::BuildError;

const MONTHS: &[&str] = &[
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// A validated input path: `<root>/<newsletter>/<year>/<month>/<file>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob {
    pub slug: String,
    pub year: String,
    /// Month segment as written in the path.
    pub month: String,
    pub month_number: u8,
    pub stem: String,
}

impl BuildJob {
    pub fn from_input(path: &Path, input_root: &str) -> Result<Self, BuildError> {
        let malformed = |reason: &str| BuildError::MalformedPath {
            path: path.to_path_buf(),
            root: input_root.to_string(),
            reason: reason.to_string(),
        };

        let segments: Vec<&str> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();
        let n = segments.len();
        if n < 5 {
            return Err(malformed("expected at least five path segments"));
        }
        let [root, slug, year, month, file] = [
            segments[n - 5],
            segments[n - 4],
            segments[n - 3],
            segments[n - 2],
            segments[n - 1],
        ];

        if root != input_root {
            return Err(malformed(&format!("expected root folder '{}', found '{}'", input_root, root)));
        }
        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed(&format!("'{}' is not a four-digit year", year)));
        }
        let month_number = month_number(month)
            .ok_or_else(|| malformed(&format!("'{}' is not a month", month)))?;
        let stem = Path::new(file)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| malformed("missing file name"))?;

        Ok(Self {
            slug: slug.to_ascii_lowercase(),
            year: year.to_string(),
            month: month.to_string(),
            month_number,
            stem: stem.to_string(),
        })
    }

    /// e.g. `May 2024`.
    pub fn edition_label(&self) -> String {
        format!("{} {}", MONTHS[usize::from(self.month_number) - 1], self.year)
    }

    /// (substituted markup, compiled html) under `<output_root>/<newsletter>/<year>/<month>/`.
    pub fn output_paths(&self, output_root: &Path) -> (PathBuf, PathBuf) {
        let dir = output_root.join(&self.slug).join(&self.year).join(&self.month);
        (
            dir.join(format!("{}.mjml", self.stem)),
            dir.join(format!("{}.html", self.stem)),
        )
    }
}

/// `5`, `05`, `May` and `may` are all month 5.
fn month_number(segment: &str) -> Option<u8> {
    if let Ok(n) = segment.parse::<u8>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let lower = segment.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| {
            let m = m.to_ascii_lowercase();
            lower == m || (lower.len() == 3 && m.starts_with(&lower))
        })
        .map(|i| i as u8 + 1)
}
