//! Downloadable HTML files.

use serde::{Deserialize, Serialize};

use crate::generator::{generate, LayoutMode};
use crate::Template;

/// A rendered template ready to be saved to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFile {
    /// Suggested file name, always ending in `.html`.
    pub file_name: String,
    /// Complete HTML document.
    pub html: String,
}

/// File name for a template: lower-cased, whitespace runs replaced by `-`.
///
/// A blank name falls back to `template.html`.
#[must_use]
pub fn export_file_name(name: &str) -> String {
    let stem = name.split_whitespace().collect::<Vec<_>>().join("-");
    if stem.is_empty() {
        return "template.html".to_string();
    }
    format!("{}.html", stem.to_lowercase())
}

/// Render `template` in `mode` and name the file after `name`.
#[must_use]
pub fn export(name: &str, template: &Template, mode: LayoutMode) -> ExportedFile {
    ExportedFile {
        file_name: export_file_name(name),
        html: generate(template, mode),
    }
}
