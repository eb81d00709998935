use std::path::{Path, PathBuf};

use crate::catalog::CatalogIdentity;

/// Files owned by one model's run over one catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub log: PathBuf,
    pub summary: PathBuf,
}

impl OutputPaths {
    pub fn new(data_dir: &Path, model: &str, identity: &CatalogIdentity) -> Self {
        let stem = file_stem(model, identity);
        Self {
            log: data_dir.join(format!("{}.csv", stem)),
            summary: data_dir.join(format!("{}_summary.json", stem)),
        }
    }
}

/// `model_<model>_<identity>` with the model name made filesystem-safe
pub fn file_stem(model: &str, identity: &CatalogIdentity) -> String {
    format!("model_{}_{}", safe_name(model), identity)
}

/// Catalog identity part made safe for a file name.
///
/// Unlike [`safe_name`] this also replaces `_`, which separates the identity
/// parts and must not appear inside the id that `aggregate` groups on.
pub fn safe_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

pub fn safe_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
