//! Tool catalog loading
//!
//! A catalog is a JSON or YAML document holding the prompt entries that
//! drive every trial. It is either a bare list of entries or an object with
//! the list under `tools` (or `catalog`), optionally alongside `id`,
//! `entries` and `merge_size` metadata used only for output naming.
//!
//! ```json
//! {
//!   "id": 211,
//!   "entries": 2,
//!   "merge_size": 1,
//!   "tools": [
//!     { "tools": ["add_two_numbers"], "prompt": "Add 2 and 3." },
//!     { "tools": ["get_weather"], "prompt": "What's the weather in Oslo?" }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::backend::ToolDeclaration;
use crate::bail_entry;
use crate::error::{BenchError, Result};
use crate::paths::safe_component;

/// Top-level fields that may hold the entry list
pub const LIST_FIELDS: [&str; 2] = ["tools", "catalog"];

/// Source encodings a catalog can be read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Json,
    Yaml,
}

impl CatalogFormat {
    /// Pick the format from a file extension (`.yaml`/`.yml`, else JSON)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                CatalogFormat::Yaml
            }
            _ => CatalogFormat::Json,
        }
    }
}

/// A single trial definition. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCatalogEntry {
    tools: Vec<String>,
    prompt: String,
    trial_key: String,
}

impl ToolCatalogEntry {
    /// Expected tool identifiers, in catalog order
    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Reporting label derived from the tool identifiers
    pub fn trial_key(&self) -> &str {
        &self.trial_key
    }
}

/// Optional catalog-level metadata, kept verbatim as text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogMetadata {
    pub id: Option<String>,
    pub entries: Option<String>,
    pub merge_size: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<ToolCatalogEntry>,
    metadata: CatalogMetadata,
    digest: String,
}

impl Catalog {
    pub fn entries(&self) -> &[ToolCatalogEntry] {
        &self.entries
    }

    pub fn metadata(&self) -> &CatalogMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hex SHA-256 of the catalog source
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Replace the catalog identifier, e.g. to separate repeated runs
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.id = Some(id.into());
        self
    }

    /// Every tool named anywhere in the catalog, first occurrence order
    pub fn declared_tools(&self) -> Vec<ToolDeclaration> {
        let mut seen = std::collections::HashSet::new();
        self.entries
            .iter()
            .flat_map(|e| e.tools.iter())
            .filter(|name| seen.insert(name.as_str()))
            .map(|name| ToolDeclaration::new(name.as_str()))
            .collect()
    }

    /// Identity used in output file names, with fallbacks for absent metadata.
    ///
    /// Every part is reduced to file-name-safe characters so an identity can
    /// never point outside the data directory.
    pub fn identity(&self) -> CatalogIdentity {
        let entries = self
            .metadata
            .entries
            .clone()
            .unwrap_or_else(|| self.entries.len().to_string());
        let merge_size = self.metadata.merge_size.clone().unwrap_or_else(|| {
            self.entries
                .iter()
                .map(|e| e.tools.len())
                .max()
                .unwrap_or(0)
                .to_string()
        });
        let id = self
            .metadata
            .id
            .clone()
            .unwrap_or_else(|| self.digest.chars().take(8).collect());

        CatalogIdentity {
            entries: safe_component(&entries),
            merge_size: safe_component(&merge_size),
            id: safe_component(&id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIdentity {
    pub entries: String,
    pub merge_size: String,
    pub id: String,
}

impl std::fmt::Display for CatalogIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "size{}_merge{}_id{}",
            self.entries, self.merge_size, self.id
        )
    }
}

/// Load a catalog from a file, choosing the format by extension
pub fn load(path: &Path) -> Result<Catalog> {
    if !path.exists() {
        return Err(BenchError::not_found("catalog", path.display()));
    }
    let source = std::fs::read_to_string(path)?;
    let catalog = parse(&source, CatalogFormat::from_path(path))?;
    tracing::info!(
        path = %path.display(),
        entries = catalog.len(),
        identity = %catalog.identity(),
        "catalog_loaded"
    );
    Ok(catalog)
}

/// Parse a catalog document
pub fn parse(source: &str, format: CatalogFormat) -> Result<Catalog> {
    let document: Value = match format {
        CatalogFormat::Json => serde_json::from_str(source)
            .map_err(|e| BenchError::malformed_document(format!("invalid JSON: {}", e)))?,
        CatalogFormat::Yaml => serde_yaml::from_str(source)
            .map_err(|e| BenchError::malformed_document(format!("invalid YAML: {}", e)))?,
    };

    let (list, metadata) = match &document {
        Value::Array(list) => (list, CatalogMetadata::default()),
        Value::Object(map) => {
            let list = LIST_FIELDS
                .iter()
                .find_map(|field| map.get(*field).and_then(|v| v.as_array()))
                .ok_or_else(|| {
                    BenchError::malformed_document(format!(
                        "expected a list of entries or an object with a '{}' list",
                        LIST_FIELDS.join("' or '")
                    ))
                })?;
            let metadata = CatalogMetadata {
                id: scalar_text(map.get("id")),
                entries: scalar_text(map.get("entries")),
                merge_size: scalar_text(map.get("merge_size")),
            };
            (list, metadata)
        }
        _ => {
            return Err(BenchError::malformed_document(
                "expected a list of entries or an object",
            ))
        }
    };

    let mut entries = Vec::with_capacity(list.len());
    let mut key_counts: HashMap<String, usize> = HashMap::new();
    for (index, node) in list.iter().enumerate() {
        let (tools, prompt) = parse_entry(index, node)?;
        let base_key = trial_key(&tools);
        let count = key_counts.entry(base_key.clone()).or_insert(0);
        *count += 1;
        let trial_key = if *count == 1 {
            base_key
        } else {
            format!("{}#{}", base_key, count)
        };
        entries.push(ToolCatalogEntry {
            tools,
            prompt,
            trial_key,
        });
    }

    Ok(Catalog {
        entries,
        metadata,
        digest: hex::encode(Sha256::digest(source.as_bytes())),
    })
}

fn parse_entry(index: usize, node: &Value) -> Result<(Vec<String>, String)> {
    let Some(map) = node.as_object() else {
        bail_entry!(index, "entry must be an object");
    };

    let tools = match map.get("tools").and_then(|t| t.as_array()) {
        Some(tools) if !tools.is_empty() => tools,
        Some(_) => bail_entry!(index, "'tools' must not be empty"),
        None => bail_entry!(index, "missing 'tools' list"),
    };

    let mut names = Vec::with_capacity(tools.len());
    for tool in tools {
        match tool.as_str() {
            Some(name) if !name.trim().is_empty() => names.push(name.to_string()),
            _ => bail_entry!(index, "tool names must be non-blank strings"),
        }
    }

    let prompt = match map.get("prompt").and_then(|p| p.as_str()) {
        Some(prompt) if !prompt.trim().is_empty() => prompt.to_string(),
        _ => bail_entry!(index, "missing or blank 'prompt'"),
    };

    Ok((names, prompt))
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Camel-case join of tool identifiers.
///
/// Non-alphanumeric characters separate words; the first character is
/// lower-cased and the first character after a separator upper-cased.
pub fn trial_key(tools: &[String]) -> String {
    let combined = tools.join("_");
    let mut key = String::with_capacity(combined.len());
    let mut capitalize_next = false;
    for c in combined.chars() {
        if !c.is_alphanumeric() {
            capitalize_next = true;
            continue;
        }
        if key.is_empty() {
            key.extend(c.to_lowercase());
        } else if capitalize_next {
            key.extend(c.to_uppercase());
        } else {
            key.push(c);
        }
        capitalize_next = false;
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_bare_list() {
        let catalog = parse(
            r#"[{"tools": ["add_two_numbers"], "prompt": "add 2 and 3"}]"#,
            CatalogFormat::Json,
        )
        .unwrap();

        assert_eq!(catalog.len(), 1);
        let entry = &catalog.entries()[0];
        assert_eq!(entry.tools(), &["add_two_numbers".to_string()]);
        assert_eq!(entry.prompt(), "add 2 and 3");
        assert_eq!(entry.trial_key(), "addTwoNumbers");
        assert_eq!(catalog.metadata(), &CatalogMetadata::default());
    }

    #[test]
    fn test_parse_object_with_metadata() {
        let catalog = parse(
            r#"{"id": 211, "entries": "2", "merge_size": 1,
                "tools": [
                  {"tools": ["a"], "prompt": "do a"},
                  {"tools": ["b", "c"], "prompt": "do b and c"}
                ]}"#,
            CatalogFormat::Json,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.metadata().id.as_deref(), Some("211"));
        assert_eq!(catalog.metadata().entries.as_deref(), Some("2"));
        assert_eq!(catalog.metadata().merge_size.as_deref(), Some("1"));
        assert_eq!(catalog.identity().to_string(), "size2_merge1_id211");
    }

    #[test]
    fn test_parse_yaml() {
        let catalog = parse(
            "catalog:\n  - tools: [get_weather]\n    prompt: Weather in Oslo?\n",
            CatalogFormat::Yaml,
        )
        .unwrap();
        assert_eq!(catalog.entries()[0].trial_key(), "getWeather");
    }

    #[test]
    fn test_identity_fallbacks() {
        let source = r#"[{"tools": ["a", "b"], "prompt": "x"}, {"tools": ["c"], "prompt": "y"}]"#;
        let catalog = parse(source, CatalogFormat::Json).unwrap();
        let identity = catalog.identity();
        assert_eq!(identity.entries, "2");
        assert_eq!(identity.merge_size, "2");
        assert_eq!(identity.id.len(), 8);
        assert!(catalog.digest().starts_with(&identity.id));

        let overridden = catalog.with_id("7");
        assert_eq!(overridden.identity().to_string(), "size2_merge2_id7");
    }

    #[test]
    fn test_identity_parts_are_file_name_safe() {
        let source = r#"{"id": "x/../../escaped", "entries": "1 of 2", "merge_size": 1,
            "tools": [{"tools": ["a"], "prompt": "x"}]}"#;
        let catalog = parse(source, CatalogFormat::Json).unwrap();
        assert_eq!(
            catalog.identity().to_string(),
            "size1-of-2_merge1_idx-..-..-escaped"
        );

        let overridden = catalog.with_id("run/7_b");
        assert_eq!(overridden.identity().id, "run-7-b");
    }

    #[test]
    fn test_rejects_scalar_document() {
        let err = parse("42", CatalogFormat::Json).unwrap_err();
        assert!(matches!(err, BenchError::MalformedCatalog { index: None, .. }));
    }

    #[test]
    fn test_rejects_object_without_list() {
        let err = parse(r#"{"id": 1, "items": []}"#, CatalogFormat::Json).unwrap_err();
        assert!(matches!(err, BenchError::MalformedCatalog { index: None, .. }));
    }

    #[test]
    fn test_rejects_invalid_json() {
        let err = parse("{not json", CatalogFormat::Json).unwrap_err();
        assert!(matches!(err, BenchError::MalformedCatalog { index: None, .. }));
    }

    #[test]
    fn test_rejects_empty_tool_list_with_index() {
        let err = parse(
            r#"[{"tools": ["a"], "prompt": "ok"}, {"tools": [], "prompt": "bad"}]"#,
            CatalogFormat::Json,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BenchError::MalformedCatalog { index: Some(1), .. }
        ));
    }

    #[test]
    fn test_rejects_blank_tool_name() {
        let err = parse(r#"[{"tools": ["a", "  "], "prompt": "p"}]"#, CatalogFormat::Json)
            .unwrap_err();
        assert!(matches!(
            err,
            BenchError::MalformedCatalog { index: Some(0), .. }
        ));
    }

    #[test]
    fn test_rejects_non_string_tool_name() {
        let err = parse(r#"[{"tools": [5], "prompt": "p"}]"#, CatalogFormat::Json).unwrap_err();
        assert!(matches!(err, BenchError::MalformedCatalog { .. }));
    }

    #[test]
    fn test_rejects_blank_prompt() {
        let err = parse(
            r#"[{"tools": ["a"], "prompt": "ok"}, {"tools": ["b"], "prompt": "ok"}, {"tools": ["c"], "prompt": " "}]"#,
            CatalogFormat::Json,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BenchError::MalformedCatalog { index: Some(2), .. }
        ));
    }

    #[test]
    fn test_rejects_missing_prompt() {
        let err = parse(r#"[{"tools": ["a"]}]"#, CatalogFormat::Json).unwrap_err();
        assert!(err.to_string().contains("entry 0"));
    }

    #[test]
    fn test_trial_key() {
        assert_eq!(trial_key(&names(&["add_two_numbers"])), "addTwoNumbers");
        assert_eq!(trial_key(&names(&["Get-Weather", "send_email"])), "getWeatherSendEmail");
        assert_eq!(trial_key(&names(&["__x"])), "x");
    }

    #[test]
    fn test_duplicate_trial_keys_are_suffixed() {
        let catalog = parse(
            r#"[{"tools": ["a_b"], "prompt": "1"}, {"tools": ["aB"], "prompt": "2"}, {"tools": ["a-b"], "prompt": "3"}]"#,
            CatalogFormat::Json,
        )
        .unwrap();
        let keys: Vec<_> = catalog.entries().iter().map(|e| e.trial_key()).collect();
        assert_eq!(keys, vec!["aB", "aB#2", "aB#3"]);
    }

    #[test]
    fn test_declared_tools_are_unique_in_first_seen_order() {
        let catalog = parse(
            r#"[{"tools": ["b", "a"], "prompt": "1"}, {"tools": ["a", "c"], "prompt": "2"}]"#,
            CatalogFormat::Json,
        )
        .unwrap();
        let declared: Vec<_> = catalog
            .declared_tools()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(declared, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_duplicate_expected_names_are_kept() {
        let catalog = parse(r#"[{"tools": ["a", "a"], "prompt": "twice"}]"#, CatalogFormat::Json)
            .unwrap();
        assert_eq!(catalog.entries()[0].tools().len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, BenchError::NotFound { .. }));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(CatalogFormat::from_path(Path::new("c.yml")), CatalogFormat::Yaml);
        assert_eq!(CatalogFormat::from_path(Path::new("c.YAML")), CatalogFormat::Yaml);
        assert_eq!(CatalogFormat::from_path(Path::new("c.json")), CatalogFormat::Json);
        assert_eq!(CatalogFormat::from_path(Path::new("c")), CatalogFormat::Json);
    }
}
