//! Catalog document loading with format detection.

use std::{fs, path::Path};

use anyhow::{Context, Result};

use crate::models::CapabilityCatalog;

/// Load a capability catalog from a JSON or YAML file.
///
/// The format is chosen by file extension: `.json` parses as JSON, anything
/// else as YAML (which also accepts JSON). The catalog is validated for
/// duplicate identifiers before being returned.
pub fn load_catalog_file(path: impl AsRef<Path>) -> Result<CapabilityCatalog> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    let catalog: CapabilityCatalog = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content).with_context(|| format!("invalid JSON catalog: {}", path.display()))?,
        _ => serde_yaml::from_str(&content).with_context(|| format!("invalid YAML catalog: {}", path.display()))?,
    };

    catalog
        .ensure_unique_identifiers()
        .map_err(|reason| anyhow::anyhow!("invalid catalog {}: {}", path.display(), reason))?;

    tracing::debug!(
        path = %path.display(),
        capabilities = catalog.capabilities.len(),
        "loaded capability catalog"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON_CATALOG: &str = r#"{
        "capabilities": [
            {
                "capability_id": "x_crawler",
                "operations": [
                    {"operation_id": "fetch_posts", "return_type": "sequence-of-record"}
                ]
            }
        ]
    }"#;

    const YAML_CATALOG: &str = r#"
capabilities:
  - capability_id: x_crawler
    operations:
      - operation_id: fetch_posts
        return_type: sequence-of-record
"#;

    #[test]
    fn loads_json_catalog_by_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        fs::write(&path, JSON_CATALOG).expect("write catalog");

        let catalog = load_catalog_file(&path).expect("load catalog");
        assert!(catalog.capability("x_crawler").is_some());
    }

    #[test]
    fn loads_yaml_catalog_by_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.yaml");
        fs::write(&path, YAML_CATALOG).expect("write catalog");

        let catalog = load_catalog_file(&path).expect("load catalog");
        let capability = catalog.capability("x_crawler").expect("capability present");
        assert_eq!(capability.operations[0].operation_id, "fetch_posts");
    }

    #[test]
    fn missing_file_reports_path() {
        let error = load_catalog_file("does/not/exist.yaml").expect_err("missing file should fail");
        assert!(error.to_string().contains("does/not/exist.yaml"), "unexpected error: {error}");
    }

    #[test]
    fn duplicate_identifiers_fail_loading() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        let duplicated = r#"{
            "capabilities": [
                {"capability_id": "x_crawler", "operations": []},
                {"capability_id": "x_crawler", "operations": []}
            ]
        }"#;
        fs::write(&path, duplicated).expect("write catalog");

        let error = load_catalog_file(&path).expect_err("duplicates should fail");
        assert!(error.to_string().contains("duplicate capability identifier"), "unexpected error: {error}");
    }
}
