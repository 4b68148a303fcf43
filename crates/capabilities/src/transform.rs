//! In-process record transformation capability.
//!
//! Crawled records are messy: blank fields, whitespace, duplicate entries.
//! This capability cleans a record sequence in place and produces a compact
//! summary of its shape, entirely without I/O. It doubles as the reference
//! implementation of a synchronous capability behind the async call contract.

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use std::collections::HashSet;

use socialflow_registry::Capability;

/// Operation that deduplicates and tidies a sequence of records.
pub const CLEAN_RECORDS: &str = "clean_records";
/// Operation that reports counts and field coverage for a record sequence.
pub const SUMMARIZE_RECORDS: &str = "summarize_records";

/// Pure record cleaning and summarising.
pub struct TransformCapability {
    capability_id: String,
}

impl TransformCapability {
    /// Create the capability under the identifier the catalog uses for it.
    pub fn new(capability_id: impl Into<String>) -> Self {
        Self {
            capability_id: capability_id.into(),
        }
    }

    /// Whether this capability can serve the named operation.
    pub fn supports(operation_id: &str) -> bool {
        matches!(operation_id, CLEAN_RECORDS | SUMMARIZE_RECORDS)
    }
}

#[async_trait]
impl Capability for TransformCapability {
    fn capability_id(&self) -> &str {
        &self.capability_id
    }

    async fn invoke(&self, operation_id: &str, arguments: IndexMap<String, Value>) -> Result<Value> {
        let records = arguments
            .get("records")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("operation '{operation_id}' requires a 'records' sequence argument"))?;

        match operation_id {
            CLEAN_RECORDS => Ok(Value::Array(clean_records(records))),
            SUMMARIZE_RECORDS => Ok(summarize_records(records)),
            other => bail!("operation '{other}' is not provided by '{}'", self.capability_id),
        }
    }
}

/// Drop empty and duplicate records and trim string fields.
///
/// Duplicates are detected by their `id` field when present, otherwise by
/// full value equality. Records that are not JSON objects pass through
/// untouched unless they are null or blank strings.
fn clean_records(records: &[Value]) -> Vec<Value> {
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_values: HashSet<String> = HashSet::new();
    let mut cleaned = Vec::with_capacity(records.len());

    for record in records {
        let record = match record {
            Value::Null => continue,
            Value::String(text) if text.trim().is_empty() => continue,
            Value::Object(fields) => {
                let tidied = tidy_fields(fields);
                if tidied.is_empty() {
                    continue;
                }
                Value::Object(tidied)
            }
            other => other.clone(),
        };

        let duplicate = match record.get("id") {
            Some(id) => !seen_ids.insert(id.to_string()),
            None => !seen_values.insert(record.to_string()),
        };
        if duplicate {
            continue;
        }
        cleaned.push(record);
    }
    cleaned
}

fn tidy_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|(name, value)| match value {
            Value::Null => None,
            Value::String(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some((name.clone(), Value::String(trimmed.to_string())))
                }
            }
            other => Some((name.clone(), other.clone())),
        })
        .collect()
}

/// Report the record count and, for object records, how often each field
/// appears.
fn summarize_records(records: &[Value]) -> Value {
    let mut field_counts: IndexMap<String, u64> = IndexMap::new();
    for record in records {
        if let Value::Object(fields) = record {
            for name in fields.keys() {
                *field_counts.entry(name.clone()).or_insert(0) += 1;
            }
        }
    }

    json!({
        "count": records.len(),
        "fields": field_counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arguments(records: Value) -> IndexMap<String, Value> {
        let mut arguments = IndexMap::new();
        arguments.insert("records".to_string(), records);
        arguments
    }

    #[tokio::test]
    async fn clean_records_drops_empty_and_duplicate_entries() {
        let capability = TransformCapability::new("content_cleaner");
        let records = json!([
            {"id": 1, "caption": "  cat on keyboard  "},
            {"id": 1, "caption": "cat on keyboard"},
            {"id": 2, "caption": "", "likes": null},
            null,
            "   ",
            {"id": 3, "caption": "cat in box"}
        ]);

        let output = capability.invoke(CLEAN_RECORDS, arguments(records)).await.expect("invoke");
        let cleaned = output.as_array().expect("array output");
        assert_eq!(cleaned.len(), 3);
        assert_eq!(cleaned[0]["caption"], "cat on keyboard");
        // Record 2 lost its blank fields but kept its id.
        assert_eq!(cleaned[1], json!({"id": 2}));
        assert_eq!(cleaned[2]["id"], 3);
    }

    #[tokio::test]
    async fn clean_records_deduplicates_by_value_without_ids() {
        let capability = TransformCapability::new("content_cleaner");
        let records = json!(["a", "a", "b"]);

        let output = capability.invoke(CLEAN_RECORDS, arguments(records)).await.expect("invoke");
        assert_eq!(output, json!(["a", "b"]));
    }

    #[tokio::test]
    async fn summarize_records_counts_field_coverage() {
        let capability = TransformCapability::new("content_cleaner");
        let records = json!([
            {"id": 1, "caption": "x"},
            {"id": 2},
            "plain"
        ]);

        let output = capability.invoke(SUMMARIZE_RECORDS, arguments(records)).await.expect("invoke");
        assert_eq!(output["count"], 3);
        assert_eq!(output["fields"]["id"], 2);
        assert_eq!(output["fields"]["caption"], 1);
    }

    #[tokio::test]
    async fn missing_records_argument_is_an_error() {
        let capability = TransformCapability::new("content_cleaner");
        let error = capability.invoke(CLEAN_RECORDS, IndexMap::new()).await.expect_err("should fail");
        assert!(error.to_string().contains("records"), "unexpected error: {error}");
    }

    #[test]
    fn supports_reports_the_served_operations() {
        assert!(TransformCapability::supports(CLEAN_RECORDS));
        assert!(TransformCapability::supports(SUMMARIZE_RECORDS));
        assert!(!TransformCapability::supports("translate_records"));
    }

    #[tokio::test]
    async fn unknown_operation_is_an_error() {
        let capability = TransformCapability::new("content_cleaner");
        let error = capability
            .invoke("translate_records", arguments(json!([])))
            .await
            .expect_err("should fail");
        assert!(error.to_string().contains("translate_records"), "unexpected error: {error}");
    }
}
