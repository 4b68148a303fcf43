//! REST-backed capability.
//!
//! Serves every operation of a catalog descriptor that carries an HTTP
//! binding. GET and DELETE requests send their arguments as query
//! parameters; other methods send them as a JSON body. Operations marked
//! `paginated` follow a `next_cursor` field across pages and return the
//! concatenated item list, capped by the configured page limit.

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::Method;
use serde_json::{Map, Value};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use socialflow_registry::{Capability, CapabilityDescriptor, HttpBinding};

/// Explicit configuration for a REST capability; nothing is read from the
/// environment.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL all operation paths are joined onto.
    pub base_url: Url,
    /// Optional bearer token sent on every request.
    pub bearer_token: Option<String>,
    /// Upper bound on pages fetched for paginated operations.
    pub page_limit: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl RestConfig {
    /// Configuration with the default page limit (10) and timeout (30s).
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            bearer_token: None,
            page_limit: 10,
            timeout_secs: 30,
        }
    }
}

/// Capability whose operations are HTTP endpoints described in the catalog.
pub struct RestCapability {
    descriptor: CapabilityDescriptor,
    client: reqwest::Client,
    config: RestConfig,
}

impl RestCapability {
    /// Build a REST capability for a catalog descriptor.
    ///
    /// Fails when the descriptor has no HTTP-bound operations at all.
    pub fn from_descriptor(descriptor: CapabilityDescriptor, config: RestConfig) -> Result<Self> {
        if !descriptor.operations.iter().any(|operation| operation.http.is_some()) {
            bail!("capability '{}' declares no HTTP-bound operations", descriptor.capability_id);
        }

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.bearer_token {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}")).context("invalid bearer token")?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            descriptor,
            client,
            config,
        })
    }

    async fn execute(&self, binding: &HttpBinding, arguments: &IndexMap<String, Value>, cursor: Option<&str>) -> Result<Value> {
        let method = Method::from_str(&binding.method).map_err(|error| anyhow!("invalid HTTP method '{}': {error}", binding.method))?;
        let url = self
            .config
            .base_url
            .join(binding.path.trim_start_matches('/'))
            .with_context(|| format!("invalid operation path '{}'", binding.path))?;

        let mut request = self.client.request(method.clone(), url.clone());
        if method == Method::GET || method == Method::DELETE {
            let mut query: Vec<(String, String)> = arguments
                .iter()
                .map(|(name, value)| (name.clone(), query_value(value)))
                .collect();
            if let Some(cursor) = cursor {
                query.push(("cursor".to_string(), cursor.to_string()));
            }
            request = request.query(&query);
        } else {
            let mut body: Map<String, Value> = arguments.iter().map(|(name, value)| (name.clone(), value.clone())).collect();
            if let Some(cursor) = cursor {
                body.insert("cursor".to_string(), Value::String(cursor.to_string()));
            }
            request = request.json(&Value::Object(body));
        }

        tracing::debug!(method = %method, url = %url, "executing capability request");
        let response = request.send().await.with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            bail!("request to {url} returned {status}: {}", preview(&text));
        }
        serde_json::from_str(&text).with_context(|| format!("non-JSON response from {url}: {}", preview(&text)))
    }

    async fn execute_paginated(&self, binding: &HttpBinding, arguments: &IndexMap<String, Value>) -> Result<Value> {
        let mut items: Vec<Value> = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 0..self.config.page_limit {
            let response = self.execute(binding, arguments, cursor.as_deref()).await?;
            match page_items(&response) {
                Some(page_items) => items.extend(page_items.iter().cloned()),
                None => bail!("paginated response from '{}' carries no item list", binding.path),
            }

            cursor = next_cursor(&response);
            if cursor.is_none() {
                return Ok(Value::Array(items));
            }
            tracing::debug!(path = %binding.path, page = page + 1, collected = items.len(), "following pagination cursor");
        }

        tracing::warn!(
            path = %binding.path,
            page_limit = self.config.page_limit,
            "page limit reached before the cursor was exhausted"
        );
        Ok(Value::Array(items))
    }
}

#[async_trait]
impl Capability for RestCapability {
    fn capability_id(&self) -> &str {
        &self.descriptor.capability_id
    }

    async fn invoke(&self, operation_id: &str, arguments: IndexMap<String, Value>) -> Result<Value> {
        let operation = self
            .descriptor
            .operation(operation_id)
            .ok_or_else(|| anyhow!("operation '{operation_id}' is not described for '{}'", self.descriptor.capability_id))?;
        let binding = operation
            .http
            .as_ref()
            .ok_or_else(|| anyhow!("operation '{operation_id}' has no HTTP binding"))?;

        if binding.paginated {
            self.execute_paginated(binding, &arguments).await
        } else {
            self.execute(binding, &arguments, None).await
        }
    }
}

/// Render an argument value as a query-string value.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Locate the item list in a paginated response: a top-level array, or an
/// `items`/`data`/`results` field.
fn page_items(response: &Value) -> Option<&Vec<Value>> {
    if let Value::Array(items) = response {
        return Some(items);
    }
    ["items", "data", "results"]
        .iter()
        .find_map(|field| response.get(field).and_then(Value::as_array))
}

/// Extract the cursor for the next page, honouring an explicit `has_more`
/// flag when present.
fn next_cursor(response: &Value) -> Option<String> {
    if response.get("has_more").and_then(Value::as_bool) == Some(false) {
        return None;
    }
    response
        .get("next_cursor")
        .and_then(Value::as_str)
        .filter(|cursor| !cursor.is_empty())
        .map(str::to_string)
}

fn preview(text: &str) -> &str {
    let end = text.char_indices().nth(200).map(|(index, _)| index).unwrap_or(text.len());
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use socialflow_registry::OperationDescriptor;
    use socialflow_types::TypeTag;

    fn descriptor() -> CapabilityDescriptor {
        CapabilityDescriptor {
            capability_id: "tiktok_crawler".to_string(),
            description: String::new(),
            operations: vec![OperationDescriptor {
                operation_id: "search_videos".to_string(),
                description: String::new(),
                parameters: vec![],
                return_type: TypeTag::parse("sequence-of-record"),
                http: Some(HttpBinding {
                    method: "GET".to_string(),
                    path: "/videos/search".to_string(),
                    paginated: true,
                }),
            }],
        }
    }

    #[test]
    fn descriptor_without_http_operations_is_rejected() {
        let mut bare = descriptor();
        bare.operations[0].http = None;
        let config = RestConfig::new(Url::parse("https://api.example.com").expect("url"));
        assert!(RestCapability::from_descriptor(bare, config).is_err());
    }

    #[test]
    fn http_descriptor_builds_a_capability() {
        let config = RestConfig::new(Url::parse("https://api.example.com").expect("url"));
        let capability = RestCapability::from_descriptor(descriptor(), config).expect("build capability");
        assert_eq!(capability.capability_id(), "tiktok_crawler");
    }

    #[test]
    fn query_values_render_scalars_without_quotes() {
        assert_eq!(query_value(&json!("cats")), "cats");
        assert_eq!(query_value(&json!(10)), "10");
        assert_eq!(query_value(&json!(true)), "true");
        assert_eq!(query_value(&json!(["a"])), "[\"a\"]");
    }

    #[test]
    fn page_items_accepts_common_envelope_shapes() {
        assert_eq!(page_items(&json!([1, 2])).map(Vec::len), Some(2));
        assert_eq!(page_items(&json!({"items": [1]})).map(Vec::len), Some(1));
        assert_eq!(page_items(&json!({"data": [1, 2, 3]})).map(Vec::len), Some(3));
        assert_eq!(page_items(&json!({"results": []})).map(Vec::len), Some(0));
        assert!(page_items(&json!({"count": 3})).is_none());
    }

    #[test]
    fn next_cursor_respects_has_more_and_empty_cursors() {
        assert_eq!(next_cursor(&json!({"next_cursor": "abc"})), Some("abc".to_string()));
        assert_eq!(next_cursor(&json!({"next_cursor": "abc", "has_more": true})), Some("abc".to_string()));
        assert!(next_cursor(&json!({"next_cursor": "abc", "has_more": false})).is_none());
        assert!(next_cursor(&json!({"next_cursor": ""})).is_none());
        assert!(next_cursor(&json!({"items": []})).is_none());
    }
}
