//! JSON feed provider.
//!
//! Fetches a flat list of records from a JSON endpoint. The payload is
//! either a bare array or an envelope object with a `data` array (the shape
//! most upstream feeds use: `{"status": "...", "data": [...], ...}`).

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ProviderEndpointConfig;
use crate::provider::{FetchError, FetchFilters, Provider, RateLimit};

pub struct JsonProvider {
    name: String,
    config: ProviderEndpointConfig,
    client: reqwest::Client,
}

impl JsonProvider {
    pub fn new(name: String, config: ProviderEndpointConfig, client: reqwest::Client) -> Self {
        Self {
            name: format!("json:{}", name),
            config,
            client,
        }
    }
}

#[async_trait]
impl Provider for JsonProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> &'static str {
        "json"
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            limit: self.config.rate_limit,
            remaining: self.config.rate_limit,
        }
    }

    async fn is_available(&self) -> bool {
        match self.client.head(&self.config.url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                eprintln!("Warning: {} availability check failed: {}", self.name, e);
                false
            }
        }
    }

    async fn fetch(&self, filters: &FetchFilters) -> Result<Vec<Value>, FetchError> {
        let resp = self
            .client
            .get(&self.config.url)
            .query(&filters.to_query())
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        extract_items(&self.name, payload)
    }
}

/// Pull the item list out of a decoded payload.
///
/// A missing `data` array is not an error: the upstream structure being
/// entirely absent is logged and yields an empty batch.
fn extract_items(provider: &str, payload: Value) -> Result<Vec<Value>, FetchError> {
    match payload {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            _ => {
                eprintln!("Warning: {} returned no 'data' array", provider);
                Ok(Vec::new())
            }
        },
        other => Err(FetchError::Parse(format!(
            "expected object or array at top level, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_from_envelope() {
        let payload = json!({
            "status": "success",
            "data": [{"id": 1}, {"id": 2}],
            "total": 2
        });
        let items = extract_items("json:test", payload).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_extract_from_bare_array() {
        let items = extract_items("json:test", json!([{"id": 1}])).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_missing_data_key_yields_empty() {
        let items = extract_items("json:test", json!({"status": "success"})).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_scalar_payload_is_parse_error() {
        let err = extract_items("json:test", json!("nope")).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }
}
