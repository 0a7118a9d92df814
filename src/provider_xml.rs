//! XML feed provider.
//!
//! Fetches a nested tree payload of the shape
//! `<response><items><item>...</item></items></response>`, where each item
//! carries flat child elements plus a `<tags><tag>..</tag></tags>` sublist,
//! and converts it into the same raw-item objects the JSON provider
//! produces, so the normalizer sees one shape.
//!
//! Parsing is deliberately tolerant at the item level: absent subfields
//! become absent keys (the normalizer applies type-appropriate defaults),
//! and an absent `<items>` wrapper yields an empty batch with a warning.
//! Only a structurally broken document fails the fetch.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::ProviderEndpointConfig;
use crate::provider::{FetchError, FetchFilters, Provider, RateLimit};

pub struct XmlProvider {
    name: String,
    config: ProviderEndpointConfig,
    client: reqwest::Client,
}

impl XmlProvider {
    pub fn new(name: String, config: ProviderEndpointConfig, client: reqwest::Client) -> Self {
        Self {
            name: format!("xml:{}", name),
            config,
            client,
        }
    }
}

#[async_trait]
impl Provider for XmlProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> &'static str {
        "xml"
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

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        parse_feed(&self.name, &body)
    }
}

/// Parse a feed document into raw item objects.
///
/// Every field value stays a string (or a string array for tags); the
/// normalizer handles numeric coercion, so `<views></views>` and a missing
/// `<views>` element both end up with the same default.
pub fn parse_feed(provider: &str, xml: &str) -> Result<Vec<Value>, FetchError> {
    let mut reader = quick_xml::Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut items: Vec<Value> = Vec::new();
    let mut saw_element = false;
    let mut saw_items = false;
    let mut in_items = false;
    let mut in_item = false;
    let mut in_tags = false;
    let mut field: Option<String> = None;
    let mut current = Map::new();
    let mut tags: Vec<Value> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                saw_element = true;
                let name = e.local_name();
                match name.as_ref() {
                    b"items" => {
                        saw_items = true;
                        in_items = true;
                    }
                    b"item" if in_items => {
                        in_item = true;
                        current = Map::new();
                        tags = Vec::new();
                    }
                    b"tags" if in_item => in_tags = true,
                    other if in_item => {
                        field = Some(String::from_utf8_lossy(other).into_owned());
                    }
                    _ => {}
                }
            }
            Ok(quick_xml::events::Event::Text(t)) => {
                if in_item {
                    let text = t
                        .unescape()
                        .map_err(|e| FetchError::Parse(e.to_string()))?
                        .into_owned();
                    if in_tags {
                        if field.as_deref() == Some("tag") && !text.is_empty() {
                            tags.push(Value::String(text));
                        }
                    } else if let Some(ref f) = field {
                        current.insert(f.clone(), Value::String(text));
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"item" if in_item => {
                        current.insert("tags".to_string(), Value::Array(std::mem::take(&mut tags)));
                        items.push(Value::Object(std::mem::take(&mut current)));
                        in_item = false;
                    }
                    b"tags" if in_item => in_tags = false,
                    b"items" => in_items = false,
                    _ => field = None,
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Ok(quick_xml::events::Event::Empty(_)) => saw_element = true,
            Ok(_) => {}
            Err(e) => return Err(FetchError::Parse(e.to_string())),
        }
        buf.clear();
    }

    // No element at all means the body was not XML (an error page, say);
    // only a well-formed document may take the permissive empty path.
    if !saw_element {
        return Err(FetchError::Parse(
            "document has no root element".to_string(),
        ));
    }

    if !saw_items {
        eprintln!("Warning: {} returned no <items> element", provider);
    }

    Ok(items)
}
