//! Connector for the Metagrid person search API.
//!
//! A fixed third-party API: no manifest, no version negotiation. Results
//! carry the id of the partner project that holds the record as
//! `{provider slug}-{identifier}`.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ConnectorError, Result};
use crate::protocol::normalize::string_or_number;
use crate::traits::connector::{Connector, RawRecord};
use crate::traits::surface::{escape_html, DisplaySurface};
use crate::traits::transport::Transport;
use crate::types::config::MetagridConfig;
use crate::types::record::{Descriptor, ResultRecord, ResultSet};

static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]+").unwrap());

#[derive(Debug, Deserialize)]
struct SearchResponse {
    resources: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    #[serde(deserialize_with = "string_or_number")]
    identifier: String,
    #[serde(default)]
    uri: String,
    provider: Provider,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Deserialize)]
struct Provider {
    slug: String,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    first_name: Option<String>,
    last_name: Option<String>,
    birth_date: Option<String>,
    death_date: Option<String>,
}

/// Connector bound to the Metagrid search API.
pub struct MetagridConnector {
    base_url: String,
    register: String,
    limit: usize,
    debug: bool,
    transport: Arc<dyn Transport>,
}

impl MetagridConnector {
    pub fn new(config: MetagridConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            register: config.register,
            limit: config.limit,
            debug: config.debug,
            transport,
        }
    }

    fn search_url(&self, key: &str) -> String {
        format!(
            "{}/search?query={}&skip=0&take={}",
            self.base_url,
            urlencoding::encode(key),
            self.limit
        )
    }

    fn to_record(&self, resource: Resource) -> ResultRecord {
        let Metadata {
            first_name,
            last_name,
            birth_date,
            death_date,
        } = resource.metadata;

        let label = [first_name, last_name]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let details = [birth_date, death_date]
            .into_iter()
            .flatten()
            .filter(|date| !date.is_empty())
            .collect::<Vec<_>>()
            .join(" - ");

        ResultRecord::new(
            self.register.as_str(),
            format!("{}-{}", resource.provider.slug, resource.identifier),
            label,
            resource.provider.slug,
        )
        .with_details(details)
        .with_link(resource.uri)
    }
}

/// Remove punctuation the search API chokes on.
pub fn strip_punctuation(key: &str) -> String {
    PUNCTUATION.replace_all(key, "").into_owned()
}

/// Split `{slug}-{identifier}` on the first separator.
pub fn split_key(key: &str) -> Result<(&str, &str)> {
    key.split_once('-')
        .filter(|(slug, identifier)| !slug.is_empty() && !identifier.is_empty())
        .ok_or_else(|| ConnectorError::NotFound(format!("not a Metagrid key: {}", key)))
}

#[async_trait]
impl Connector for MetagridConnector {
    fn name(&self) -> &str {
        &self.base_url
    }

    fn register(&self) -> &str {
        &self.register
    }

    async fn query(&self, key: &str) -> Result<ResultSet> {
        let url = self.search_url(&strip_punctuation(key));
        let response = self.transport.get(&url).await?.error_for_status()?;
        if self.debug {
            info!(url = %url, body = %response.body, "Metagrid response");
        }

        let search: SearchResponse = response
            .json()
            .map_err(|e| ConnectorError::MalformedResponse(format!("unexpected Metagrid response: {}", e)))?;

        let items: Vec<ResultRecord> = search
            .resources
            .into_iter()
            .map(|resource| self.to_record(resource))
            .collect();

        debug!(key, count = items.len(), "Metagrid query completed");
        Ok(ResultSet::from_items(items))
    }

    async fn info(&self, id: &str, container: &mut dyn DisplaySurface) -> Result<Descriptor> {
        let (slug, identifier) = split_key(id)?;

        container.render(format!(
            "<div class=\"metagrid\"><p><strong>Provider:</strong> {}</p>\
             <p><strong>Identifier:</strong> {}</p></div>",
            escape_html(slug),
            escape_html(identifier)
        ));

        Ok(Descriptor::new(id))
    }

    /// Best effort: the API has no lookup by id, so this searches for the
    /// identifier and keeps the hit whose composite id matches.
    async fn get_record(&self, key: &str) -> Result<RawRecord> {
        let (_, identifier) = split_key(key)?;

        let record = self
            .query(identifier)
            .await?
            .items
            .into_iter()
            .find(|item| item.id() == key)
            .ok_or_else(|| ConnectorError::NotFound(format!("{} in Metagrid", key)))?;

        Ok(serde_json::to_value(record)?)
    }
}
