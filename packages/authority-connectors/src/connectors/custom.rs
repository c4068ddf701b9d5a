//! Custom connector: a local register composed with remote connectors.
//!
//! The local register store is addressed as
//! `{endpoint}/api/register/{register}[/{id}]`. It answers searches with a
//! `query` parameter, single-item fetches (404 when absent), and upserts a
//! record posted to its id.
//!
//! Local results are authoritative: they are fetched first, their failure
//! fails the whole call, and they win every id collision. Remote connectors
//! are consulted one at a time, in configured order; a failing remote is
//! skipped.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::build_child;
use crate::error::{ConnectorError, Result};
use crate::protocol::normalize::string_or_number;
use crate::traits::connector::{Connector, RawRecord};
use crate::traits::surface::DisplaySurface;
use crate::traits::transport::{HttpRequest, Transport};
use crate::types::config::CustomConfig;
use crate::types::record::{
    Descriptor, EntityType, IdPrefix, ResultRecord, ResultSet, LOCAL_PROVIDER,
};

/// An entry as returned by the local register's search.
#[derive(Debug, Deserialize)]
struct LocalItem {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default, alias = "name")]
    label: String,
    #[serde(default)]
    details: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(rename = "type", default)]
    entity_type: Option<EntityType>,
}

/// The register answers either with a bare array or with `{"items": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LocalResults {
    Items(Vec<LocalItem>),
    Wrapped { items: Vec<LocalItem> },
}

impl LocalResults {
    fn into_items(self) -> Vec<LocalItem> {
        match self {
            Self::Items(items) | Self::Wrapped { items } => items,
        }
    }
}

/// Connector over a local register plus ordered remote connectors.
pub struct CustomConnector {
    endpoint: String,
    register: String,
    prefix: IdPrefix,
    editable: bool,
    debug: bool,
    connectors: Vec<Box<dyn Connector>>,
    transport: Arc<dyn Transport>,
}

impl CustomConnector {
    /// Build the connector and every remote connector named in the config.
    ///
    /// Remote connectors without a register inherit this one's.
    pub fn new(config: CustomConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        if config.endpoint.is_empty() || config.register.is_empty() {
            return Err(ConnectorError::Config(
                "custom connector needs an endpoint and a register".into(),
            ));
        }

        let connectors = config
            .connectors
            .into_iter()
            .map(|mut child| {
                child.inherit_register(&config.register)?;
                build_child(child, Arc::clone(&transport))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            register: config.register,
            prefix: IdPrefix::new(config.prefix),
            editable: config.editable,
            debug: config.debug,
            connectors,
            transport,
        })
    }

    /// Append a remote connector after the configured ones.
    pub fn with_connector(mut self, connector: Box<dyn Connector>) -> Self {
        self.connectors.push(connector);
        self
    }

    /// Whether remote records may be copied into the local register.
    pub fn editable(&self) -> bool {
        self.editable
    }

    pub fn connectors(&self) -> &[Box<dyn Connector>] {
        &self.connectors
    }

    fn register_url(&self) -> String {
        format!("{}/api/register/{}", self.endpoint, urlencoding::encode(&self.register))
    }

    fn item_url(&self, raw_id: &str) -> String {
        format!("{}/{}", self.register_url(), urlencoding::encode(raw_id))
    }

    fn to_record(&self, item: LocalItem) -> ResultRecord {
        let record = ResultRecord::new(
            self.register.as_str(),
            self.prefix.apply(&item.id),
            item.label,
            LOCAL_PROVIDER,
        )
        .with_details(item.details)
        .with_link(item.link.unwrap_or(item.id));

        match item.entity_type {
            Some(entity_type) => record.with_type(entity_type),
            None => record,
        }
    }

    async fn query_local(&self, key: &str) -> Result<Vec<ResultRecord>> {
        let url = format!("{}?query={}", self.register_url(), urlencoding::encode(key));
        let response = self.transport.get(&url).await?.error_for_status()?;
        if self.debug {
            info!(url = %url, body = %response.body, "Local register response");
        }

        let local: LocalResults = response.json().map_err(|e| {
            ConnectorError::MalformedResponse(format!("unexpected local register response: {}", e))
        })?;

        Ok(local
            .into_items()
            .into_iter()
            .map(|item| self.to_record(item))
            .collect())
    }

    /// Copy the record for `item` from the first remote connector that has
    /// it into the local register.
    pub async fn select(&self, item: &ResultRecord) -> Result<RawRecord> {
        self.select_id(item.id()).await
    }

    /// Same as [`select`](Self::select), by id.
    pub async fn select_id(&self, id: &str) -> Result<RawRecord> {
        let mut found = None;
        for connector in &self.connectors {
            match connector.get_record(id).await {
                Ok(record) => {
                    debug!(id, connector = connector.name(), "Record found");
                    found = Some(record);
                    break;
                }
                Err(e) => {
                    debug!(id, connector = connector.name(), error = %e, "No record, trying next connector");
                }
            }
        }

        let record = found.ok_or_else(|| ConnectorError::NoRecordFound { id: id.to_string() })?;

        let url = self.item_url(self.prefix.strip(id));
        let request = HttpRequest::post(&url)
            .header("Content-Type", "application/json")
            .body(serde_json::to_string(&record)?);
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            warn!(id, status = response.status, body = %response.body, "Local register rejected record");
            return Err(ConnectorError::UpstreamRejected {
                status: response.status,
            });
        }

        info!(id, register = %self.register, "Stored record in local register");
        Ok(record)
    }
}

#[async_trait]
impl Connector for CustomConnector {
    fn name(&self) -> &str {
        &self.endpoint
    }

    fn register(&self) -> &str {
        &self.register
    }

    /// Wait for every remote connector. One that never becomes ready is
    /// logged and left to fail (and be skipped) on use.
    async fn ready(&self) -> Result<()> {
        for connector in &self.connectors {
            if let Err(e) = connector.ready().await {
                warn!(connector = connector.name(), error = %e, "Connector unavailable");
            }
        }
        Ok(())
    }

    async fn query(&self, key: &str) -> Result<ResultSet> {
        let mut items = self.query_local(key).await?;
        // Selected records are stored under the remote id, so a remote hit
        // collides with either the exposed or the stored id of a local one.
        let local_ids: HashSet<String> = items
            .iter()
            .flat_map(|item| [item.id(), self.prefix.strip(item.id())])
            .map(str::to_string)
            .collect();
        let mut total_items = items.len();

        for connector in &self.connectors {
            match connector.query(key).await {
                Ok(results) => {
                    // Duplicates still count towards the total.
                    total_items += results.total_items;
                    items.extend(
                        results
                            .items
                            .into_iter()
                            .filter(|item| !local_ids.contains(item.id())),
                    );
                }
                Err(e) => {
                    warn!(connector = connector.name(), key, error = %e, "Skipping connector after failed query");
                }
            }
        }

        debug!(
            register = %self.register,
            key,
            total_items,
            listed = items.len(),
            "Aggregated query completed"
        );
        Ok(ResultSet { total_items, items })
    }

    async fn info(&self, id: &str, container: &mut dyn DisplaySurface) -> Result<Descriptor> {
        let raw_id = self.prefix.strip(id);
        let response = self.transport.get(&self.item_url(raw_id)).await?;

        if !response.is_not_found() {
            let response = response.error_for_status()?;
            container.render(response.body);
            return Ok(Descriptor::new(self.prefix.apply(raw_id)));
        }

        for connector in &self.connectors {
            match connector.info(id, container).await {
                Ok(descriptor) if !descriptor.is_empty() => return Ok(descriptor),
                Ok(_) => {}
                Err(e) => {
                    debug!(id, connector = connector.name(), error = %e, "Connector info failed, trying next");
                }
            }
        }

        Ok(Descriptor::empty())
    }

    async fn get_record(&self, key: &str) -> Result<RawRecord> {
        let response = self
            .transport
            .get(&self.item_url(self.prefix.strip(key)))
            .await?
            .error_for_status()?;
        Ok(response.json()?)
    }
}
