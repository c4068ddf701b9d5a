//! Connector for W3C reconciliation services.
//!
//! The service manifest is fetched in the background as soon as the
//! connector is built. Until it resolves the connector is
//! [`ManifestState::Pending`] and every operation fails with `NotReady`;
//! a failed fetch or negotiation is terminal.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use authority_connectors::{ReconciliationConfig, ReconciliationConnector, ReqwestTransport};
//!
//! let config = ReconciliationConfig::new("https://lobid.org/gnd/reconcile", "person")
//!     .with_prefix("gnd");
//! let connector = ReconciliationConnector::connect(config, Arc::new(ReqwestTransport::new())).await?;
//! let results = connector.query("Goethe").await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{ConnectorError, Result};
use crate::protocol::{negotiate, NormalizeContext, Protocol, QueryHints};
use crate::traits::connector::{Connector, RawRecord};
use crate::traits::surface::DisplaySurface;
use crate::traits::transport::Transport;
use crate::types::config::ReconciliationConfig;
use crate::types::manifest::ConnectorManifest;
use crate::types::record::{Descriptor, IdPrefix, ResultSet};

/// Rendered into the display surface when the service has no preview template.
pub const NO_PREVIEW_MESSAGE: &str = "Preview not available for this service.";

/// What the connector learned from a successfully negotiated manifest.
#[derive(Debug, Clone)]
pub struct ServiceProfile {
    pub manifest: ConnectorManifest,
    /// Negotiated version in normalized form.
    pub version: String,
    pub protocol: Protocol,
}

/// Why the manifest could not be used.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestFailure {
    Unavailable(String),
    NoCompatibleVersion(Vec<String>),
}

/// Lifecycle of the connector's manifest.
#[derive(Debug, Clone)]
pub enum ManifestState {
    Pending,
    Ready(Arc<ServiceProfile>),
    Failed(ManifestFailure),
}

/// Connector bound to one reconciliation endpoint.
pub struct ReconciliationConnector {
    endpoint: String,
    register: String,
    prefix: IdPrefix,
    hints: QueryHints,
    debug: bool,
    transport: Arc<dyn Transport>,
    state: watch::Receiver<ManifestState>,
}

impl ReconciliationConnector {
    /// Build the connector and start fetching its manifest.
    ///
    /// Does not wait for the manifest; use [`wait_ready`](Self::wait_ready)
    /// or [`connect`](Self::connect) for that. Must be called within a Tokio runtime.
    pub fn new(config: ReconciliationConfig, transport: Arc<dyn Transport>) -> Self {
        let (tx, rx) = watch::channel(ManifestState::Pending);

        let endpoint = config.endpoint.clone();
        let fetch_transport = Arc::clone(&transport);
        tokio::spawn(async move {
            let state = match load_profile(fetch_transport.as_ref(), &endpoint).await {
                Ok(profile) => {
                    info!(
                        endpoint = %endpoint,
                        version = %profile.version,
                        protocol = ?profile.protocol,
                        "Reconciliation service ready"
                    );
                    ManifestState::Ready(Arc::new(profile))
                }
                Err(ConnectorError::NoCompatibleVersion { advertised }) => {
                    warn!(endpoint = %endpoint, ?advertised, "No compatible protocol version");
                    ManifestState::Failed(ManifestFailure::NoCompatibleVersion(advertised))
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "Failed to load service manifest");
                    ManifestState::Failed(ManifestFailure::Unavailable(e.to_string()))
                }
            };
            // Nobody listening means the connector was dropped.
            let _ = tx.send(state);
        });

        Self {
            endpoint: config.endpoint,
            register: config.register,
            prefix: IdPrefix::new(config.prefix),
            hints: QueryHints {
                process_lang: config.process_lang,
                accept_lang: config.accept_lang,
            },
            debug: config.debug,
            transport,
            state: rx,
        }
    }

    /// Build the connector and wait until its manifest is usable.
    pub async fn connect(config: ReconciliationConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let connector = Self::new(config, transport);
        connector.wait_ready().await?;
        Ok(connector)
    }

    /// Wait for the manifest fetch to finish.
    pub async fn wait_ready(&self) -> Result<Arc<ServiceProfile>> {
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(|state| !matches!(state, ManifestState::Pending))
            .await
            .map(|state| state.clone())
            .map_err(|_| ConnectorError::ManifestUnavailable {
                endpoint: self.endpoint.clone(),
                reason: "manifest fetch was aborted".into(),
            })?;
        self.resolve(&state)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ManifestState {
        self.state.borrow().clone()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn prefix(&self) -> &IdPrefix {
        &self.prefix
    }

    fn profile(&self) -> Result<Arc<ServiceProfile>> {
        let state = self.state();
        self.resolve(&state)
    }

    fn resolve(&self, state: &ManifestState) -> Result<Arc<ServiceProfile>> {
        match state {
            ManifestState::Ready(profile) => Ok(Arc::clone(profile)),
            ManifestState::Pending => Err(ConnectorError::NotReady {
                endpoint: self.endpoint.clone(),
            }),
            ManifestState::Failed(ManifestFailure::NoCompatibleVersion(advertised)) => {
                Err(ConnectorError::NoCompatibleVersion {
                    advertised: advertised.clone(),
                })
            }
            ManifestState::Failed(ManifestFailure::Unavailable(reason)) => {
                Err(ConnectorError::ManifestUnavailable {
                    endpoint: self.endpoint.clone(),
                    reason: reason.clone(),
                })
            }
        }
    }

    fn trace_payload(&self, stage: &'static str, payload: &str) {
        if self.debug {
            info!(endpoint = %self.endpoint, stage, payload, "Reconciliation exchange");
        } else {
            debug!(endpoint = %self.endpoint, stage, payload, "Reconciliation exchange");
        }
    }
}

async fn load_profile(transport: &dyn Transport, endpoint: &str) -> Result<ServiceProfile> {
    let response = transport.get(endpoint).await?.error_for_status()?;
    let manifest: ConnectorManifest = response.json()?;
    let version = negotiate(manifest.versions.as_deref().unwrap_or_default())?;
    let protocol = Protocol::for_version(&version);

    Ok(ServiceProfile {
        manifest,
        version,
        protocol,
    })
}

#[async_trait]
impl Connector for ReconciliationConnector {
    fn name(&self) -> &str {
        &self.endpoint
    }

    fn register(&self) -> &str {
        &self.register
    }

    async fn ready(&self) -> Result<()> {
        self.wait_ready().await.map(|_| ())
    }

    async fn query(&self, key: &str) -> Result<ResultSet> {
        let profile = self.profile()?;

        let request = profile.protocol.build_query(&self.endpoint, key, &self.hints);
        self.trace_payload("request", request.body.as_deref().unwrap_or_default());

        let response = self.transport.send(request).await?.error_for_status()?;
        self.trace_payload("response", &response.body);

        let json: Value = response
            .json()
            .map_err(|e| ConnectorError::MalformedResponse(format!("response is not JSON: {}", e)))?;

        let ctx = NormalizeContext {
            register: &self.register,
            prefix: &self.prefix,
            view_template: profile.manifest.view.as_ref().map(|v| v.url.as_str()),
        };
        let results = profile.protocol.parse_response(&json, ctx)?;

        debug!(
            endpoint = %self.endpoint,
            key,
            count = results.total_items,
            "Reconciliation query completed"
        );
        Ok(results)
    }

    async fn info(&self, id: &str, container: &mut dyn DisplaySurface) -> Result<Descriptor> {
        let profile = self.profile()?;
        let raw_id = self.prefix.strip(id);

        let Some(url) = profile.manifest.preview_url(raw_id) else {
            container.render(NO_PREVIEW_MESSAGE.to_string());
            return Ok(Descriptor::empty());
        };

        let response = self.transport.get(&url).await?.error_for_status()?;
        container.render(response.body);

        Ok(Descriptor::new(self.prefix.apply(raw_id)))
    }

    async fn get_record(&self, key: &str) -> Result<RawRecord> {
        let profile = self.profile()?;
        let raw_id = self.prefix.strip(key);

        let view_url = profile
            .manifest
            .view_url(raw_id)
            .ok_or(ConnectorError::MissingTemplate("view"))?;
        debug!(endpoint = %self.endpoint, key, view_url = %view_url, "Fetching record");

        // First candidate wins; services rank their own results.
        let record = self
            .query(raw_id)
            .await?
            .items
            .into_iter()
            .next()
            .ok_or_else(|| ConnectorError::NotFound(format!("{} at {}", key, self.endpoint)))?;

        Ok(serde_json::to_value(record)?)
    }
}
