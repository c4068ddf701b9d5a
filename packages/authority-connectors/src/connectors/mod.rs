//! Connector implementations.
//!
//! - [`ReconciliationConnector`] - W3C reconciliation services, version negotiated
//! - [`MetagridConnector`] - the Metagrid person search API
//! - [`CustomConnector`] - a local register in front of other connectors

pub mod custom;
pub mod metagrid;
pub mod reconciliation;

use std::sync::Arc;

pub use custom::CustomConnector;
pub use metagrid::MetagridConnector;
pub use reconciliation::{
    ManifestFailure, ManifestState, ReconciliationConnector, ServiceProfile, NO_PREVIEW_MESSAGE,
};

use crate::error::Result;
use crate::traits::connector::Connector;
use crate::traits::transport::Transport;
use crate::types::config::ConnectorConfig;

/// Build the connector a configuration describes.
///
/// Reconciliation connectors start fetching their manifest right away, so
/// this must run inside a Tokio runtime.
pub fn build_connector(
    config: ConnectorConfig,
    transport: Arc<dyn Transport>,
) -> Result<Box<dyn Connector>> {
    config.validate()?;
    build_child(config, transport)
}

/// Build without validating; nested configs have already inherited their register.
pub(crate) fn build_child(
    config: ConnectorConfig,
    transport: Arc<dyn Transport>,
) -> Result<Box<dyn Connector>> {
    let connector: Box<dyn Connector> = match config {
        ConnectorConfig::Reconciliation(config) => {
            Box::new(ReconciliationConnector::new(config, transport))
        }
        ConnectorConfig::Metagrid(config) => Box::new(MetagridConnector::new(config, transport)),
        ConnectorConfig::Custom(config) => Box::new(CustomConnector::new(config, transport)?),
    };
    Ok(connector)
}
