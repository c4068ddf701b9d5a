//! Connectors for name-authority and entity reconciliation services.
//!
//! A connector searches one authority source for a name and normalizes
//! what comes back into [`ResultRecord`]s with a common shape, so an
//! editor can offer candidates from several sources side by side.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use authority_connectors::{build_connector, ConnectorConfig, ReqwestTransport};
//!
//! let config = ConnectorConfig::from_file("register.json")?;
//! let connector = build_connector(config, Arc::new(ReqwestTransport::new()))?;
//!
//! let results = connector.query("Goethe").await?;
//! for item in &results.items {
//!     println!("{} {} ({})", item.id, item.label, item.provider);
//! }
//! ```
//!
//! # Modules
//!
//! - [`connectors`] - Reconciliation, Metagrid and custom (aggregating) connectors
//! - [`protocol`] - Version negotiation, request encoding, response normalization
//! - [`traits`] - Connector, transport and display surface abstractions
//! - [`types`] - Records, manifests and configuration
//! - [`testing`] - Mock implementations for testing

pub mod connectors;
pub mod error;
pub mod protocol;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use connectors::{
    build_connector, CustomConnector, ManifestFailure, ManifestState, MetagridConnector,
    ReconciliationConnector, ServiceProfile,
};
pub use error::{ConnectorError, Result};
pub use protocol::{negotiate, Protocol, ProtocolVersion, QueryHints};
pub use traits::{
    connector::{Connector, RawRecord},
    surface::DisplaySurface,
    transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport},
};
pub use types::{
    config::{ConnectorConfig, CustomConfig, MetagridConfig, ReconciliationConfig},
    manifest::ConnectorManifest,
    record::{Descriptor, EntityType, IdPrefix, ResultRecord, ResultSet, TypeRef},
};
