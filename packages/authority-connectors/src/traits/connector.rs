//! The capability set every connector implements.

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::surface::DisplaySurface;
use crate::types::record::{Descriptor, ResultSet};

/// A record as retrieved from a source, ready to be persisted.
pub type RawRecord = serde_json::Value;

/// Connector to one authority source.
///
/// # Implementations
///
/// - `ReconciliationConnector` - W3C reconciliation services
/// - `MetagridConnector` - the Metagrid search API
/// - `CustomConnector` - local register composed with other connectors
/// - `MockConnector` - for testing
#[async_trait]
pub trait Connector: Send + Sync {
    /// Short name for logging (usually the endpoint).
    fn name(&self) -> &str;

    /// Register the results belong to. Constant for the connector's lifetime.
    fn register(&self) -> &str;

    /// Wait until the connector can serve requests.
    ///
    /// Connectors without startup work are ready immediately.
    async fn ready(&self) -> Result<()> {
        Ok(())
    }

    /// Search the source for `key`.
    async fn query(&self, key: &str) -> Result<ResultSet>;

    /// Render a preview of `id` into `container` and resolve its identity.
    ///
    /// An empty descriptor means the source has nothing to show.
    async fn info(&self, id: &str, container: &mut dyn DisplaySurface) -> Result<Descriptor>;

    /// Fetch the full record for `key`.
    async fn get_record(&self, key: &str) -> Result<RawRecord>;
}
