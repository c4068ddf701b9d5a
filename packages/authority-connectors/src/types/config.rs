//! Configuration for connectors.
//!
//! Read once when a connector is built. A configuration file holds one
//! [`ConnectorConfig`], usually a `custom` connector wrapping remote ones:
//!
//! ```json
//! {
//!   "connector": "custom",
//!   "endpoint": "http://localhost:8080/exist/apps/tei-publisher",
//!   "register": "person",
//!   "editable": true,
//!   "connectors": [
//!     { "connector": "reconciliation", "endpoint": "https://lobid.org/gnd/reconcile", "prefix": "gnd" },
//!     { "connector": "metagrid" }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, Result};

/// Default base url of the Metagrid API.
pub const METAGRID_BASE_URL: &str = "https://api.metagrid.ch";

/// Settings for a reconciliation service connector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationConfig {
    /// Service endpoint; the manifest is fetched from here and queries are posted here.
    pub endpoint: String,

    /// Register the results belong to. Inherited from the wrapping connector when empty.
    #[serde(default)]
    pub register: String,

    /// Identifier prefix exposed on result ids.
    #[serde(default)]
    pub prefix: Option<String>,

    /// Log request bodies and raw responses at info level.
    #[serde(default)]
    pub debug: bool,

    /// Language the service should process the query in (newest protocol only).
    #[serde(default)]
    pub process_lang: Option<String>,

    /// Value for the `Accept-Language` header (newest protocol only).
    #[serde(default)]
    pub accept_lang: Option<String>,
}

impl ReconciliationConfig {
    pub fn new(endpoint: impl Into<String>, register: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            register: register.into(),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_process_lang(mut self, lang: impl Into<String>) -> Self {
        self.process_lang = Some(lang.into());
        self
    }

    pub fn with_accept_lang(mut self, lang: impl Into<String>) -> Self {
        self.accept_lang = Some(lang.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Settings for the Metagrid connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetagridConfig {
    #[serde(default)]
    pub register: String,

    #[serde(default = "default_metagrid_base_url")]
    pub base_url: String,

    /// Page size requested from the API.
    #[serde(default = "default_metagrid_limit")]
    pub limit: usize,

    #[serde(default)]
    pub debug: bool,
}

fn default_metagrid_base_url() -> String {
    METAGRID_BASE_URL.to_string()
}

fn default_metagrid_limit() -> usize {
    10
}

impl Default for MetagridConfig {
    fn default() -> Self {
        Self {
            register: String::new(),
            base_url: default_metagrid_base_url(),
            limit: default_metagrid_limit(),
            debug: false,
        }
    }
}

impl MetagridConfig {
    pub fn new(register: impl Into<String>) -> Self {
        Self {
            register: register.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Settings for the custom connector: a local register plus ordered remote connectors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomConfig {
    /// Base url of the local register store.
    pub endpoint: String,

    pub register: String,

    #[serde(default)]
    pub prefix: Option<String>,

    /// Whether remote records may be copied into the local register.
    #[serde(default)]
    pub editable: bool,

    #[serde(default)]
    pub debug: bool,

    /// Remote connectors, queried in this order.
    #[serde(default)]
    pub connectors: Vec<ConnectorConfig>,
}

impl CustomConfig {
    pub fn new(endpoint: impl Into<String>, register: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            register: register.into(),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Append a remote connector after the ones already configured.
    pub fn with_connector(mut self, connector: impl Into<ConnectorConfig>) -> Self {
        self.connectors.push(connector.into());
        self
    }
}

/// Configuration of any connector variant, tagged by `connector`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "connector", rename_all = "lowercase")]
pub enum ConnectorConfig {
    Reconciliation(ReconciliationConfig),
    Metagrid(MetagridConfig),
    Custom(CustomConfig),
}

impl From<ReconciliationConfig> for ConnectorConfig {
    fn from(config: ReconciliationConfig) -> Self {
        Self::Reconciliation(config)
    }
}

impl From<MetagridConfig> for ConnectorConfig {
    fn from(config: MetagridConfig) -> Self {
        Self::Metagrid(config)
    }
}

impl From<CustomConfig> for ConnectorConfig {
    fn from(config: CustomConfig) -> Self {
        Self::Custom(config)
    }
}

impl ConnectorConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConnectorError::Config(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ConnectorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn register(&self) -> &str {
        match self {
            Self::Reconciliation(c) => &c.register,
            Self::Metagrid(c) => &c.register,
            Self::Custom(c) => &c.register,
        }
    }

    /// Adopt the wrapping connector's register.
    ///
    /// An empty register is filled in; a different one is an error, since
    /// every connector feeding one aggregation serves the same register.
    pub fn inherit_register(&mut self, register: &str) -> Result<()> {
        let own = match self {
            Self::Reconciliation(c) => &mut c.register,
            Self::Metagrid(c) => &mut c.register,
            Self::Custom(c) => &mut c.register,
        };
        if own.is_empty() {
            *own = register.to_string();
        } else if own != register {
            return Err(mismatched_register(own, register));
        }
        Ok(())
    }

    /// Check required fields. Nested connectors may leave their register
    /// empty but must not name another one.
    pub fn validate(&self) -> Result<()> {
        self.validate_inner(None)
    }

    fn validate_inner(&self, parent_register: Option<&str>) -> Result<()> {
        let register = self.register();
        match parent_register {
            None if register.is_empty() => {
                return Err(ConnectorError::Config("register must be set".into()));
            }
            Some(parent) if !register.is_empty() && register != parent => {
                return Err(mismatched_register(register, parent));
            }
            _ => {}
        }

        match self {
            Self::Reconciliation(c) if c.endpoint.is_empty() => Err(ConnectorError::Config(
                "reconciliation connector needs an endpoint".into(),
            )),
            Self::Metagrid(c) if c.base_url.is_empty() => Err(ConnectorError::Config(
                "metagrid connector needs a base url".into(),
            )),
            Self::Custom(c) => {
                if c.endpoint.is_empty() {
                    return Err(ConnectorError::Config(
                        "custom connector needs an endpoint".into(),
                    ));
                }
                let own = parent_register.unwrap_or(&c.register);
                c.connectors
                    .iter()
                    .try_for_each(|child| child.validate_inner(Some(own)))
            }
            _ => Ok(()),
        }
    }
}

fn mismatched_register(child: &str, parent: &str) -> ConnectorError {
    ConnectorError::Config(format!(
        "nested connector register '{}' differs from '{}'",
        child, parent
    ))
}
