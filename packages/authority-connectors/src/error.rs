//! Typed errors for the connector library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell a
//! missing record apart from a broken upstream.

use thiserror::Error;

/// Errors that can occur while talking to an authority service or the local register.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Manifest fetch or parse failed. Terminal for that connector.
    #[error("manifest unavailable for {endpoint}: {reason}")]
    ManifestUnavailable { endpoint: String, reason: String },

    /// Connector was used before its manifest resolved
    #[error("connector for {endpoint} is not ready yet")]
    NotReady { endpoint: String },

    /// None of the advertised protocol versions is supported
    #[error("no compatible protocol version in {advertised:?}")]
    NoCompatibleVersion { advertised: Vec<String> },

    /// Response did not have the shape expected for the negotiated version
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Record absent locally or remotely
    #[error("not found: {0}")]
    NotFound(String),

    /// Manifest does not advertise the named URL template
    #[error("service does not advertise a {0} template")]
    MissingTemplate(&'static str),

    /// No child connector could supply a record to select
    #[error("no record found for {id}")]
    NoRecordFound { id: String },

    /// Local register refused to persist a record
    #[error("local register rejected record with status {status}")]
    UpstreamRejected { status: u16 },

    /// Non-success HTTP status other than 404
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Network error (connection failed, body read failed)
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

impl ConnectorError {
    /// Whether this error means "the record does not exist" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Result type alias for connector operations.
pub type Result<T> = std::result::Result<T, ConnectorError>;
