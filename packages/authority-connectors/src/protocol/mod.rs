//! Reconciliation protocol revisions.
//!
//! A connector negotiates a version once, maps it to a [`Protocol`], and
//! keeps that variant for its lifetime. Each variant pairs a request codec
//! with a response parser.

pub mod codec;
pub mod normalize;
pub mod version;

use serde_json::Value;

use crate::error::Result;
use crate::traits::transport::HttpRequest;
use crate::types::record::ResultSet;

pub use codec::QueryHints;
pub use normalize::NormalizeContext;
pub use version::{negotiate, normalize_version, ProtocolVersion, DEFAULT_VERSION, NEWEST_VERSION};

/// Wire format spoken by a reconciliation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Form-encoded `queries={"q0": ...}`; response under `q0.result`.
    Legacy,
    /// JSON `{"queries": [...]}`; response under `results[0].candidates`.
    Draft,
}

impl Protocol {
    /// Variant for a negotiated (normalized) version. Only the exact newest
    /// revision selects the draft format.
    pub fn for_version(version: &str) -> Self {
        if version == NEWEST_VERSION {
            Self::Draft
        } else {
            Self::Legacy
        }
    }

    pub fn build_query(self, endpoint: &str, key: &str, hints: &QueryHints) -> HttpRequest {
        codec::build_query(self, endpoint, key, hints)
    }

    pub fn parse_response(self, response: &Value, ctx: NormalizeContext<'_>) -> Result<ResultSet> {
        normalize::parse_response(self, response, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_for_version() {
        assert_eq!(Protocol::for_version("0.3.0"), Protocol::Draft);
        assert_eq!(Protocol::for_version("0.2.0"), Protocol::Legacy);
        assert_eq!(Protocol::for_version("0.3.0-alpha"), Protocol::Legacy);
        assert_eq!(Protocol::for_version(DEFAULT_VERSION), Protocol::Legacy);
    }
}
