//! Service manifest as advertised by a reconciliation endpoint.

use serde::{Deserialize, Serialize};

use super::record::fill_template;

/// Preview template (`{{id}}` placeholder) with optional display size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewTemplate {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// View template (`{{id}}` placeholder).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewTemplate {
    pub url: String,
}

/// Self-described capability document of a remote service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub identifier_space: Option<String>,
    #[serde(default)]
    pub schema_space: Option<String>,
    #[serde(default)]
    pub versions: Option<Vec<String>>,
    #[serde(default)]
    pub preview: Option<PreviewTemplate>,
    #[serde(default)]
    pub view: Option<ViewTemplate>,
}

impl ConnectorManifest {
    /// Preview url for a raw id, percent-encoding the id.
    pub fn preview_url(&self, raw_id: &str) -> Option<String> {
        self.preview
            .as_ref()
            .map(|p| fill_template(&p.url, &urlencoding::encode(raw_id)))
    }

    /// View url for a raw id.
    pub fn view_url(&self, raw_id: &str) -> Option<String> {
        self.view.as_ref().map(|v| fill_template(&v.url, raw_id))
    }

    /// Link for a raw id: the view url, or the raw id when no template is advertised.
    pub fn link_for(&self, raw_id: &str) -> String {
        self.view_url(raw_id).unwrap_or_else(|| raw_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_w3c_manifest() {
        let json = r#"{
            "name": "GND reconciliation",
            "identifierSpace": "https://d-nb.info/gnd/",
            "schemaSpace": "https://d-nb.info/standards/elementset/gnd#",
            "versions": ["0.2", "0.3"],
            "view": {"url": "https://d-nb.info/gnd/{{id}}"},
            "preview": {"url": "https://lobid.org/gnd/{{id}}.preview", "width": 500, "height": 300}
        }"#;

        let manifest: ConnectorManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.versions.as_ref().map(|v| v.len()), Some(2));
        assert_eq!(manifest.preview.as_ref().and_then(|p| p.width), Some(500));
        assert_eq!(
            manifest.link_for("118540238"),
            "https://d-nb.info/gnd/118540238"
        );
    }

    #[test]
    fn test_link_falls_back_to_raw_id() {
        let manifest = ConnectorManifest::default();
        assert_eq!(manifest.link_for("abc"), "abc");
        assert_eq!(manifest.preview_url("abc"), None);
    }

    #[test]
    fn test_preview_url_encodes_id() {
        let manifest: ConnectorManifest =
            serde_json::from_str(r#"{"preview": {"url": "https://x.org/p?id={{id}}"}}"#).unwrap();
        assert_eq!(
            manifest.preview_url("a b/c").as_deref(),
            Some("https://x.org/p?id=a%20b%2Fc")
        );
    }
}
