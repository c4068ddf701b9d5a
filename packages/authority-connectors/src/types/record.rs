//! The normalized result record every connector emits.

use serde::{Deserialize, Serialize};

/// Provider tag for records produced by a reconciliation service.
pub const RECONCILIATION_PROVIDER: &str = "Reconciliation";

/// Provider tag for records coming from the local register.
pub const LOCAL_PROVIDER: &str = "local";

/// One entity type as returned by a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

/// Entity type(s) of a record.
///
/// Legacy services keep the full list; the newest draft only keeps the
/// first type's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityType {
    List(Vec<TypeRef>),
    Name(String),
}

impl EntityType {
    /// Names of all types, in wire order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::List(types) => types.iter().map(|t| t.name.as_str()).collect(),
            Self::Name(name) => vec![name.as_str()],
        }
    }
}

/// Canonical normalized output unit.
///
/// Built with [`ResultRecord::new`] and the `with_*` methods; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    register: String,
    id: String,
    label: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    entity_type: Option<EntityType>,
    #[serde(default)]
    details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(default)]
    link: String,
    provider: String,
}

impl ResultRecord {
    /// Create a record with the identifying fields; the rest start empty.
    pub fn new(
        register: impl Into<String>,
        id: impl Into<String>,
        label: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            register: register.into(),
            id: id.into(),
            label: label.into(),
            entity_type: None,
            details: String::new(),
            score: None,
            link: String::new(),
            provider: provider.into(),
        }
    }

    pub fn with_type(mut self, entity_type: EntityType) -> Self {
        self.entity_type = Some(entity_type);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn register(&self) -> &str {
        &self.register
    }

    /// External id, prefixed when the producing connector has a prefix.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn entity_type(&self) -> Option<&EntityType> {
        self.entity_type.as_ref()
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    /// Match score; only the newest reconciliation protocol reports one.
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }
}

/// Items returned by one query, with the count the connector reports.
///
/// `total_items` may exceed `items.len()` for aggregated results, since
/// duplicates are counted but not listed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub total_items: usize,
    pub items: Vec<ResultRecord>,
}

impl ResultSet {
    /// Result set whose count is the number of items.
    pub fn from_items(items: Vec<ResultRecord>) -> Self {
        Self {
            total_items: items.len(),
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Identity descriptor resolved by `info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Descriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }

    /// Descriptor for "nothing to show".
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none()
    }
}

/// Optional identifier prefix of a register.
///
/// With prefix `P`, raw id `42` is exposed as `P-42`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdPrefix(Option<String>);

impl IdPrefix {
    pub fn new(prefix: Option<String>) -> Self {
        Self(prefix.filter(|p| !p.is_empty()))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Turn a raw id into the externally visible id.
    pub fn apply(&self, raw_id: &str) -> String {
        match &self.0 {
            Some(prefix) => format!("{}-{}", prefix, raw_id),
            None => raw_id.to_string(),
        }
    }

    /// Recover the raw id from an external id. Ids without the prefix pass through.
    pub fn strip<'a>(&self, id: &'a str) -> &'a str {
        match &self.0 {
            Some(prefix) => id
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('-'))
                .unwrap_or(id),
            None => id,
        }
    }
}

/// Source description if present, else the comma-joined type names, else empty.
pub fn describe(description: Option<&str>, type_names: &[&str]) -> String {
    match description {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => type_names.join(", "),
    }
}

/// Substitute the raw id into a `{{id}}` URL template.
pub fn fill_template(template: &str, raw_id: &str) -> String {
    template.replace("{{id}}", raw_id)
}
