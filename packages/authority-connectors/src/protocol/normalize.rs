//! Response parsing for each protocol revision.
//!
//! Legacy services answer `{"q0": {"result": [...]}}` and keep every type;
//! the newest draft answers `{"results": [{"candidates": [...]}]}`, adds a
//! `score`, and only the first type's name is kept.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::Protocol;
use crate::error::{ConnectorError, Result};
use crate::types::record::{
    describe, fill_template, EntityType, IdPrefix, ResultRecord, ResultSet, TypeRef,
    RECONCILIATION_PROVIDER,
};

/// Per-connector values every record is stamped with.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    pub register: &'a str,
    pub prefix: &'a IdPrefix,
    pub view_template: Option<&'a str>,
}

/// One candidate as sent on the wire (both revisions share the item shape).
#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    types: Option<Vec<TypeRef>>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

/// Parse a raw reconciliation response into records.
///
/// Missing nesting is an error rather than an empty result, since an empty
/// set would read as "no matches".
pub fn parse_response(
    protocol: Protocol,
    response: &Value,
    ctx: NormalizeContext<'_>,
) -> Result<ResultSet> {
    let raw_items = match protocol {
        Protocol::Legacy => response
            .get("q0")
            .and_then(|q| q.get("result"))
            .and_then(Value::as_array)
            .ok_or_else(|| ConnectorError::MalformedResponse("missing q0.result array".into()))?,
        Protocol::Draft => response
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
            .and_then(|first| first.get("candidates"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ConnectorError::MalformedResponse("missing results[0].candidates array".into())
            })?,
    };

    let items = raw_items
        .iter()
        .map(|item| {
            let candidate = Candidate::deserialize(item).map_err(|e| {
                ConnectorError::MalformedResponse(format!("invalid candidate: {}", e))
            })?;
            Ok(to_record(protocol, candidate, ctx))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ResultSet::from_items(items))
}

fn to_record(protocol: Protocol, candidate: Candidate, ctx: NormalizeContext<'_>) -> ResultRecord {
    let types = candidate.types.unwrap_or_default();
    let type_names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
    let details = describe(candidate.description.as_deref(), &type_names);
    let link = match ctx.view_template {
        Some(template) => fill_template(template, &candidate.id),
        None => candidate.id.clone(),
    };

    let record = ResultRecord::new(
        ctx.register,
        ctx.prefix.apply(&candidate.id),
        candidate.name.unwrap_or_default(),
        RECONCILIATION_PROVIDER,
    )
    .with_details(details)
    .with_link(link);

    match protocol {
        Protocol::Legacy => {
            if types.is_empty() {
                record
            } else {
                record.with_type(EntityType::List(types))
            }
        }
        Protocol::Draft => {
            let record = match types.first() {
                Some(first) => record.with_type(EntityType::Name(first.name.clone())),
                None => record,
            };
            match candidate.score {
                Some(score) => record.with_score(score),
                None => record,
            }
        }
    }
}

/// Accept ids sent either as strings or as JSON numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx<'a>(prefix: &'a IdPrefix, view: Option<&'a str>) -> NormalizeContext<'a> {
        NormalizeContext {
            register: "person",
            prefix,
            view_template: view,
        }
    }

    #[test]
    fn test_legacy_type_fallback() {
        let response = json!({"q0": {"result": [{"id": "a", "name": "X", "type": [{"name": "Person"}]}]}});
        let prefix = IdPrefix::none();

        let set = parse_response(Protocol::Legacy, &response, ctx(&prefix, None)).unwrap();

        assert_eq!(set.total_items, 1);
        let record = &set.items[0];
        assert_eq!(record.details(), "Person");
        assert_eq!(record.label(), "X");
        assert_eq!(record.link(), "a");
        assert_eq!(record.provider(), "Reconciliation");
        assert_eq!(record.register(), "person");
        assert_eq!(record.score(), None);
        assert_eq!(
            record.entity_type(),
            Some(&EntityType::List(vec![TypeRef {
                id: None,
                name: "Person".into()
            }]))
        );
    }

    #[test]
    fn test_description_wins_over_types() {
        let response = json!({"q0": {"result": [{
            "id": "a",
            "name": "X",
            "description": "German poet",
            "type": [{"name": "Person"}]
        }]}});
        let prefix = IdPrefix::none();

        let set = parse_response(Protocol::Legacy, &response, ctx(&prefix, None)).unwrap();
        assert_eq!(set.items[0].details(), "German poet");
    }

    #[test]
    fn test_legacy_keeps_all_types_and_drops_score() {
        let response = json!({"q0": {"result": [{
            "id": "1",
            "name": "Weimar",
            "score": 88.0,
            "type": [{"id": "P", "name": "Place"}, {"id": "C", "name": "City"}]
        }]}});
        let prefix = IdPrefix::none();

        let set = parse_response(Protocol::Legacy, &response, ctx(&prefix, None)).unwrap();
        let record = &set.items[0];
        assert_eq!(record.details(), "Place, City");
        assert_eq!(record.score(), None);
        assert!(matches!(record.entity_type(), Some(EntityType::List(types)) if types.len() == 2));
    }

    #[test]
    fn test_draft_narrows_type_and_keeps_score() {
        let response = json!({"results": [{"candidates": [{
            "id": "118540238",
            "name": "Goethe, Johann Wolfgang von",
            "score": 97.5,
            "type": [{"id": "DifferentiatedPerson", "name": "Person"}, {"name": "Author"}]
        }]}]});
        let prefix = IdPrefix::new(Some("gnd".into()));

        let set = parse_response(
            Protocol::Draft,
            &response,
            ctx(&prefix, Some("https://d-nb.info/gnd/{{id}}")),
        )
        .unwrap();

        let record = &set.items[0];
        assert_eq!(record.id(), "gnd-118540238");
        assert_eq!(record.link(), "https://d-nb.info/gnd/118540238");
        assert_eq!(record.score(), Some(97.5));
        assert_eq!(record.entity_type(), Some(&EntityType::Name("Person".into())));
        assert_eq!(record.details(), "Person, Author");
    }

    #[test]
    fn test_numeric_ids_are_accepted() {
        let response = json!({"results": [{"candidates": [{"id": 42, "name": "X"}]}]});
        let prefix = IdPrefix::none();

        let set = parse_response(Protocol::Draft, &response, ctx(&prefix, None)).unwrap();
        assert_eq!(set.items[0].id(), "42");
        assert_eq!(set.items[0].details(), "");
        assert_eq!(set.items[0].entity_type(), None);
    }

    #[test]
    fn test_total_items_counts_produced_items() {
        let response = json!({"q0": {"result": [
            {"id": "a", "name": "A"},
            {"id": "b", "name": "B"}
        ], "total": 250}});
        let prefix = IdPrefix::none();

        let set = parse_response(Protocol::Legacy, &response, ctx(&prefix, None)).unwrap();
        assert_eq!(set.total_items, 2);
        assert_eq!(set.items.len(), 2);
    }

    #[test]
    fn test_empty_result_is_not_malformed() {
        let response = json!({"q0": {"result": []}});
        let prefix = IdPrefix::none();

        let set = parse_response(Protocol::Legacy, &response, ctx(&prefix, None)).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.total_items, 0);
    }

    #[test]
    fn test_missing_nesting_fails_loudly() {
        let prefix = IdPrefix::none();

        let legacy_shape = json!({"q0": {"result": []}});
        assert!(matches!(
            parse_response(Protocol::Draft, &legacy_shape, ctx(&prefix, None)),
            Err(ConnectorError::MalformedResponse(_))
        ));

        let draft_shape = json!({"results": [{"candidates": []}]});
        assert!(matches!(
            parse_response(Protocol::Legacy, &draft_shape, ctx(&prefix, None)),
            Err(ConnectorError::MalformedResponse(_))
        ));

        assert!(matches!(
            parse_response(Protocol::Draft, &json!({"results": []}), ctx(&prefix, None)),
            Err(ConnectorError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_candidate_without_id_fails() {
        let response = json!({"q0": {"result": [{"name": "Nameless"}]}});
        let prefix = IdPrefix::none();

        assert!(matches!(
            parse_response(Protocol::Legacy, &response, ctx(&prefix, None)),
            Err(ConnectorError::MalformedResponse(_))
        ));
    }
}
