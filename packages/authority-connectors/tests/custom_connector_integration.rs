//! Integration tests for a custom connector wired from configuration.
//!
//! A local register fronts a reconciliation service and Metagrid, all
//! served by one mock transport.

use std::sync::Arc;

use authority_connectors::testing::{MockConnector, MockConnectorCall, MockTransport};
use authority_connectors::{
    build_connector, Connector, ConnectorConfig, ConnectorError, CustomConfig, CustomConnector,
    ResultRecord,
};
use reqwest::Method;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

const LOCAL: &str = "http://localhost:8080/exist/apps/tei-publisher";
const RECONCILE: &str = "https://reconcile.example.org/gnd";
const METAGRID: &str = "https://metagrid.example.org";

fn config() -> ConnectorConfig {
    ConnectorConfig::from_json_str(&format!(
        r#"{{
            "connector": "custom",
            "endpoint": "{LOCAL}",
            "register": "person",
            "editable": true,
            "connectors": [
                {{"connector": "reconciliation", "endpoint": "{RECONCILE}", "prefix": "gnd"}},
                {{"connector": "metagrid", "baseUrl": "{METAGRID}", "limit": 5}}
            ]
        }}"#
    ))
    .unwrap()
}

fn custom_config() -> CustomConfig {
    match config() {
        ConnectorConfig::Custom(custom) => custom,
        other => panic!("expected a custom config, got {:?}", other),
    }
}

fn local_url(path: &str) -> String {
    format!("{}/api/register/person{}", LOCAL, path)
}

/// Transport answering the manifest and both remote searches for "Goethe".
fn remote_services() -> MockTransport {
    MockTransport::new()
        .on_get(
            RECONCILE,
            json!({
                "name": "GND reconciliation",
                "versions": ["0.2", "0.3"],
                "view": {"url": "https://d-nb.info/gnd/{{id}}"},
                "preview": {"url": "https://preview.example.org/{{id}}", "width": 400, "height": 120}
            }),
        )
        .on_post(
            RECONCILE,
            json!({"results": [{"candidates": [
                {"id": "118540238", "name": "Goethe, Johann Wolfgang von", "score": 98.0,
                 "type": [{"name": "Person"}]},
                {"id": "1153433", "name": "Goethe, Cornelia", "score": 41.0}
            ]}]}),
        )
        .on_get(
            format!("{}/search?query=Goethe&skip=0&take=5", METAGRID),
            json!({"resources": [{
                "identifier": "77",
                "uri": "https://sikart.example.org/77",
                "provider": {"slug": "sikart"},
                "metadata": {"first_name": "Johann Wolfgang", "last_name": "Goethe"}
            }]}),
        )
}

#[tokio::test]
async fn test_query_merges_local_and_remote_results() {
    let transport = remote_services().on_get(
        local_url("?query=Goethe"),
        json!([{"id": "gnd-118540238", "label": "Goethe (edited)", "details": "1749-1832"}]),
    );
    let connector = assert_ok!(build_connector(config(), Arc::new(transport)));
    assert_ok!(connector.ready().await);

    let results = assert_ok!(connector.query("Goethe").await);

    let ids: Vec<&str> = results.items.iter().map(|i| i.id()).collect();
    assert_eq!(ids, vec!["gnd-118540238", "gnd-1153433", "sikart-77"]);
    assert_eq!(results.items[0].label(), "Goethe (edited)");
    assert_eq!(results.items[0].provider(), "local");
    assert_eq!(results.items[1].provider(), "Reconciliation");
    assert_eq!(results.items[2].provider(), "sikart");
    // The duplicate GND hit is counted but not listed.
    assert_eq!(results.total_items, 4);
    assert!(results.items.iter().all(|i| i.register() == "person"));
}

#[tokio::test]
async fn test_query_survives_broken_remote() {
    let transport = remote_services()
        .with_response(Method::POST, RECONCILE, 502, "bad gateway")
        .on_get(local_url("?query=Goethe"), json!({"items": []}));
    let connector = assert_ok!(build_connector(config(), Arc::new(transport)));
    assert_ok!(connector.ready().await);

    let results = assert_ok!(connector.query("Goethe").await);
    assert_eq!(results.items.len(), 1);
    assert_eq!(results.items[0].id(), "sikart-77");
}

#[tokio::test]
async fn test_query_fails_without_local_register() {
    let transport = remote_services().with_failure(
        Method::GET,
        local_url("?query=Goethe"),
        "connection refused",
    );
    let connector = assert_ok!(build_connector(config(), Arc::new(transport.clone())));
    assert_ok!(connector.ready().await);

    let err = assert_err!(connector.query("Goethe").await);
    assert!(matches!(err, ConnectorError::Transport(_)));
    assert!(transport.requests_to(RECONCILE).iter().all(|r| r.method == Method::GET));
}

#[tokio::test]
async fn test_info_falls_back_to_remote_preview() {
    let transport = remote_services()
        .with_response(Method::GET, local_url("/gnd-118540238"), 404, "")
        .with_response(
            Method::GET,
            "https://preview.example.org/118540238",
            200,
            "<div>Goethe, Johann Wolfgang von</div>",
        );
    let connector = assert_ok!(build_connector(config(), Arc::new(transport)));
    assert_ok!(connector.ready().await);

    let mut preview = String::new();
    let descriptor = assert_ok!(connector.info("gnd-118540238", &mut preview).await);

    assert_eq!(descriptor.id.as_deref(), Some("gnd-118540238"));
    assert_eq!(preview, "<div>Goethe, Johann Wolfgang von</div>");
}

#[tokio::test]
async fn test_select_copies_reconciled_record() {
    let transport = remote_services().with_response(
        Method::POST,
        local_url("/gnd-118540238"),
        201,
        "",
    );
    let connector = assert_ok!(CustomConnector::new(
        custom_config(),
        Arc::new(transport.clone())
    ));
    assert_ok!(connector.ready().await);
    assert!(connector.editable());

    let item = ResultRecord::new("person", "gnd-118540238", "Goethe", "Reconciliation");
    let record = assert_ok!(connector.select(&item).await);
    assert_eq!(record["id"], "gnd-118540238");
    assert_eq!(record["link"], "https://d-nb.info/gnd/118540238");

    let stored = transport.requests_to(&local_url("/gnd-118540238"));
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].header_value("content-type"), Some("application/json"));
    let body: Value = serde_json::from_str(stored[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(body, record);
}

#[tokio::test]
async fn test_select_follows_configured_order() {
    let transport = MockTransport::new().with_response(Method::POST, local_url("/x-1"), 200, "");
    let b = MockConnector::new("b").with_record("x-1", json!({"id": "x-1", "source": "b"}));
    let a = MockConnector::new("a").with_record("x-1", json!({"id": "x-1", "source": "a"}));
    let a_calls = a.clone();

    let connector = assert_ok!(CustomConnector::new(
        CustomConfig::new(LOCAL, "person").with_editable(true),
        Arc::new(transport.clone()),
    ))
    .with_connector(Box::new(b))
    .with_connector(Box::new(a));

    let record = assert_ok!(connector.select_id("x-1").await);
    assert_eq!(record["source"], "b");
    assert!(a_calls.calls().is_empty());

    let body: Value =
        serde_json::from_str(transport.requests()[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(body["source"], "b");
}

#[tokio::test]
async fn test_select_reports_missing_record() {
    let transport = MockTransport::new();
    let empty = MockConnector::new("empty");
    let calls = empty.clone();
    let connector = assert_ok!(CustomConnector::new(
        CustomConfig::new(LOCAL, "person"),
        Arc::new(transport.clone()),
    ))
    .with_connector(Box::new(empty));

    let err = assert_err!(connector.select_id("gnd-0").await);
    assert!(matches!(err, ConnectorError::NoRecordFound { ref id } if id == "gnd-0"));
    assert_eq!(
        calls.calls(),
        vec![MockConnectorCall::GetRecord { key: "gnd-0".into() }]
    );
    assert!(transport.requests().is_empty());
}
