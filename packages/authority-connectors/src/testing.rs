//! Testing utilities including mock implementations.
//!
//! These are useful for testing code built on the connectors without making
//! real network calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use reqwest::Method;
use serde_json::Value;

use crate::error::{ConnectorError, Result};
use crate::traits::connector::{Connector, RawRecord};
use crate::traits::surface::DisplaySurface;
use crate::traits::transport::{HttpRequest, HttpResponse, Transport};
use crate::types::record::{Descriptor, ResultRecord, ResultSet};

/// Canned behavior for one (method, url) pair.
#[derive(Debug, Clone)]
enum Reply {
    Respond { status: u16, body: String },
    Fail(String),
    /// Never completes.
    Hang,
}

/// A mock transport with canned replies keyed by method and url.
///
/// Requests without a canned reply fail with a transport error. Every
/// request is recorded.
///
/// # Example
///
/// ```rust
/// use authority_connectors::testing::MockTransport;
/// use serde_json::json;
///
/// let transport = MockTransport::new()
///     .on_get("https://example.org/reconcile", json!({"versions": ["0.2"]}));
/// ```
#[derive(Default)]
pub struct MockTransport {
    replies: Arc<RwLock<HashMap<(Method, String), Reply>>>,
    requests: Arc<RwLock<Vec<HttpRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_reply(self, method: Method, url: impl Into<String>, reply: Reply) -> Self {
        self.replies.write().unwrap().insert((method, url.into()), reply);
        self
    }

    /// Answer GET `url` with a 200 JSON body.
    pub fn on_get(self, url: impl Into<String>, body: Value) -> Self {
        self.with_response(Method::GET, url, 200, body.to_string())
    }

    /// Answer POST `url` with a 200 JSON body.
    pub fn on_post(self, url: impl Into<String>, body: Value) -> Self {
        self.with_response(Method::POST, url, 200, body.to_string())
    }

    /// Answer with an arbitrary status and body.
    pub fn with_response(
        self,
        method: Method,
        url: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        self.with_reply(
            method,
            url,
            Reply::Respond {
                status,
                body: body.into(),
            },
        )
    }

    /// Fail the request at the transport level.
    pub fn with_failure(self, method: Method, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.with_reply(method, url, Reply::Fail(message.into()))
    }

    /// Never answer the request.
    pub fn with_hanging(self, method: Method, url: impl Into<String>) -> Self {
        self.with_reply(method, url, Reply::Hang)
    }

    /// All requests sent so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.read().unwrap().clone()
    }

    /// Requests sent to `url`, any method.
    pub fn requests_to(&self, url: &str) -> Vec<HttpRequest> {
        self.requests
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .cloned()
            .collect()
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            replies: Arc::clone(&self.replies),
            requests: Arc::clone(&self.requests),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let key = (request.method.clone(), request.url.clone());
        let url = request.url.clone();
        self.requests.write().unwrap().push(request);

        let reply = self.replies.read().unwrap().get(&key).cloned();
        match reply {
            Some(Reply::Respond { status, body }) => Ok(HttpResponse::new(url, status, body)),
            Some(Reply::Fail(message)) => Err(ConnectorError::Transport(message)),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(ConnectorError::Transport(format!(
                "no mock reply for {} {}",
                key.0, url
            ))),
        }
    }
}

/// A mock connector with canned results per key.
///
/// Unknown query keys yield an empty set, unknown info ids an empty
/// descriptor, unknown records `NotFound`.
#[derive(Default)]
pub struct MockConnector {
    name: String,
    register: String,
    results: Arc<RwLock<HashMap<String, ResultSet>>>,
    previews: Arc<RwLock<HashMap<String, String>>>,
    records: Arc<RwLock<HashMap<String, RawRecord>>>,
    failing: bool,
    calls: Arc<RwLock<Vec<MockConnectorCall>>>,
}

/// Record of a call made to the mock connector.
#[derive(Debug, Clone, PartialEq)]
pub enum MockConnectorCall {
    Query { key: String },
    Info { id: String },
    GetRecord { key: String },
}

impl MockConnector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_register(mut self, register: impl Into<String>) -> Self {
        self.register = register.into();
        self
    }

    /// Answer `key` with these items; the total equals their count.
    pub fn with_results(self, key: impl Into<String>, items: Vec<ResultRecord>) -> Self {
        self.with_result_set(key, ResultSet::from_items(items))
    }

    /// Answer `key` with a result set whose total may exceed its items.
    pub fn with_result_set(self, key: impl Into<String>, results: ResultSet) -> Self {
        self.results.write().unwrap().insert(key.into(), results);
        self
    }

    /// Render `markup` and resolve `id` when asked for its info.
    pub fn with_preview(self, id: impl Into<String>, markup: impl Into<String>) -> Self {
        self.previews.write().unwrap().insert(id.into(), markup.into());
        self
    }

    pub fn with_record(self, key: impl Into<String>, record: RawRecord) -> Self {
        self.records.write().unwrap().insert(key.into(), record);
        self
    }

    /// Fail every operation with a transport error.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn calls(&self) -> Vec<MockConnectorCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    fn record_call(&self, call: MockConnectorCall) -> Result<()> {
        self.calls.write().unwrap().push(call);
        if self.failing {
            return Err(ConnectorError::Transport(format!("{} is unavailable", self.name)));
        }
        Ok(())
    }
}

impl Clone for MockConnector {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            register: self.register.clone(),
            results: Arc::clone(&self.results),
            previews: Arc::clone(&self.previews),
            records: Arc::clone(&self.records),
            failing: self.failing,
            calls: Arc::clone(&self.calls),
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn register(&self) -> &str {
        &self.register
    }

    async fn query(&self, key: &str) -> Result<ResultSet> {
        self.record_call(MockConnectorCall::Query { key: key.to_string() })?;
        Ok(self.results.read().unwrap().get(key).cloned().unwrap_or_default())
    }

    async fn info(&self, id: &str, container: &mut dyn DisplaySurface) -> Result<Descriptor> {
        self.record_call(MockConnectorCall::Info { id: id.to_string() })?;
        let markup = self.previews.read().unwrap().get(id).cloned();
        match markup {
            Some(markup) => {
                container.render(markup);
                Ok(Descriptor::new(id))
            }
            None => Ok(Descriptor::empty()),
        }
    }

    async fn get_record(&self, key: &str) -> Result<RawRecord> {
        self.record_call(MockConnectorCall::GetRecord { key: key.to_string() })?;
        self.records
            .read()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| ConnectorError::NotFound(format!("{} in {}", key, self.name)))
    }
}
