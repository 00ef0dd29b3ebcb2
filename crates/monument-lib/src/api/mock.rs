//! In-memory transport for client and session tests

use super::HttpTransport;
use crate::{CatalogueError, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// A request the mock received
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Recorded {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl Recorded {
    pub(crate) fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Serves canned bodies keyed by path; unknown paths fail with a network error
#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<HashMap<String, std::result::Result<String, String>>>,
    requests: Mutex<Vec<Recorded>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(self, path: &str, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), Ok(body.to_string()));
        self
    }

    pub(crate) fn fail(self, path: &str, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), Err(message.to_string()));
        self
    }

    pub(crate) fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn answer(&self, recorded: Recorded) -> Result<Vec<u8>> {
        let reply = self.responses.lock().unwrap().get(&recorded.path).cloned();
        let path = recorded.path.clone();
        self.requests.lock().unwrap().push(recorded);
        match reply {
            Some(Ok(body)) => Ok(body.into_bytes()),
            Some(Err(message)) => Err(CatalogueError::Network(message)),
            None => Err(CatalogueError::Network(format!("HTTP 404 from {path}"))),
        }
    }
}

impl HttpTransport for MockTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Vec<u8>> {
        self.answer(Recorded {
            path: path.to_string(),
            query: query.to_vec(),
            body: None,
        })
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<Vec<u8>> {
        self.answer(Recorded {
            path: path.to_string(),
            query: Vec::new(),
            body: Some(body.clone()),
        })
    }

    fn base_url(&self) -> &str {
        "http://catalogue.test/api"
    }
}
