//! Shared testing utilities: an in-memory scripted transport and record fixtures.

use std::collections::HashMap;
use std::sync::Mutex;

use ertapi_common::transport::Transport;
use ertapi_common::{Record, TransportError};
use serde_json::Value;

pub use pretty_assertions::assert_eq;

/// What a [`ScriptedTransport`] answers for a URL.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Record),
    Raw(Vec<u8>),
    /// The server had nothing meaningful to return.
    Nothing,
    Fail(String),
}

/// Transport that serves canned replies per URL and counts every call.
/// Unscripted URLs fail loudly so tests never hit the network by accident.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(self, url: &str, body: Value) -> Self {
        self.script(url, Reply::Json(record(body)));
        self
    }

    pub fn with_raw(self, url: &str, body: &str) -> Self {
        self.script(url, Reply::Raw(body.as_bytes().to_vec()));
        self
    }

    pub fn with_nothing(self, url: &str) -> Self {
        self.script(url, Reply::Nothing);
        self
    }

    pub fn with_failure(self, url: &str, message: &str) -> Self {
        self.script(url, Reply::Fail(message.to_string()));
        self
    }

    /// Replace (or add) the reply for `url`.
    pub fn script(&self, url: &str, reply: Reply) {
        lock(&self.replies).insert(url.to_string(), reply);
    }

    /// Every URL requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        lock(&self.calls).iter().filter(|u| u.as_str() == url).count()
    }

    pub fn total_calls(&self) -> usize {
        lock(&self.calls).len()
    }

    fn reply(&self, url: &str) -> Result<Reply, TransportError> {
        lock(&self.calls).push(url.to_string());
        lock(&self.replies)
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Other(format!("no scripted reply for {url}")))
    }
}

impl Transport for ScriptedTransport {
    fn fetch_json(&self, url: &str) -> Result<Option<Record>, TransportError> {
        match self.reply(url)? {
            Reply::Json(record) => Ok(Some(record)),
            Reply::Nothing => Ok(None),
            Reply::Fail(message) => Err(TransportError::Other(message)),
            Reply::Raw(_) => Err(TransportError::Other(format!("{url} is scripted as raw"))),
        }
    }

    fn fetch_raw(&self, url: &str) -> Result<Option<Vec<u8>>, TransportError> {
        match self.reply(url)? {
            Reply::Raw(bytes) => Ok(Some(bytes)),
            Reply::Nothing => Ok(None),
            Reply::Fail(message) => Err(TransportError::Other(message)),
            Reply::Json(_) => Err(TransportError::Other(format!("{url} is scripted as JSON"))),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Convert a `json!` object literal into a [`Record`]. Panics on non-objects.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture is not a JSON object: {other}"),
    }
}

/// A small ensemble as the API would describe it after expansion.
pub fn ensemble_fixture() -> Record {
    record(serde_json::json!({
        "name": "default",
        "parameters": [
            { "key": "COEFFS:a", "group": "COEFFS", "ref_url": "/ensembles/0/parameters/0" },
            { "key": "COEFFS:b", "group": "COEFFS", "ref_url": "/ensembles/0/parameters/1" },
        ],
        "realizations": [
            { "name": "0", "status": "done", "ref_url": "/ensembles/0/realizations/0" },
            { "name": "1", "status": "failed", "ref_url": "/ensembles/0/realizations/1" },
        ],
        "responses": [
            { "name": "POLY_RES", "ref_url": "/ensembles/0/responses/POLY_RES" },
        ],
        "observations": [
            { "name": "POLY_OBS", "data_url": "/observations/POLY_OBS/values" },
        ],
    }))
}
