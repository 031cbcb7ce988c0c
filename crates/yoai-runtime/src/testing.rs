//! Shared fakes for unit tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Instant;

use yoai_core::{FileUpload, RawUpdate, Transport, TransportError, TransportResult, UpdateSource};
use yoai_framework::{Failure, FailureSink};

/// Records every JSON call and answers with an empty body.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    sent: Mutex<Vec<(String, Value)>>,
}

impl RecordingTransport {
    pub(crate) fn sent(&self) -> Vec<(String, Value)> {
        self.sent.lock().clone()
    }

    pub(crate) fn endpoints(&self) -> Vec<String> {
        self.sent().into_iter().map(|(endpoint, _)| endpoint).collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post_json(&self, endpoint: &str, body: Option<Value>) -> TransportResult<Option<Value>> {
        self.sent
            .lock()
            .push((endpoint.to_string(), body.unwrap_or(Value::Null)));
        Ok(None)
    }

    async fn post_multipart(
        &self,
        _endpoint: &str,
        _fields: Vec<(String, String)>,
        _files: Vec<FileUpload>,
    ) -> TransportResult<Option<Value>> {
        Ok(None)
    }
}

/// One scripted answer of a [`ScriptedSource`].
pub(crate) enum Step {
    Batch(Vec<RawUpdate>),
    Fail(TransportError),
    Panic,
}

/// Plays back a fixed script, then answers with empty batches.
///
/// Records the (virtual) instant of every fetch.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    script: Mutex<VecDeque<Step>>,
    fetches: Mutex<Vec<Instant>>,
}

impl ScriptedSource {
    pub(crate) fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            fetches: Mutex::default(),
        })
    }

    pub(crate) fn fetches(&self) -> Vec<Instant> {
        self.fetches.lock().clone()
    }
}

#[async_trait]
impl UpdateSource for ScriptedSource {
    async fn fetch_updates(&self) -> TransportResult<Vec<RawUpdate>> {
        self.fetches.lock().push(Instant::now());
        let step = self.script.lock().pop_front();
        match step {
            Some(Step::Batch(batch)) => Ok(batch),
            Some(Step::Fail(e)) => Err(e),
            Some(Step::Panic) => panic!("source exploded"),
            None => Ok(Vec::new()),
        }
    }
}

/// Keeps every reported failure.
#[derive(Default)]
pub(crate) struct CollectingSink {
    failures: Mutex<Vec<Failure>>,
}

impl CollectingSink {
    pub(crate) fn failures(&self) -> Vec<Failure> {
        self.failures.lock().clone()
    }
}

impl FailureSink for CollectingSink {
    fn report(&self, failure: &Failure) {
        self.failures.lock().push(failure.clone());
    }
}

pub(crate) fn request_error() -> TransportError {
    TransportError::Request {
        endpoint: "getUpdates".to_string(),
        reason: "connection refused".to_string(),
    }
}
