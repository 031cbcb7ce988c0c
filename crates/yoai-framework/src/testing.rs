//! Shared fakes for unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use yoai_core::{Bot, FileUpload, Transport, TransportResult};

use crate::report::{Failure, FailureSink};

/// Records every JSON body posted through it and answers with an empty body.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    sent: Mutex<Vec<(String, Value)>>,
}

impl RecordingTransport {
    pub(crate) fn sent(&self) -> Vec<(String, Value)> {
        self.sent.lock().clone()
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

pub(crate) fn recording_bot() -> (Arc<RecordingTransport>, Arc<Bot>) {
    let transport = Arc::new(RecordingTransport::default());
    let bot = Arc::new(Bot::new(transport.clone()));
    (transport, bot)
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
