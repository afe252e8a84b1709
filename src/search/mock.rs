//! Mock gateway for exercising the controller without a network.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::client::ClientError;
use crate::normalize::NormalizedResponse;
use crate::search::ArtifactGateway;

/// A gateway returning canned responses, with optional latency and failure.
///
/// The configured delay honors cancellation the way a real request does:
/// a token fired mid-delay resolves as [`ClientError::Aborted`].
#[derive(Debug, Default)]
pub struct MockGateway {
    response: Mutex<Option<NormalizedResponse>>,
    failure: Mutex<Option<ClientError>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
    last_query: Mutex<Option<String>>,
}

impl MockGateway {
    /// Create a mock gateway with no canned response (searches resolve to an
    /// empty list).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response returned by subsequent searches.
    pub fn set_response(&self, response: NormalizedResponse) {
        *self.response.lock().unwrap() = Some(response);
    }

    /// Make subsequent searches fail with this error.
    pub fn set_failure(&self, error: ClientError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    /// Delay subsequent searches, cancellably.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Number of searches that reached this gateway.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The query of the most recent search.
    pub fn last_query(&self) -> Option<String> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactGateway for MockGateway {
    async fn quick_search(
        &self,
        query: &str,
        _page: u32,
        _per_page: u32,
        cancel: &CancellationToken,
    ) -> Result<NormalizedResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.to_string());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(ClientError::Aborted),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }

        match self.response.lock().unwrap().clone() {
            Some(response) => Ok(response),
            None => Ok(NormalizedResponse::empty()),
        }
    }
}

/// Helper to build a minimal raw artifact record for tests.
pub fn make_artifact(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "creators": [],
        "materials": [],
        "tags": [],
        "images": []
    })
}
