//! Debounced, cancellable search orchestration.
//!
//! [`SearchController`] owns the pipeline from raw keystrokes to published
//! state: it debounces term changes, cancels superseded in-flight requests,
//! runs the gateway -> normalizer -> formatter chain, and surfaces
//! loading/error/result snapshots over a watch channel.
//!
//! Supersession uses a generation counter: every term change bumps the
//! generation and cancels the previous request's token; a settling request
//! compares generations before touching shared state, so a stale response,
//! however slow, can never flip the loading flag or surface data after a
//! newer request has settled.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::client::{ApiClient, ClientError};
use crate::config::SearchConfig;
use crate::display::format_list_response;
use crate::errors::{log_error, FormattedError};
use crate::models::{FormattedArtifact, DEFAULT_PAGE};
use crate::normalize::NormalizedResponse;

pub mod mock;

pub use mock::MockGateway;

/// Backend seam for executing searches.
///
/// Implemented by [`ApiClient`] for real traffic and by
/// [`mock::MockGateway`] for tests.
#[async_trait]
pub trait ArtifactGateway: Send + Sync + std::fmt::Debug {
    /// Quick text search over the catalog.
    async fn quick_search(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
        cancel: &CancellationToken,
    ) -> Result<NormalizedResponse, ClientError>;
}

#[async_trait]
impl ArtifactGateway for ApiClient {
    async fn quick_search(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
        cancel: &CancellationToken,
    ) -> Result<NormalizedResponse, ClientError> {
        ApiClient::quick_search(self, query, page, per_page, Some(cancel)).await
    }
}

/// Tuning knobs for the controller.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Quiescence interval before a changed term is dispatched.
    pub debounce: Duration,

    /// Trimmed terms must be strictly longer than this to trigger a request;
    /// anything at or below resets straight to idle.
    pub min_search_length: usize,

    /// Page requested by controller searches.
    pub page: u32,

    /// Page size requested by controller searches.
    pub per_page: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        let config = SearchConfig::default();
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            min_search_length: config.min_search_length,
            page: DEFAULT_PAGE,
            per_page: config.per_page,
        }
    }
}

impl From<&SearchConfig> for SearchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            min_search_length: config.min_search_length,
            page: DEFAULT_PAGE,
            per_page: config.per_page,
        }
    }
}

/// Snapshot of controller state surfaced to the UI layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSnapshot {
    /// The raw term as last fed in.
    pub search_term: String,

    /// Formatted results of the last settled search, if any.
    pub data: Option<Vec<FormattedArtifact>>,

    pub is_loading: bool,

    /// Classified error of the last settled search, if it failed.
    pub error: Option<FormattedError>,
}

/// Orchestrating state machine for interactive search.
///
/// At most one non-cancelled request is ever in flight. Created once per UI
/// session; term changes are fed through [`Self::set_search_term`] and state
/// is observed via [`Self::subscribe`] or [`Self::snapshot`].
#[derive(Debug)]
pub struct SearchController {
    inner: Arc<Inner>,
}

struct Inner {
    gateway: Arc<dyn ArtifactGateway>,
    options: SearchOptions,
    /// Bumped on every term change; settled work must still match to apply.
    generation: AtomicU64,
    /// Token of the in-flight request, keyed by its generation.
    in_flight: Mutex<Option<(u64, CancellationToken)>>,
    state: watch::Sender<SearchSnapshot>,
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner")
            .field("gateway", &self.gateway)
            .field("options", &self.options)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl SearchController {
    pub fn new(gateway: Arc<dyn ArtifactGateway>, options: SearchOptions) -> Self {
        let (state, _) = watch::channel(SearchSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                gateway,
                options,
                generation: AtomicU64::new(0),
                in_flight: Mutex::new(None),
                state,
            }),
        }
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.inner.state.subscribe()
    }

    /// Current state.
    pub fn snapshot(&self) -> SearchSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Feed a new raw search term.
    ///
    /// Supersedes any debouncing or in-flight search. Terms whose trimmed
    /// length is at or below the minimum reset the state to idle without a
    /// request. Must be called within a Tokio runtime.
    pub fn set_search_term(&self, term: &str) {
        let inner = Arc::clone(&self.inner);
        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        inner.cancel_in_flight();

        let trimmed = term.trim().to_string();

        if trimmed.len() <= inner.options.min_search_length {
            tracing::debug!(%term, "term below threshold; resetting to idle");
            inner.state.send_replace(SearchSnapshot {
                search_term: term.to_string(),
                data: None,
                is_loading: false,
                error: None,
            });
            return;
        }

        let term = term.to_string();
        inner
            .state
            .send_modify(|snapshot| snapshot.search_term = term.clone());

        tokio::spawn(async move {
            tokio::time::sleep(inner.options.debounce).await;
            if !inner.is_current(generation) {
                // Superseded while debouncing; the newer term owns the state.
                return;
            }
            inner.run_search(generation, trimmed).await;
        });
    }

    /// Cancel any in-flight work and invalidate pending resolutions.
    pub fn shutdown(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.cancel_in_flight();
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Inner {
    fn cancel_in_flight(&self) {
        let taken = self.in_flight.lock().unwrap().take();
        if let Some((generation, token)) = taken {
            tracing::trace!(generation, "cancelling in-flight request");
            token.cancel();
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn run_search(self: Arc<Self>, generation: u64, query: String) {
        let token = CancellationToken::new();
        {
            let mut guard = self.in_flight.lock().unwrap();
            if let Some((_, previous)) = guard.replace((generation, token.clone())) {
                previous.cancel();
            }
        }

        self.state.send_modify(|snapshot| {
            snapshot.is_loading = true;
            snapshot.error = None;
        });
        tracing::debug!(%query, generation, "dispatching search");

        let result = self
            .gateway
            .quick_search(&query, self.options.page, self.options.per_page, &token)
            .await;

        match result {
            Err(ClientError::Aborted) => {
                // Cancellation is not an error; a superseded request
                // resolves silently with no state mutation.
                tracing::trace!(%query, generation, "search aborted");
            }
            Ok(response) => {
                let formatted = format_list_response(&response);
                self.settle(generation, |snapshot| {
                    snapshot.data = Some(formatted.items.clone());
                    snapshot.is_loading = false;
                    snapshot.error = None;
                });
            }
            Err(error) => {
                let formatted = FormattedError::from_error(&error);
                log_error(&formatted, "search");
                self.settle(generation, |snapshot| {
                    snapshot.data = None;
                    snapshot.is_loading = false;
                    snapshot.error = Some(formatted.clone());
                });
            }
        }

        // Release the handle only if it is still ours.
        let mut guard = self.in_flight.lock().unwrap();
        if matches!(&*guard, Some((owner, _)) if *owner == generation) {
            *guard = None;
        }
    }

    /// Apply a state mutation only while `generation` is still the latest;
    /// the check runs inside the watch lock so a stale request can never
    /// clobber a newer one's settled state.
    fn settle(&self, generation: u64, apply: impl Fn(&mut SearchSnapshot)) {
        self.state.send_if_modified(|snapshot| {
            if !self.is_current(generation) {
                tracing::trace!(generation, "discarding superseded result");
                return false;
            }
            apply(snapshot);
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::search::mock::{make_artifact, MockGateway};
    use serde_json::json;

    fn test_options(debounce_ms: u64) -> SearchOptions {
        SearchOptions {
            debounce: Duration::from_millis(debounce_ms),
            ..SearchOptions::default()
        }
    }

    fn controller_with(
        gateway: Arc<MockGateway>,
        debounce_ms: u64,
    ) -> (SearchController, Arc<MockGateway>) {
        let controller = SearchController::new(gateway.clone(), test_options(debounce_ms));
        (controller, gateway)
    }

    async fn settled(rx: &mut watch::Receiver<SearchSnapshot>) -> SearchSnapshot {
        loop {
            rx.changed().await.expect("controller alive");
            let snapshot = rx.borrow().clone();
            if !snapshot.is_loading && (snapshot.data.is_some() || snapshot.error.is_some()) {
                return snapshot;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn successful_search_publishes_formatted_data() {
        let gateway = Arc::new(MockGateway::new());
        gateway.set_response(NormalizedResponse::List {
            items: vec![make_artifact(1, "Vase"), make_artifact(2, "Bust")],
            meta: json!({}),
        });
        let (controller, gateway) = controller_with(gateway, 500);
        let mut rx = controller.subscribe();

        controller.set_search_term("vases of rome");
        let snapshot = settled(&mut rx).await;

        let data = snapshot.data.expect("data populated");
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].name, "Vase");
        assert!(snapshot.error.is_none());
        assert!(!snapshot.is_loading);
        assert_eq!(gateway.calls(), 1);
        assert_eq!(gateway.last_query().as_deref(), Some("vases of rome"));
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_term_changes_dispatch_only_the_last() {
        let (controller, gateway) = controller_with(Arc::new(MockGateway::new()), 500);
        let mut rx = controller.subscribe();

        controller.set_search_term("a");
        controller.set_search_term("ab");
        controller.set_search_term("abc");

        let snapshot = settled(&mut rx).await;
        assert_eq!(snapshot.search_term, "abc");
        assert_eq!(gateway.calls(), 1);
        assert_eq!(gateway.last_query().as_deref(), Some("abc"));
    }

    #[tokio::test(start_paused = true)]
    async fn short_terms_reset_to_idle_without_requests() {
        let (controller, gateway) = controller_with(Arc::new(MockGateway::new()), 500);

        controller.set_search_term("a");
        // Let any (wrongly) scheduled work run.
        tokio::time::sleep(Duration::from_millis(600)).await;

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.search_term, "a");
        assert!(snapshot.data.is_none());
        assert!(snapshot.error.is_none());
        assert!(!snapshot.is_loading);
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_while_pending_goes_idle_and_stays_idle() {
        let gateway = Arc::new(MockGateway::new());
        gateway.set_delay(Duration::from_millis(2_000));
        gateway.set_response(NormalizedResponse::List {
            items: vec![make_artifact(1, "Vase")],
            meta: json!({}),
        });
        let (controller, gateway) = controller_with(gateway, 500);
        let mut rx = controller.subscribe();

        controller.set_search_term("amphora");

        // Wait until the request is actually in flight.
        loop {
            rx.changed().await.expect("controller alive");
            if rx.borrow().is_loading {
                break;
            }
        }

        controller.set_search_term("");
        let snapshot = controller.snapshot();
        assert!(!snapshot.is_loading);
        assert!(snapshot.data.is_none());

        // Give the cancelled request every chance to settle wrongly.
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.search_term, "");
        assert!(snapshot.data.is_none());
        assert!(snapshot.error.is_none());
        assert!(!snapshot.is_loading);
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn supersession_discards_slow_earlier_request() {
        let gateway = Arc::new(MockGateway::new());
        gateway.set_delay(Duration::from_millis(2_000));
        gateway.set_response(NormalizedResponse::List {
            items: vec![make_artifact(1, "Old")],
            meta: json!({}),
        });
        let (controller, gateway) = controller_with(gateway, 100);
        let mut rx = controller.subscribe();

        controller.set_search_term("first term");
        loop {
            rx.changed().await.expect("controller alive");
            if rx.borrow().is_loading {
                break;
            }
        }

        // Supersede while in flight; the second request resolves normally.
        gateway.set_delay(Duration::from_millis(10));
        gateway.set_response(NormalizedResponse::List {
            items: vec![make_artifact(2, "New")],
            meta: json!({}),
        });
        controller.set_search_term("second term");

        let snapshot = settled(&mut rx).await;
        let data = snapshot.data.expect("data populated");
        assert_eq!(data[0].name, "New");
        assert_eq!(snapshot.search_term, "second term");

        // The first request was cancelled before dispatch completion wrote
        // anything; nothing flips after its delay elapses either.
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.data.expect("data kept")[0].name, "New");
        assert!(!snapshot.is_loading);
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_surface_classified_errors() {
        let gateway = Arc::new(MockGateway::new());
        gateway.set_failure(ClientError::Http {
            status: 503,
            status_text: "Service Unavailable".to_string(),
            details: "No details".to_string(),
        });
        let (controller, _gateway) = controller_with(gateway, 500);
        let mut rx = controller.subscribe();

        controller.set_search_term("broken");
        let snapshot = settled(&mut rx).await;

        let error = snapshot.error.expect("error surfaced");
        assert_eq!(error.kind, ErrorKind::ServerError);
        assert!(error.is_retryable);
        assert!(snapshot.data.is_none());
        assert!(!snapshot.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_in_flight_work() {
        let gateway = Arc::new(MockGateway::new());
        gateway.set_delay(Duration::from_millis(2_000));
        let (controller, gateway) = controller_with(gateway, 100);
        let mut rx = controller.subscribe();

        controller.set_search_term("torso");
        loop {
            rx.changed().await.expect("controller alive");
            if rx.borrow().is_loading {
                break;
            }
        }

        controller.shutdown();
        tokio::time::sleep(Duration::from_millis(5_000)).await;

        // The aborted request settles silently; loading was last set by a
        // request that is no longer current, so state shows what shutdown
        // left behind and no data or error ever appears.
        let snapshot = controller.snapshot();
        assert!(snapshot.data.is_none());
        assert!(snapshot.error.is_none());
        assert_eq!(gateway.calls(), 1);
    }
}
