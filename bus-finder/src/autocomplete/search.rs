//! Debounced address search.
//!
//! Every query change invalidates the lookups issued so far and restarts
//! the debounce timer. When the timer fires a lookup is issued under a new
//! generation; its response is applied only if no later change happened in
//! the meantime.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use crate::api::BusApi;
use crate::config::SessionConfig;
use crate::domain::Address;
use crate::error::{NetworkError, ValidationError};
use crate::generation::GenerationGate;
use crate::task::ScopedTask;

use super::suggestions::{Key, KeyOutcome, SuggestionList};

const SEARCH_FAILED: &str = "Failed to search addresses";

/// Snapshot of the autocomplete box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutocompleteView {
    pub query: String,
    pub suggestions: Vec<Address>,
    pub highlighted: Option<usize>,
    pub open: bool,
    /// A lookup for the current query is outstanding.
    pub loading: bool,
    pub error: Option<NetworkError>,
}

#[derive(Default)]
struct Inner {
    query: String,
    list: SuggestionList,
    gate: GenerationGate,
    error: Option<NetworkError>,
    /// Bumped on every change; a scheduled lookup only runs if it still
    /// holds the latest value.
    schedule: u64,
}

impl Inner {
    fn reschedule(&mut self) -> u64 {
        self.schedule += 1;
        self.schedule
    }
}

struct Shared<A> {
    api: Arc<A>,
    limit: usize,
    min_chars: usize,
    inner: Mutex<Inner>,
    view: watch::Sender<AutocompleteView>,
}

/// Address autocomplete over [`BusApi::search_addresses`].
pub struct AddressAutocomplete<A> {
    shared: Arc<Shared<A>>,
    debounce: Duration,
    timer: Mutex<Option<ScopedTask>>,
}

/// Check that `query` is long enough to look up.
pub fn validate_query(query: &str, min_chars: usize) -> Result<&str, ValidationError> {
    let trimmed = query.trim();
    if trimmed.chars().count() < min_chars {
        Err(ValidationError::QueryTooShort { min: min_chars })
    } else {
        Ok(trimmed)
    }
}

impl<A: BusApi> AddressAutocomplete<A> {
    pub fn new(api: Arc<A>, config: &SessionConfig) -> Self {
        let (view, _) = watch::channel(AutocompleteView::default());
        Self {
            shared: Arc::new(Shared {
                api,
                limit: config.address_limit,
                min_chars: config.min_query_chars,
                inner: Mutex::new(Inner::default()),
                view,
            }),
            debounce: config.debounce,
            timer: Mutex::new(None),
        }
    }

    pub fn view(&self) -> AutocompleteView {
        self.shared.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AutocompleteView> {
        self.shared.view.subscribe()
    }

    /// The query box changed.
    ///
    /// Queries too short to look up clear the suggestions immediately.
    /// Otherwise a lookup is scheduled after the debounce period,
    /// replacing any lookup still waiting.
    pub async fn set_query(&self, text: &str) {
        let mut timer = self.timer.lock().await;
        let mut inner = self.shared.inner.lock().await;

        inner.query = text.to_string();
        inner.gate.invalidate();
        let ticket = inner.reschedule();

        if validate_query(text, self.shared.min_chars).is_err() {
            *timer = None;
            inner.list.clear();
            inner.error = None;
            self.shared.publish(&inner);
            return;
        }

        self.shared.publish(&inner);
        drop(inner);

        let shared = Arc::clone(&self.shared);
        let delay = self.debounce;
        *timer = Some(ScopedTask::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(shared.search(ticket));
        }));
    }

    /// Re-issue the current query immediately.
    pub async fn retry(&self) {
        let mut timer = self.timer.lock().await;
        *timer = None;

        let ticket = {
            let mut inner = self.shared.inner.lock().await;
            if validate_query(&inner.query, self.shared.min_chars).is_err() {
                return;
            }
            inner.gate.invalidate();
            inner.reschedule()
        };

        tokio::spawn(Arc::clone(&self.shared).search(ticket));
    }

    /// Feed a navigation key. Returns the committed address on Enter.
    pub async fn key(&self, key: Key) -> Option<Address> {
        let mut inner = self.shared.inner.lock().await;
        let outcome = inner.list.handle(key);

        match outcome {
            KeyOutcome::Commit(address) => {
                drop(inner);
                self.commit(address).await
            }
            KeyOutcome::Moved(_) | KeyOutcome::Closed => {
                self.shared.publish(&inner);
                None
            }
            KeyOutcome::Ignored => None,
        }
    }

    /// A suggestion was clicked.
    pub async fn select(&self, index: usize) -> Option<Address> {
        let address = self.shared.inner.lock().await.list.take(index)?;
        self.commit(address).await
    }

    /// The input regained focus.
    pub async fn focus(&self) {
        let mut inner = self.shared.inner.lock().await;
        if validate_query(&inner.query, self.shared.min_chars).is_ok() && !inner.list.is_open() {
            inner.list.open();
            self.shared.publish(&inner);
        }
    }

    /// Focus moved outside both the input and the list.
    pub async fn blur_outside(&self) {
        let mut inner = self.shared.inner.lock().await;
        if inner.list.is_open() {
            inner.list.close();
            self.shared.publish(&inner);
        }
    }

    /// Empty the box and abandon any pending lookup.
    pub async fn clear(&self) {
        let mut timer = self.timer.lock().await;
        *timer = None;

        let mut inner = self.shared.inner.lock().await;
        inner.gate.invalidate();
        inner.reschedule();
        inner.query.clear();
        inner.list.clear();
        inner.error = None;
        self.shared.publish(&inner);
    }

    /// Write the chosen address into the box and stop searching.
    async fn commit(&self, address: Address) -> Option<Address> {
        let mut timer = self.timer.lock().await;
        *timer = None;

        let mut inner = self.shared.inner.lock().await;
        inner.gate.invalidate();
        inner.reschedule();
        inner.query = address.display_name.clone();
        inner.list.close();
        inner.error = None;
        self.shared.publish(&inner);

        debug!(address = %address.display_name, "address committed");
        Some(address)
    }
}

impl<A: BusApi> Shared<A> {
    fn publish(&self, inner: &Inner) {
        self.view.send_replace(AutocompleteView {
            query: inner.query.clone(),
            suggestions: inner.list.items().to_vec(),
            highlighted: inner.list.highlighted(),
            open: inner.list.is_open(),
            loading: inner.gate.has_pending(),
            error: inner.error.clone(),
        });
    }

    /// Look up the current query, unless the box changed since `ticket`
    /// was handed out.
    async fn search(self: Arc<Self>, ticket: u64) {
        let (generation, query) = {
            let mut inner = self.inner.lock().await;
            if inner.schedule != ticket || validate_query(&inner.query, self.min_chars).is_err() {
                debug!(ticket, "scheduled address search superseded");
                return;
            }
            let generation = inner.gate.issue();
            self.publish(&inner);
            (generation, inner.query.trim().to_string())
        };
        debug!(generation = generation.get(), %query, "address search issued");

        let result = self.api.search_addresses(&query, self.limit).await;

        let mut inner = self.inner.lock().await;
        if !inner.gate.accept(generation) {
            debug!(generation = generation.get(), %query, "discarding stale address results");
            return;
        }

        match result {
            Ok(matches) => {
                debug!(%query, count = matches.addresses.len(), "address results");
                inner.list.replace(matches.addresses);
                inner.error = None;
            }
            Err(e) => {
                warn!(%query, error = %e, "address search failed");
                inner.list.replace(Vec::new());
                inner.error = Some(e.to_network_error(SEARCH_FAILED));
            }
        }
        self.publish(&inner);
    }
}
