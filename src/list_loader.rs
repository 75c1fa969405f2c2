//! Incremental, filtered loading of the customer list.
//!
//! All transitions go through [`ListState::reduce`]; the async wrapper only
//! decides when to talk to the backend. Each filter change bumps a
//! generation counter and pages that come back for an older generation are
//! dropped.

use crate::api::{ChurnSource, SummaryQuery};
use crate::errors::ApiResult;
use crate::models::CustomerSummary;
use crate::risk::RiskCategory;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const PAGE_SIZE: u32 = 20;

const FETCH_FAILED_NOTICE: &str = "Failed to load customer data.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub search: String,
    /// `None` shows every category.
    pub risk: Option<RiskCategory>,
    pub acquisition_channel: Option<String>,
    pub product: Option<String>,
    pub age_group: Option<String>,
}

impl FilterState {
    pub fn to_query(&self, cursor: &PaginationCursor) -> SummaryQuery {
        let search = self.search.trim();
        SummaryQuery {
            offset: cursor.offset,
            limit: PAGE_SIZE,
            search: (!search.is_empty()).then(|| search.to_string()),
            customer_category: self.risk.map(|risk| risk.backend_label().to_string()),
            scrb_path: active_choice(&self.acquisition_channel),
            prod_nm: active_choice(&self.product),
            age_group: active_choice(&self.age_group),
        }
    }
}

fn active_choice(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationCursor {
    pub offset: u32,
    pub has_more: bool,
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self {
            offset: 0,
            has_more: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchPhase {
    Idle,
    Fetching,
    /// The last page has been seen for this filter.
    Done,
    /// The last fetch failed; another trigger may retry.
    Error,
}

#[derive(Debug, Clone)]
pub enum ListEvent {
    FilterChanged(FilterState),
    FetchStarted,
    PageLoaded(Vec<CustomerSummary>),
    FetchFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListState {
    pub generation: u64,
    pub filter: FilterState,
    pub cursor: PaginationCursor,
    pub phase: FetchPhase,
    pub rows: Vec<CustomerSummary>,
    /// Transient message for the user, cleared by the next transition.
    pub notice: Option<String>,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            generation: 0,
            filter: FilterState::default(),
            cursor: PaginationCursor::default(),
            phase: FetchPhase::Idle,
            rows: Vec::new(),
            notice: None,
        }
    }
}

impl ListState {
    pub fn can_fetch(&self) -> bool {
        self.cursor.has_more && self.phase != FetchPhase::Fetching
    }

    pub fn reduce(&mut self, event: ListEvent) {
        match event {
            ListEvent::FilterChanged(filter) => {
                self.generation += 1;
                self.filter = filter;
                self.cursor = PaginationCursor::default();
                self.phase = FetchPhase::Idle;
                self.rows.clear();
                self.notice = None;
            }
            ListEvent::FetchStarted => {
                self.phase = FetchPhase::Fetching;
            }
            ListEvent::PageLoaded(rows) => {
                let full_page = rows.len() as u32 >= PAGE_SIZE;
                self.rows.extend(rows);
                self.notice = None;
                if full_page {
                    self.cursor.offset += PAGE_SIZE;
                    self.phase = FetchPhase::Idle;
                } else {
                    self.cursor.has_more = false;
                    self.phase = FetchPhase::Done;
                }
            }
            ListEvent::FetchFailed => {
                self.phase = FetchPhase::Error;
                self.notice = Some(FETCH_FAILED_NOTICE.to_string());
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchOutcome {
    Appended { rows: usize, has_more: bool },
    /// Another fetch was in flight or the list is exhausted.
    Skipped,
    /// The filter changed while the request was in flight.
    Stale,
}

pub struct ListLoader<S> {
    source: Arc<S>,
    state: Mutex<ListState>,
}

impl<S: ChurnSource> ListLoader<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            state: Mutex::new(ListState::default()),
        }
    }

    pub async fn snapshot(&self) -> ListState {
        self.state.lock().await.clone()
    }

    /// Resets rows and cursor for `filter` without fetching. Returns the new
    /// generation.
    pub async fn apply_filter(&self, filter: FilterState) -> u64 {
        let mut state = self.state.lock().await;
        state.reduce(ListEvent::FilterChanged(filter));
        info!(generation = state.generation, "customer filter changed");
        state.generation
    }

    /// Replaces the filter and loads the first page for it.
    pub async fn set_filter(&self, filter: FilterState) -> ApiResult<FetchOutcome> {
        self.apply_filter(filter).await;
        self.fetch_next_page().await
    }

    pub async fn fetch_next_page(&self) -> ApiResult<FetchOutcome> {
        let (query, generation) = {
            let mut state = self.state.lock().await;
            if !state.can_fetch() {
                debug!(
                    phase = ?state.phase,
                    has_more = state.cursor.has_more,
                    "page fetch skipped"
                );
                return Ok(FetchOutcome::Skipped);
            }
            state.reduce(ListEvent::FetchStarted);
            (state.filter.to_query(&state.cursor), state.generation)
        };

        let result = self.source.customer_summaries(&query).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(generation, current = state.generation, "dropping stale customer page");
            return Ok(FetchOutcome::Stale);
        }

        match result {
            Ok(rows) => {
                let count = rows.len();
                state.reduce(ListEvent::PageLoaded(rows));
                debug!(offset = query.offset, rows = count, "customer page loaded");
                Ok(FetchOutcome::Appended {
                    rows: count,
                    has_more: state.cursor.has_more,
                })
            }
            Err(err) => {
                warn!(offset = query.offset, error = %err, "customer page fetch failed");
                state.reduce(ListEvent::FetchFailed);
                Err(err)
            }
        }
    }

    /// Infinite-scroll trigger: the list sentinel became visible.
    pub async fn on_sentinel_visible(&self) -> ApiResult<FetchOutcome> {
        if !self.state.lock().await.cursor.has_more {
            return Ok(FetchOutcome::Skipped);
        }
        self.fetch_next_page().await
    }
}
