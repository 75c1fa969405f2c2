//! Per-customer detail sessions.
//!
//! The backend has no "which months exist" endpoint, so opening a session
//! probes every candidate month's history and keeps the ones that answer
//! with data. Month switches reuse that set. Sessions carry a generation
//! token; results that arrive after the session changed are discarded.

use crate::api::ChurnSource;
use crate::errors::LoaderError;
use crate::features::{self, StrategyGroup};
use crate::models::{ChurnFactor, CustomerHistoryRecord, CustomerSummary, FeatureImportanceRecord};
use crate::risk::RiskCategory;
use crate::trend::probability_percent;
use futures::future::join_all;
use serde::Serialize;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const CANDIDATE_MONTHS: RangeInclusive<u8> = 2..=12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailPhase {
    Idle,
    Discovering,
    Loaded,
    MonthSwitching,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyHint {
    pub group: StrategyGroup,
    pub title: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub generation: u64,
    pub phase: DetailPhase,
    pub customer_id: Option<String>,
    pub summary: Option<CustomerSummary>,
    pub available_months: Vec<u8>,
    pub selected_month: Option<u8>,
    pub history: Option<CustomerHistoryRecord>,
    pub factors: Vec<ChurnFactor>,
    pub strategies: Vec<StrategyHint>,
    /// Percentage with one decimal.
    pub churn_probability: Option<f64>,
    /// Derived from `churn_probability`, not taken from the backend label.
    pub risk: Option<RiskCategory>,
}

impl DetailView {
    fn empty(generation: u64, phase: DetailPhase) -> Self {
        Self {
            generation,
            phase,
            customer_id: None,
            summary: None,
            available_months: Vec::new(),
            selected_month: None,
            history: None,
            factors: Vec::new(),
            strategies: Vec::new(),
            churn_probability: None,
            risk: None,
        }
    }

    fn clear_month_data(&mut self) {
        self.history = None;
        self.factors.clear();
        self.strategies.clear();
        self.churn_probability = None;
        self.risk = None;
    }

    fn apply_features(&mut self, record: &FeatureImportanceRecord) {
        let probability = record.churn_probability.unwrap_or(0.0);
        self.factors = features::extract_factors(record);
        self.strategies = features::strategies_for(record)
            .into_iter()
            .map(|group| StrategyHint {
                group,
                title: group.title(),
            })
            .collect();
        self.churn_probability = Some(probability_percent(probability));
        self.risk = Some(RiskCategory::from_probability(probability));
    }
}

pub struct DetailLoader<S> {
    source: Arc<S>,
    state: Mutex<DetailView>,
}

impl<S: ChurnSource> DetailLoader<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            state: Mutex::new(DetailView::empty(0, DetailPhase::Idle)),
        }
    }

    pub async fn snapshot(&self) -> DetailView {
        self.state.lock().await.clone()
    }

    /// Starts a fresh session for `customer_id`: discovers its months and
    /// loads the latest one.
    pub async fn open(&self, customer_id: &str, summary: Option<CustomerSummary>) -> DetailView {
        let generation = {
            let mut state = self.state.lock().await;
            let generation = state.generation + 1;
            *state = DetailView::empty(generation, DetailPhase::Discovering);
            state.customer_id = Some(customer_id.to_string());
            state.summary = summary;
            generation
        };
        info!(customer_id, generation, "opening customer detail");

        let months = self.discover_months(customer_id).await;

        let latest = {
            let mut state = self.state.lock().await;
            if state.generation != generation {
                debug!(customer_id, generation, "discovery finished for a closed session");
                return state.clone();
            }
            state.available_months = months;
            state.selected_month = state.available_months.last().copied();
            match state.selected_month {
                Some(month) => month,
                None => {
                    info!(customer_id, "no months with history");
                    state.phase = DetailPhase::Loaded;
                    return state.clone();
                }
            }
        };

        self.load_month(customer_id, generation, latest).await
    }

    /// Switches the open session to another discovered month.
    pub async fn select_month(&self, month: u8) -> Result<DetailView, LoaderError> {
        let (customer_id, generation) = {
            let mut state = self.state.lock().await;
            let customer_id = match (&state.customer_id, state.phase) {
                (
                    Some(id),
                    DetailPhase::Discovering | DetailPhase::Loaded | DetailPhase::MonthSwitching,
                ) => id.clone(),
                _ => return Err(LoaderError::NoSession),
            };
            if !state.available_months.contains(&month) {
                return Err(LoaderError::MonthUnavailable(month));
            }
            state.selected_month = Some(month);
            state.phase = DetailPhase::MonthSwitching;
            (customer_id, state.generation)
        };

        Ok(self.load_month(&customer_id, generation, month).await)
    }

    /// Drops the session; anything still in flight for it is ignored.
    pub async fn close(&self) -> DetailView {
        let mut state = self.state.lock().await;
        let generation = state.generation + 1;
        *state = DetailView::empty(generation, DetailPhase::Closed);
        info!(generation, "customer detail closed");
        state.clone()
    }

    async fn discover_months(&self, customer_id: &str) -> Vec<u8> {
        let probes = CANDIDATE_MONTHS.map(|month| {
            let source = Arc::clone(&self.source);
            async move {
                match source.detailed_history(customer_id, month).await {
                    Ok(Some(_)) => Some(month),
                    Ok(None) => {
                        debug!(customer_id, month, "probe returned no data");
                        None
                    }
                    Err(err) => {
                        debug!(customer_id, month, error = %err, "probe failed");
                        None
                    }
                }
            }
        });

        let mut months: Vec<u8> = join_all(probes).await.into_iter().flatten().collect();
        months.sort_unstable();
        months.dedup();
        months
    }

    async fn load_month(&self, customer_id: &str, generation: u64, month: u8) -> DetailView {
        let (history, importance) = tokio::join!(
            self.source.detailed_history(customer_id, month),
            self.source.feature_importance(customer_id, month)
        );

        let mut state = self.state.lock().await;
        if state.generation != generation || state.selected_month != Some(month) {
            debug!(customer_id, month, generation, "dropping stale month data");
            return state.clone();
        }

        state.clear_month_data();
        match history {
            Ok(record) => state.history = record,
            Err(err) => warn!(customer_id, month, error = %err, "history fetch failed"),
        }
        match importance {
            Ok(records) => match records.first() {
                Some(record) => state.apply_features(record),
                None => debug!(customer_id, month, "no feature importance rows"),
            },
            Err(err) => warn!(customer_id, month, error = %err, "feature importance fetch failed"),
        }
        state.phase = DetailPhase::Loaded;
        state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SummaryQuery;
    use crate::errors::{ApiError, ApiResult};
    use serde_json::json;
    use std::collections::{BTreeMap, HashSet};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    /// Backend fake holding history for a fixed set of months.
    #[derive(Default)]
    struct MonthlyBackend {
        months: HashSet<u8>,
        empty_months: HashSet<u8>,
        history_calls: StdMutex<Vec<u8>>,
        feature_calls: StdMutex<Vec<u8>>,
        delay: Option<Duration>,
    }

    impl MonthlyBackend {
        fn with_months(months: &[u8]) -> Self {
            Self {
                months: months.iter().copied().collect(),
                ..Self::default()
            }
        }

        fn history_calls(&self) -> Vec<u8> {
            self.history_calls.lock().unwrap().clone()
        }

        fn feature_calls(&self) -> Vec<u8> {
            self.feature_calls.lock().unwrap().clone()
        }
    }

    fn history(customer_id: &str, month: u8) -> CustomerHistoryRecord {
        CustomerHistoryRecord {
            sha2_hash: customer_id.to_string(),
            p_mt: month,
            total_used_days: Some(300 + month as i64),
            last_viewed_group: Some("within a week".into()),
            contacted_last_month: Some("N".into()),
            months_remaining: Some(12 - month as i64),
            product_group: None,
            media_group: None,
            churn_probability: Some(0.5),
            customer_category: Some(RiskCategory::Caution),
            extra: BTreeMap::new(),
        }
    }

    fn importance(customer_id: &str, month: u8) -> FeatureImportanceRecord {
        serde_json::from_value(json!({
            "sha2_hash": customer_id,
            "p_mt": month,
            "feature_1": "MONTHS_REMAINING",
            "impact_value_1": 0.4356,
            "feature_2": "",
            "impact_value_2": 0.1,
            "churn_probability": 0.05 * month as f64,
            "customer_category": "위험"
        }))
        .unwrap()
    }

    impl ChurnSource for MonthlyBackend {
        async fn customer_summaries(
            &self,
            _query: &SummaryQuery,
        ) -> ApiResult<Vec<CustomerSummary>> {
            Ok(Vec::new())
        }

        async fn detailed_history(
            &self,
            customer_id: &str,
            month: u8,
        ) -> ApiResult<Option<CustomerHistoryRecord>> {
            self.history_calls.lock().unwrap().push(month);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.empty_months.contains(&month) {
                return Ok(None);
            }
            if self.months.contains(&month) {
                Ok(Some(history(customer_id, month)))
            } else {
                Err(ApiError::Status {
                    url: format!("http://backend/customers/{customer_id}/detailed-history"),
                    status: 404,
                })
            }
        }

        async fn feature_importance(
            &self,
            customer_id: &str,
            month: u8,
        ) -> ApiResult<Vec<FeatureImportanceRecord>> {
            self.feature_calls.lock().unwrap().push(month);
            if self.months.contains(&month) {
                Ok(vec![importance(customer_id, month)])
            } else {
                Ok(Vec::new())
            }
        }
    }

    #[tokio::test]
    async fn open_selects_latest_available_month() {
        let backend = Arc::new(MonthlyBackend::with_months(&[9, 3, 7]));
        let loader = DetailLoader::new(backend.clone());

        let view = loader.open("h1", None).await;

        assert_eq!(view.phase, DetailPhase::Loaded);
        assert_eq!(view.available_months, vec![3, 7, 9]);
        assert_eq!(view.selected_month, Some(9));
        assert_eq!(view.history.as_ref().map(|h| h.p_mt), Some(9));
        assert_eq!(backend.feature_calls(), vec![9]);
    }

    #[tokio::test]
    async fn discovery_probes_every_candidate_month() {
        let backend = Arc::new(MonthlyBackend::with_months(&[4]));
        let loader = DetailLoader::new(backend.clone());
        loader.open("h1", None).await;

        let mut probed = backend.history_calls();
        // the final call is the detail load for month 4
        assert_eq!(probed.pop(), Some(4));
        probed.sort_unstable();
        assert_eq!(probed, CANDIDATE_MONTHS.collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn empty_probe_counts_as_unavailable() {
        let mut backend = MonthlyBackend::with_months(&[5, 6]);
        backend.empty_months.insert(6);
        let loader = DetailLoader::new(Arc::new(backend));

        let view = loader.open("h1", None).await;
        assert_eq!(view.available_months, vec![5]);
        assert_eq!(view.selected_month, Some(5));
    }

    #[tokio::test]
    async fn derived_view_uses_probability_not_backend_label() {
        let backend = Arc::new(MonthlyBackend::with_months(&[10]));
        let loader = DetailLoader::new(backend);

        let view = loader.open("h1", None).await;

        // 0.05 * 10 = 0.5 -> caution, even though the record says 위험
        assert_eq!(view.churn_probability, Some(50.0));
        assert_eq!(view.risk, Some(RiskCategory::Caution));
        assert_eq!(
            view.factors,
            vec![ChurnFactor {
                factor: "Contract months remaining".into(),
                impact: 43.56,
            }]
        );
        assert_eq!(view.strategies.len(), 1);
        assert_eq!(view.strategies[0].group, StrategyGroup::Contract);
    }

    #[tokio::test]
    async fn customer_without_history_loads_empty_view() {
        let backend = Arc::new(MonthlyBackend::with_months(&[]));
        let loader = DetailLoader::new(backend.clone());

        let view = loader.open("h1", None).await;
        assert_eq!(view.phase, DetailPhase::Loaded);
        assert!(view.available_months.is_empty());
        assert_eq!(view.selected_month, None);
        assert!(view.factors.is_empty());
        assert!(backend.feature_calls().is_empty());
    }

    #[tokio::test]
    async fn switching_month_skips_rediscovery() {
        let backend = Arc::new(MonthlyBackend::with_months(&[2, 8]));
        let loader = DetailLoader::new(backend.clone());
        loader.open("h1", None).await;
        let probes_after_open = backend.history_calls().len();

        let view = loader.select_month(2).await.unwrap();

        assert_eq!(view.phase, DetailPhase::Loaded);
        assert_eq!(view.selected_month, Some(2));
        assert_eq!(view.history.as_ref().map(|h| h.p_mt), Some(2));
        assert_eq!(view.available_months, vec![2, 8]);
        assert_eq!(backend.history_calls().len(), probes_after_open + 1);
        assert_eq!(backend.feature_calls(), vec![8, 2]);
    }

    #[tokio::test]
    async fn unavailable_month_is_rejected() {
        let backend = Arc::new(MonthlyBackend::with_months(&[2, 8]));
        let loader = DetailLoader::new(backend);
        loader.open("h1", None).await;

        assert_eq!(
            loader.select_month(5).await.unwrap_err(),
            LoaderError::MonthUnavailable(5)
        );
    }

    #[tokio::test]
    async fn month_switch_requires_open_session() {
        let loader = DetailLoader::new(Arc::new(MonthlyBackend::with_months(&[3])));
        assert_eq!(loader.select_month(3).await.unwrap_err(), LoaderError::NoSession);

        loader.open("h1", None).await;
        loader.close().await;
        assert_eq!(loader.select_month(3).await.unwrap_err(), LoaderError::NoSession);
    }

    #[tokio::test]
    async fn close_discards_session_state() {
        let loader = DetailLoader::new(Arc::new(MonthlyBackend::with_months(&[3])));
        loader.open("h1", None).await;

        let view = loader.close().await;
        assert_eq!(view.phase, DetailPhase::Closed);
        assert_eq!(view.customer_id, None);
        assert!(view.available_months.is_empty());
        assert!(view.history.is_none());
        assert_eq!(view.churn_probability, None);
    }

    #[tokio::test]
    async fn reopening_same_customer_probes_again() {
        let backend = Arc::new(MonthlyBackend::with_months(&[6]));
        let loader = DetailLoader::new(backend.clone());

        loader.open("h1", None).await;
        let first = backend.history_calls().len();
        loader.close().await;
        loader.open("h1", None).await;

        let per_open = CANDIDATE_MONTHS.count() + 1;
        assert_eq!(first, per_open);
        assert_eq!(backend.history_calls().len(), per_open * 2);
    }

    #[tokio::test]
    async fn results_for_closed_session_are_dropped() {
        let backend = Arc::new(MonthlyBackend {
            delay: Some(Duration::from_millis(30)),
            ..MonthlyBackend::with_months(&[4])
        });
        let loader = Arc::new(DetailLoader::new(backend));

        let opening = {
            let loader = Arc::clone(&loader);
            tokio::spawn(async move { loader.open("h1", None).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        loader.close().await;
        opening.await.unwrap();

        let view = loader.snapshot().await;
        assert_eq!(view.phase, DetailPhase::Closed);
        assert!(view.available_months.is_empty());
        assert!(view.history.is_none());
    }

    #[tokio::test]
    async fn newer_customer_wins_over_slow_previous_one() {
        let backend = Arc::new(MonthlyBackend {
            delay: Some(Duration::from_millis(30)),
            ..MonthlyBackend::with_months(&[4, 5])
        });
        let loader = Arc::new(DetailLoader::new(backend));

        let first = {
            let loader = Arc::clone(&loader);
            tokio::spawn(async move { loader.open("first", None).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        let view = loader.open("second", None).await;
        first.await.unwrap();

        assert_eq!(view.customer_id.as_deref(), Some("second"));
        let current = loader.snapshot().await;
        assert_eq!(current.customer_id.as_deref(), Some("second"));
        assert_eq!(
            current.history.as_ref().map(|h| h.sha2_hash.as_str()),
            Some("second")
        );
    }
}
