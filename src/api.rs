use crate::errors::{ApiError, ApiResult};
use crate::models::{
    ChurnFactorShare, ChurnReason, CustomerHistoryRecord, CustomerSummary,
    FeatureImportanceRecord, HighRiskCustomer, MonthlySummary, RiskDistribution, RiskTrendPoint,
};
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const NO_QUERY: [(&str, &str); 0] = [];

/// Query string of `GET /customers/summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryQuery {
    pub offset: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scrb_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prod_nm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
}

/// The per-customer fetches the list and detail loaders are built on.
pub trait ChurnSource: Send + Sync + 'static {
    fn customer_summaries(
        &self,
        query: &SummaryQuery,
    ) -> impl Future<Output = ApiResult<Vec<CustomerSummary>>> + Send;

    /// `Ok(None)` when the backend answers with an empty body.
    fn detailed_history(
        &self,
        customer_id: &str,
        month: u8,
    ) -> impl Future<Output = ApiResult<Option<CustomerHistoryRecord>>> + Send;

    fn feature_importance(
        &self,
        customer_id: &str,
        month: u8,
    ) -> impl Future<Output = ApiResult<Vec<FeatureImportanceRecord>>> + Send;
}

#[derive(Debug, Serialize)]
struct MonthParam {
    p_mt: u8,
}

#[derive(Debug, Serialize)]
struct RiskMonthParam {
    month: u8,
}

#[derive(Debug, Serialize)]
struct ClipboardEntry<'a> {
    sha2: &'a str,
}

/// HTTP client for the churn backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|err| ApiError::Request(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T, Q>(&self, path: &str, query: &Q) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|err| ApiError::from_reqwest(err, &url))?
            .error_for_status()
            .map_err(|err| ApiError::from_reqwest(err, &url))?;

        response.json::<T>().await.map_err(|err| ApiError::Decode {
            url,
            message: err.to_string(),
        })
    }

    pub async fn churn_rate(&self, month: u8) -> ApiResult<Vec<MonthlySummary>> {
        self.get_json("/api/churn_rate", &MonthParam { p_mt: month })
            .await
    }

    pub async fn churn_reasons(&self, month: u8) -> ApiResult<Vec<ChurnReason>> {
        self.get_json("/api/churn_reasons", &MonthParam { p_mt: month })
            .await
    }

    pub async fn high_risk_customers(&self, month: u8) -> ApiResult<Vec<HighRiskCustomer>> {
        self.get_json("/api/high_risk_customers", &MonthParam { p_mt: month })
            .await
    }

    pub async fn monthly_risk_summary(&self, month: u8) -> ApiResult<Vec<MonthlySummary>> {
        self.get_json("/risk-summary/monthly-summary", &RiskMonthParam { month })
            .await
    }

    pub async fn risk_distribution(&self, month: u8) -> ApiResult<RiskDistribution> {
        self.get_json("/risk-summary/risk-distribution", &RiskMonthParam { month })
            .await
    }

    pub async fn risk_trend(&self) -> ApiResult<Vec<RiskTrendPoint>> {
        self.get_json("/risk-summary/risk-trend", &NO_QUERY).await
    }

    pub async fn churn_factors(&self, month: u8) -> ApiResult<Vec<ChurnFactorShare>> {
        self.get_json("/risk-summary/churn-factors", &RiskMonthParam { month })
            .await
    }

    /// Audit log entry for a copied customer hash.
    pub async fn record_clipboard(&self, sha2: &str) -> ApiResult<()> {
        let url = format!("{}/clipboard", self.base_url);
        self.client
            .post(&url)
            .json(&ClipboardEntry { sha2 })
            .send()
            .await
            .map_err(|err| ApiError::from_reqwest(err, &url))?
            .error_for_status()
            .map_err(|err| ApiError::from_reqwest(err, &url))?;
        Ok(())
    }
}

impl ChurnSource for ApiClient {
    async fn customer_summaries(&self, query: &SummaryQuery) -> ApiResult<Vec<CustomerSummary>> {
        self.get_json("/customers/summary", query).await
    }

    async fn detailed_history(
        &self,
        customer_id: &str,
        month: u8,
    ) -> ApiResult<Option<CustomerHistoryRecord>> {
        let path = format!("/customers/{customer_id}/detailed-history");
        self.get_json(&path, &MonthParam { p_mt: month }).await
    }

    async fn feature_importance(
        &self,
        customer_id: &str,
        month: u8,
    ) -> ApiResult<Vec<FeatureImportanceRecord>> {
        let path = format!("/customers/{customer_id}/feature-importance");
        self.get_json(&path, &MonthParam { p_mt: month }).await
    }
}

/// Fires the clipboard audit request in the background; failures are
/// logged and otherwise ignored.
pub fn spawn_copy_audit(api: Arc<ApiClient>, sha2: String) {
    tokio::spawn(async move {
        if let Err(err) = api.record_clipboard(&sha2).await {
            debug!(%sha2, error = %err, "clipboard audit failed");
        }
    });
}
