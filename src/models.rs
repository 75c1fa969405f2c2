use crate::risk::{self, RiskCategory};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One row of the customer list as the backend returns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerSummary {
    pub sha2_hash: String,
    #[serde(rename = "AGE_GRP10", default)]
    pub age_group: Option<String>,
    #[serde(rename = "MEDIA_NM_GRP", default)]
    pub media_group: Option<String>,
    #[serde(rename = "PROD_NM_GRP", default)]
    pub product_group: Option<String>,
    #[serde(rename = "SCRB_PATH_NM_GRP", default)]
    pub acquisition_channel: Option<String>,
    #[serde(rename = "AGMT_END_YMD", default)]
    pub contract_end_date: Option<String>,
    #[serde(default)]
    pub churn_probability: Option<f64>,
    #[serde(default, deserialize_with = "risk::deserialize_lenient")]
    pub customer_category: Option<RiskCategory>,
}

/// Usage and contract attributes of one customer for one month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerHistoryRecord {
    pub sha2_hash: String,
    pub p_mt: u8,
    #[serde(rename = "TOTAL_USED_DAYS", default)]
    pub total_used_days: Option<i64>,
    #[serde(rename = "CH_LAST_DAYS_BF_GRP", default)]
    pub last_viewed_group: Option<String>,
    #[serde(rename = "VOC_TOTAL_MONTH1_YN", default)]
    pub contacted_last_month: Option<String>,
    #[serde(rename = "MONTHS_REMAINING", default)]
    pub months_remaining: Option<i64>,
    #[serde(rename = "PROD_NM_GRP", default)]
    pub product_group: Option<String>,
    #[serde(rename = "MEDIA_NM_GRP", default)]
    pub media_group: Option<String>,
    #[serde(default)]
    pub churn_probability: Option<f64>,
    #[serde(default, deserialize_with = "risk::deserialize_lenient")]
    pub customer_category: Option<RiskCategory>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Per-month feature attribution. The indexed `feature_N` and
/// `impact_value_N` columns land in `slots`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureImportanceRecord {
    pub sha2_hash: String,
    pub p_mt: u8,
    #[serde(default)]
    pub churn_probability: Option<f64>,
    #[serde(default, deserialize_with = "risk::deserialize_lenient")]
    pub customer_category: Option<RiskCategory>,
    #[serde(default)]
    pub prediction_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub slots: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChurnFactor {
    pub factor: String,
    pub impact: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MonthlySummary {
    pub p_mt: u8,
    #[serde(default)]
    pub total_customers: u64,
    #[serde(default)]
    pub churn_customers: u64,
    #[serde(default)]
    pub new_customers: u64,
    #[serde(default)]
    pub category_stable: u64,
    #[serde(default)]
    pub category_normal: u64,
    #[serde(default)]
    pub category_caution: u64,
    #[serde(default)]
    pub category_risk: u64,
    #[serde(default)]
    pub category_high_risk: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChurnReason {
    #[serde(default)]
    pub p_mt: u8,
    pub reason: String,
    #[serde(default)]
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HighRiskCustomer {
    #[serde(default)]
    pub p_mt: u8,
    pub sha2_hash: String,
    #[serde(default)]
    pub last_access: String,
    #[serde(default)]
    pub churn_call: String,
    #[serde(default)]
    pub churn_risk: f64,
    #[serde(default)]
    pub months_remaining: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RiskDistribution {
    #[serde(rename = "매우 위험", default)]
    pub very_risk: u64,
    #[serde(rename = "위험", default)]
    pub risk: u64,
    #[serde(rename = "주의", default)]
    pub caution: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskTrendPoint {
    pub p_mt: u8,
    #[serde(rename = "매우 위험", default)]
    pub very_risk: u64,
    #[serde(rename = "위험", default)]
    pub risk: u64,
    #[serde(rename = "주의", default)]
    pub caution: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChurnFactorShare {
    #[serde(default)]
    pub factor: Option<String>,
    #[serde(default)]
    pub impact: f64,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct OpenDetailRequest {
    pub customer_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectMonthRequest {
    pub month: u8,
}
