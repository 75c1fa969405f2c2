use crate::api::ApiClient;
use crate::errors::ApiResult;
use crate::features::translate_factor_shares;
use crate::models::{
    ChurnFactor, ChurnReason, HighRiskCustomer, MonthlySummary, RiskDistribution, RiskTrendPoint,
};
use crate::trend::{Trend, compute_trend, format_count, rate_percent};
use serde::Serialize;
use tracing::warn;

pub const FIRST_MONTH: u8 = 2;
pub const LATEST_MONTH: u8 = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    pub value: u64,
    pub formatted: String,
    /// Share of the month's total customers, where meaningful.
    pub rate: Option<String>,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub month: u8,
    pub previous_month: Option<u8>,
    pub total: StatCard,
    pub churn: StatCard,
    pub new_customers: StatCard,
    pub churn_reasons: Vec<ChurnReason>,
    pub high_risk_customers: Vec<HighRiskCustomer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAnalysis {
    pub month: u8,
    pub summary: Option<MonthlySummary>,
    pub distribution: RiskDistribution,
    pub trend: Vec<RiskTrendPoint>,
    pub churn_factors: Vec<ChurnFactor>,
}

/// Clamps a requested month into the range the backend has data for.
pub fn resolve_month(requested: Option<u8>) -> u8 {
    requested
        .unwrap_or(LATEST_MONTH)
        .clamp(FIRST_MONTH, LATEST_MONTH)
}

pub fn previous_month(month: u8) -> Option<u8> {
    (month > FIRST_MONTH).then(|| month - 1)
}

fn or_default<T: Default>(result: ApiResult<T>, what: &str, month: u8) -> T {
    result.unwrap_or_else(|err| {
        warn!(month, error = %err, "failed to load {what}");
        T::default()
    })
}

fn pick_month(rows: Vec<MonthlySummary>, month: u8) -> Option<MonthlySummary> {
    let mut rows = rows;
    match rows.iter().position(|row| row.p_mt == month) {
        Some(index) => Some(rows.swap_remove(index)),
        None => rows.into_iter().next(),
    }
}

fn stat_card(
    current: Option<&MonthlySummary>,
    previous: Option<&MonthlySummary>,
    metric: fn(&MonthlySummary) -> u64,
    with_rate: bool,
) -> StatCard {
    let value = current.map(metric).unwrap_or(0);
    let total = current.map(|row| row.total_customers).unwrap_or(0);
    StatCard {
        value,
        formatted: current.map(|_| format_count(value)).unwrap_or_else(|| "-".to_string()),
        rate: with_rate.then(|| rate_percent(value, total)),
        trend: compute_trend(
            current.map(|row| metric(row) as f64),
            previous.map(|row| metric(row) as f64),
        ),
    }
}

pub fn build_overview(
    month: u8,
    current: Option<&MonthlySummary>,
    previous: Option<&MonthlySummary>,
    churn_reasons: Vec<ChurnReason>,
    high_risk_customers: Vec<HighRiskCustomer>,
) -> Overview {
    Overview {
        month,
        previous_month: previous_month(month),
        total: stat_card(current, previous, |row| row.total_customers, false),
        churn: stat_card(current, previous, |row| row.churn_customers, true),
        new_customers: stat_card(current, previous, |row| row.new_customers, true),
        churn_reasons,
        high_risk_customers,
    }
}

/// Loads the landing-page numbers for `month` and compares them with the
/// month before. Failed fetches degrade to empty sections.
pub async fn load_overview(api: &ApiClient, month: u8) -> Overview {
    let previous = previous_month(month);
    let previous_rows = async {
        match previous {
            Some(prev) => api.churn_rate(prev).await,
            None => Ok(Vec::new()),
        }
    };

    let (current_rows, previous_rows, reasons, high_risk) = tokio::join!(
        api.churn_rate(month),
        previous_rows,
        api.churn_reasons(month),
        api.high_risk_customers(month)
    );

    let current = pick_month(or_default(current_rows, "churn rate", month), month);
    let previous = previous.and_then(|prev| {
        pick_month(or_default(previous_rows, "previous churn rate", prev), prev)
    });

    build_overview(
        month,
        current.as_ref(),
        previous.as_ref(),
        or_default(reasons, "churn reasons", month),
        or_default(high_risk, "high risk customers", month),
    )
}

pub async fn load_risk_analysis(api: &ApiClient, month: u8) -> RiskAnalysis {
    let (summary, distribution, trend, factors) = tokio::join!(
        api.monthly_risk_summary(month),
        api.risk_distribution(month),
        api.risk_trend(),
        api.churn_factors(month)
    );

    RiskAnalysis {
        month,
        summary: pick_month(or_default(summary, "risk summary", month), month),
        distribution: or_default(distribution, "risk distribution", month),
        trend: or_default(trend, "risk trend", month),
        churn_factors: translate_factor_shares(&or_default(factors, "churn factors", month)),
    }
}
