use crate::api::{ApiClient, spawn_copy_audit};
use crate::dashboard::{self, Overview, RiskAnalysis};
use crate::detail_loader::DetailView;
use crate::errors::{ApiResult, AppError};
use crate::list_loader::{FetchOutcome, FilterState, ListState};
use crate::models::{MonthQuery, OpenDetailRequest, SelectMonthRequest};
use crate::preferences::{PreferenceStore, Preferences};
use crate::sessions::{Session, session_id};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Html,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct CustomerPage {
    pub outcome: Option<FetchOutcome>,
    #[serde(flatten)]
    pub state: ListState,
}

/// Each page load gets its own session id; the page echoes it back in the
/// `x-session-id` header.
pub async fn index<P: PreferenceStore>(State(state): State<AppState<P>>) -> Html<String> {
    let prefs = state.preferences.load().await;
    let session = Uuid::new_v4().to_string();
    Html(render_index(prefs.chart_type, &session))
}

pub async fn get_overview<P: PreferenceStore>(
    State(state): State<AppState<P>>,
    Query(query): Query<MonthQuery>,
) -> Json<Overview> {
    let month = dashboard::resolve_month(query.month);
    Json(dashboard::load_overview(&state.api, month).await)
}

pub async fn get_risk_analysis<P: PreferenceStore>(
    State(state): State<AppState<P>>,
    Query(query): Query<MonthQuery>,
) -> Json<RiskAnalysis> {
    let month = dashboard::resolve_month(query.month);
    Json(dashboard::load_risk_analysis(&state.api, month).await)
}

async fn session<P: PreferenceStore>(
    state: &AppState<P>,
    headers: &HeaderMap,
) -> Result<Arc<Session<ApiClient>>, AppError> {
    let id = session_id(headers)?;
    Ok(state.sessions.session(&id).await)
}

pub async fn get_customers<P: PreferenceStore>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
) -> Result<Json<CustomerPage>, AppError> {
    let session = session(&state, &headers).await?;
    Ok(Json(CustomerPage {
        outcome: None,
        state: session.customers.snapshot().await,
    }))
}

pub async fn set_customer_filter<P: PreferenceStore>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
    Json(filter): Json<FilterState>,
) -> Result<Json<CustomerPage>, AppError> {
    let session = session(&state, &headers).await?;
    let result = session.customers.set_filter(filter).await;
    Ok(Json(page(&session, result).await))
}

pub async fn next_customers<P: PreferenceStore>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
) -> Result<Json<CustomerPage>, AppError> {
    let session = session(&state, &headers).await?;
    let result = session.customers.on_sentinel_visible().await;
    Ok(Json(page(&session, result).await))
}

/// Fetch failures are already recorded as the list's notice, so the page
/// is returned either way.
async fn page(session: &Session<ApiClient>, result: ApiResult<FetchOutcome>) -> CustomerPage {
    CustomerPage {
        outcome: result.ok(),
        state: session.customers.snapshot().await,
    }
}

pub async fn copy_customer<P: PreferenceStore>(
    State(state): State<AppState<P>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = id.trim().to_string();
    if id.is_empty() {
        return Err(AppError::bad_request("customer id must not be empty"));
    }
    spawn_copy_audit(state.api.clone(), id);
    Ok(StatusCode::ACCEPTED)
}

pub async fn open_detail<P: PreferenceStore>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
    Json(payload): Json<OpenDetailRequest>,
) -> Result<Json<DetailView>, AppError> {
    let customer_id = payload.customer_id.trim().to_string();
    if customer_id.is_empty() {
        return Err(AppError::bad_request("customer_id must not be empty"));
    }

    let session = session(&state, &headers).await?;
    let summary = session
        .customers
        .snapshot()
        .await
        .rows
        .into_iter()
        .find(|row| row.sha2_hash == customer_id);

    Ok(Json(session.detail.open(&customer_id, summary).await))
}

pub async fn get_detail<P: PreferenceStore>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
) -> Result<Json<DetailView>, AppError> {
    let session = session(&state, &headers).await?;
    Ok(Json(session.detail.snapshot().await))
}

pub async fn select_detail_month<P: PreferenceStore>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
    Json(payload): Json<SelectMonthRequest>,
) -> Result<Json<DetailView>, AppError> {
    let session = session(&state, &headers).await?;
    let view = session.detail.select_month(payload.month).await?;
    Ok(Json(view))
}

pub async fn close_detail<P: PreferenceStore>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
) -> Result<Json<DetailView>, AppError> {
    let session = session(&state, &headers).await?;
    Ok(Json(session.detail.close().await))
}

pub async fn end_session<P: PreferenceStore>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let id = session_id(&headers)?;
    state.sessions.end(&id).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_preferences<P: PreferenceStore>(
    State(state): State<AppState<P>>,
) -> Json<Preferences> {
    Json(state.preferences.load().await)
}

pub async fn put_preferences<P: PreferenceStore>(
    State(state): State<AppState<P>>,
    Json(prefs): Json<Preferences>,
) -> Result<Json<Preferences>, AppError> {
    state.preferences.save(&prefs).await?;
    Ok(Json(prefs))
}
