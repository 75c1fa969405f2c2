use crate::handlers;
use crate::preferences::PreferenceStore;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

pub fn router<P: PreferenceStore>(state: AppState<P>) -> Router {
    Router::new()
        .route("/", get(handlers::index::<P>))
        .route("/api/overview", get(handlers::get_overview::<P>))
        .route("/api/risk-analysis", get(handlers::get_risk_analysis::<P>))
        .route("/api/customers", get(handlers::get_customers::<P>))
        .route("/api/customers/filter", post(handlers::set_customer_filter::<P>))
        .route("/api/customers/next", post(handlers::next_customers::<P>))
        .route("/api/customers/:id/copy", post(handlers::copy_customer::<P>))
        .route(
            "/api/detail",
            get(handlers::get_detail::<P>)
                .post(handlers::open_detail::<P>)
                .delete(handlers::close_detail::<P>),
        )
        .route("/api/detail/month", post(handlers::select_detail_month::<P>))
        .route("/api/session", delete(handlers::end_session::<P>))
        .route(
            "/api/preferences",
            get(handlers::get_preferences::<P>).put(handlers::put_preferences::<P>),
        )
        .with_state(state)
}
