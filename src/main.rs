use churn_dashboard::{
    AppState, Config, api::ApiClient, preferences::JsonFilePreferences, router,
};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let api = ApiClient::new(&config.api_base_url, config.http_timeout)?;
    let preferences = JsonFilePreferences::new(config.preferences_path.clone());
    info!(backend = %api.base_url(), "using churn backend");
    let state = AppState::with_session_idle(api, preferences, config.session_idle_timeout);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
