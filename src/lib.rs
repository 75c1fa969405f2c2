pub mod api;
pub mod app;
pub mod config;
pub mod dashboard;
pub mod detail_loader;
pub mod errors;
pub mod features;
pub mod handlers;
pub mod list_loader;
pub mod models;
pub mod preferences;
pub mod risk;
pub mod sessions;
pub mod state;
pub mod trend;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
