mod app;
mod config;
mod db;
mod error;
mod health;
mod logging;
mod state;
mod users;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    logging::init_logging(&config);

    tracing::info!(
        service = %config.service_name,
        port = config.port,
        store = ?config.store,
        "starting user service"
    );

    let app_state = AppState::init(config.clone()).await?;
    let app = app::build_app(app_state);

    app::serve(app, &config).await
}
