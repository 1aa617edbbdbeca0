// Stockroom - Web server binary

use stockroom::{AppState, Config, Database, VERSION};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("stockroom {} starting", VERSION);

    let config = Config::from_env();
    let db = Database::global_init(&config).expect("Failed to open database");
    info!("Database opened at {}", config.db_path.display());

    let state = AppState::new(db.clone());
    stockroom::serve(state, config.port)
        .await
        .expect("Server error");
}
