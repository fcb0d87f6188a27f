//! Orgdir API server.

use log::info;
use tokio::signal;

use orgdir::http::{self, AppState};
use orgdir::{DirectoryStore, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let settings = Settings::from_env();
    let store = DirectoryStore::open(&settings.database_path)?;
    let app = http::router(AppState::new(store));

    info!("listening on http://{}", settings.bind);
    let listener = tokio::net::TcpListener::bind(&settings.bind).await?;
    let serve = axum::serve(listener, app);
    tokio::select! {
        r = serve => r?,
        _ = signal::ctrl_c() => info!("shutdown signal received"),
    }

    Ok(())
}
