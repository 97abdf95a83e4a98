use chrono::Local;
use pravo_dl::{info_time, process::process_catalogue, Result, RunMode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RunMode::ListOnly` prints the catalogue without downloading.
const RUN_MODE: RunMode = RunMode::Download;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pravo_dl=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let start_time = Local::now();
    if let Err(e) = process_catalogue(RUN_MODE).await {
        tracing::error!("Run aborted: {e}");
        return Err(e);
    }
    info_time!(start_time, "Full program time:");

    Ok(())
}
