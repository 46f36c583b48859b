use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use searchdeck_google::{GeminiClient, SearchConsoleClient};
use searchdeck_server::state::AppState;
use searchdeck_server::store::JsonReportStore;

/// `searchdeck health` — liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$SEARCHDECK_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("SEARCHDECK_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Health-check subcommand — handled before tokio does any real work so
    // the probe stays fast when used as a Docker HEALTHCHECK.
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }

    // Initialise structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("searchdeck=info".parse()?),
        )
        .json()
        .init();

    let cfg = searchdeck_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let store = JsonReportStore::open(&cfg.data_dir)?;

    if cfg.gsc_token.is_none() {
        tracing::warn!(
            "SEARCHDECK_GSC_TOKEN not set. Report refreshes will fail until a \
             Search Console bearer token is configured."
        );
    }
    if cfg.gemini_api_key.is_none() {
        tracing::warn!(
            "SEARCHDECK_GEMINI_API_KEY not set. Intent columns will carry the \
             degraded default until a key is configured."
        );
    }

    let search = SearchConsoleClient::new(&cfg.gsc_endpoint, cfg.gsc_token.as_deref().unwrap_or(""));
    let intents = GeminiClient::new(
        &cfg.gemini_endpoint,
        cfg.gemini_api_key.as_deref().unwrap_or(""),
        &cfg.gemini_model,
    );

    let state = Arc::new(AppState::new(
        Arc::new(store),
        Arc::new(search),
        Arc::new(intents),
        cfg.clone(),
    ));

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = searchdeck_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, data_dir = %cfg.data_dir, "Searchdeck listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
