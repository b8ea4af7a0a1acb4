//! GitGrow service binary entrypoint.
//! Boots the Axum HTTP server: config, tracing, shared state, optional metrics.

use gitgrow::{api, config::AppConfig, metrics::Metrics};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a subscriber unless the host runtime already did.
/// `LOG_FORMAT=json` switches to JSON lines; the filter comes from `RUST_LOG`.
fn enable_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gitgrow=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_tracing();

    let cfg = AppConfig::load_default()?;
    tracing::info!(
        ttl_secs = cfg.cache_ttl_secs,
        authenticated = cfg.github_token.is_some(),
        "gitgrow config loaded"
    );

    let state = api::AppState::from_config(&cfg)?;
    let mut router = api::router(state);

    if cfg.metrics_enabled {
        let metrics = Metrics::init(cfg.cache_ttl_secs)?;
        router = router.merge(metrics.router());
    }

    Ok(router.into())
}
