use anyhow::{Context, Result};
use std::sync::Arc;

mod account;
mod api;
mod cache;
mod checker;
mod cli;
mod encoding;
mod fallback;
mod metrics;
mod rank_tier;
mod resolver;
mod score_engine;
mod soulbound;
mod sources;

#[tokio::main]
async fn main() -> Result<()> {
    // Bad arguments fail before config or network is touched.
    let invocation = cli::parse_args(std::env::args()).map_err(anyhow::Error::msg)?;

    let config = match &invocation.config_path {
        Some(path) => common::config::Config::load_from(path)?,
        None => common::config::Config::load()?,
    };

    let (dispatch, _otel_guard) =
        common::observability::build_dispatch("rank_checker", &config.general);
    tracing::dispatcher::set_global_default(dispatch).map_err(anyhow::Error::msg)?;

    let client = common::explorer::ExplorerClient::new(&config.explorer)?;
    tracing::info!(
        base_url = client.base_url(),
        relay = client.has_relay(),
        cache = config.cache.enabled,
        "rank_checker starting"
    );
    let rank_checker = checker::RankChecker::from_config(client, &config);

    match invocation.command {
        cli::Command::Check { addresses } => {
            cli::run_check(&rank_checker, &addresses).await;
            Ok(())
        }
        cli::Command::Serve => {
            let web = config
                .web
                .as_ref()
                .context("[web] section is required for `serve`")?;

            metrics::install_prometheus(config.observability.prometheus_port)?;
            metrics::describe();

            let state = Arc::new(api::AppState {
                checker: rank_checker,
                started_at: chrono::Utc::now(),
            });
            let app = api::router(state);

            let bind_addr = format!("{}:{}", web.host, web.port);
            tracing::info!(addr = %bind_addr, "starting rank_checker HTTP server");
            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
            axum::serve(listener, app).await?;
            Ok(())
        }
    }
}
