use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use flood_router::config::Config;
use flood_router::cost::CostModel;
use flood_router::{api, graph_loader, ForestModel, OpenWeatherClient, RoutePlanner};

fn init_logging() {
    // Also installs the `log` bridge, so the library's log records end up here.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_logging();

    let network = graph_loader::load_from_postgis(&config.database_url).context("loading road network")?;
    let classifier = ForestModel::load(&config.model_path)
        .with_context(|| format!("loading flood model from {}", config.model_path.display()))?;
    let weather = OpenWeatherClient::new(
        &config.weather_url,
        &config.weather_api_key,
        config.weather_location(),
        config.weather_timeout(),
    )
    .context("building weather client")?;

    let planner = Arc::new(RoutePlanner::new(
        Arc::new(network),
        Arc::new(classifier),
        Arc::new(weather),
        CostModel::new(config.flood_penalty),
        config.heuristic.into(),
    ));

    let runtime = tokio::runtime::Runtime::new().context("starting runtime")?;
    runtime.block_on(api::serve(planner, config.bind)).context("serving HTTP")?;
    Ok(())
}
