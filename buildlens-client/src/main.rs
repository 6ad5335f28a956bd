//! BuildLens command-line entry point: load a build list for a query string
//! and print it.

use buildlens_client::render::render_view;
use buildlens_client::{telemetry, CliArgs, ClientConfig, ClientError, RestClient};
use buildlens_stream::{EngineConfig, EngineDriver, ListEngine};
use std::io::{self, Write};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let args = CliArgs::parse(std::env::args().skip(1))?;
    let config = ClientConfig::load(args.config.as_deref())?;
    telemetry::init_tracing(config.log_format)?;

    let source = Arc::new(RestClient::new(&config)?);
    let engine = ListEngine::new(
        EngineConfig::builds(config.retry.clone()),
        config.scope(),
        &args.query,
    );
    let mut driver = EngineDriver::new(source, engine);

    driver.update(ListEngine::mount);
    driver.settle().await;
    let mut loaded = 1;
    while loaded < args.pages && driver.engine().view().can_load_more {
        driver.update(ListEngine::load_more);
        driver.settle().await;
        loaded += 1;
    }
    tracing::info!(
        scope = %driver.engine().scope(),
        pages = driver.engine().stream().merged_pages().len(),
        builds = driver.engine().stream().records().len(),
        "List loaded"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_view(&driver.engine().view(), &mut out)?;
    out.flush()?;
    Ok(())
}
