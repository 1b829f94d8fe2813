use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use ooobot_core::openai_client::OpenAiClient;
use ooobot_core::{HumorTransformer, IntervalStore, Passthrough, TextTransformer, ORGANIZATION_TZ};
use ooobot_host::{build_router, log, serve, AppState, Options, Scheduler, SlackClient};

fn main() -> Result<()> {
    let options = Options::parse();
    log::init();

    // The blocking OpenAI client is created and dropped outside the runtime.
    let transformer = build_transformer(&options)?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(run(options, Arc::clone(&transformer)))?;
    drop(runtime);
    drop(transformer);

    Ok(())
}

fn build_transformer(options: &Options) -> Result<Arc<dyn TextTransformer>> {
    let Some(token) = options.openai_token() else {
        warn!("no OpenAI API token configured; replies are sent verbatim");
        return Ok(Arc::new(Passthrough));
    };

    let client = OpenAiClient::with_base_url(&options.openai_base_url, token)?;
    info!(model = %options.openai_model, "embellishing replies with chat completions");
    Ok(Arc::new(HumorTransformer::new(
        client,
        options.openai_model.clone(),
    )))
}

async fn run(options: Options, transformer: Arc<dyn TextTransformer>) -> Result<()> {
    if options.slack_oauth_token.is_none() {
        warn!("no Slack OAuth token configured; channel digests will fail to send");
    }

    let store = Arc::new(IntervalStore::new(ORGANIZATION_TZ));
    let slack = SlackClient::new(options.slack_oauth_token.clone())?;
    let state = AppState::new(store, transformer, slack);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Scheduler::new(
        state.clone(),
        options.digest_interval(),
        options.digest_window(),
    )
    .spawn(shutdown_rx);

    let app = build_router(state, &options.allowed_origins);
    let listener = TcpListener::bind(options.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", options.bind_addr()))?;

    serve(listener, app, shutdown_signal()).await?;

    let _ = shutdown_tx.send(true);
    scheduler.await.context("digest scheduler panicked")?;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
