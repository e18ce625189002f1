use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::{Config, MarketData, Settings};
use engine::{HttpSignalSink, Scheduler, SqliteMarketData};
use features::{FeaturePipeline, FeatureStore};
use signal::{load_classifier, DecisionEngine, DecisionTask, SignalPublisher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        error!(error = %format!("{e:#}"), "Scalper exited with error");
        return Err(e);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("invalid environment configuration")?;
    let mut settings = Settings::load(&cfg.settings_path)
        .with_context(|| format!("failed to load settings from {}", cfg.settings_path))?;
    if let Some(symbol) = &cfg.symbol_override {
        settings.symbol = symbol.clone();
    }
    info!(symbol = %settings.symbol, "Scalper starting");

    // ── Database ──────────────────────────────────────────────────────────────
    // Lazy: an unreachable store is reported by each cycle, not at boot.
    let market: Arc<dyn MarketData> = Arc::new(
        SqliteMarketData::connect_lazy(&cfg.database_url, 4)
            .with_context(|| format!("invalid DATABASE_URL: {}", cfg.database_url))?,
    );
    info!(url = %cfg.database_url, "Market data source configured");

    // ── Shared feature store ──────────────────────────────────────────────────
    let store = Arc::new(FeatureStore::new(settings.features.cache_capacity));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Feature loop ──────────────────────────────────────────────────────────
    let pipeline = FeaturePipeline::new(
        settings.symbol.clone(),
        &settings.features,
        market.clone(),
        store.clone(),
    );
    let feature_scheduler = Scheduler::new(settings.schedule.feature_interval(), 1);
    let feature_handle = tokio::spawn(feature_scheduler.run(pipeline, shutdown_rx.clone()));

    // ── Decision loop (needs the classifier) ──────────────────────────────────
    let mut startup_error = None;
    let decision_handle = match decision_task(&cfg, &settings, store, market) {
        Ok(task) => {
            let scheduler = Scheduler::new(
                settings.schedule.decision_interval(),
                settings.schedule.cooldown_multiplier,
            );
            Some(tokio::spawn(scheduler.run(task, shutdown_rx)))
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Signal decision engine not started");
            startup_error = Some(e);
            None
        }
    };

    info!("Tasks started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    let feature_cycles = feature_handle.await.context("feature task aborted")?;
    let decision_cycles = match decision_handle {
        Some(handle) => handle.await.context("decision task aborted")?,
        None => 0,
    };
    info!(feature_cycles, decision_cycles, "Scalper stopped");

    match startup_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn decision_task(
    cfg: &Config,
    settings: &Settings,
    store: Arc<FeatureStore>,
    market: Arc<dyn MarketData>,
) -> anyhow::Result<DecisionTask> {
    let classifier = load_classifier(Path::new(&cfg.model_path), cfg.fallback_seed)
        .with_context(|| format!("failed to load model from {}", cfg.model_path))?;

    let sink = HttpSignalSink::new(cfg.signal_api_url.clone(), settings.schedule.publish_timeout())?;
    info!(url = %sink.url(), "Publishing signals");

    Ok(DecisionTask::new(
        DecisionEngine::new(
            settings.symbol.clone(),
            settings.decision.clone(),
            store,
            market,
            classifier,
        ),
        SignalPublisher::new(Arc::new(sink)),
    ))
}
