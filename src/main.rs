use anyhow::{Context, Result};
use botfilter::{
    app::{BotFilterApp, PageSignal},
    config,
    infrastructure::{directories, lifetime, logging},
    page::snapshot,
    storage::Store,
};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config, &paths)?;

    let store = Store::open(&paths.store_path)
        .await
        .with_context(|| format!("failed to open store {}", paths.store_path.display()))?;

    let (page, unload) = lifetime::PageLifetime::new();
    lifetime::unload_on_signal(page.clone());
    let watcher = store.spawn_watch(config.page.store_poll_interval, page.listener());

    let snapshot_path = config.page.snapshot.clone();
    let app = BotFilterApp::initialize(config.page, &store, &page).await;
    let (signals, signal_rx) = mpsc::channel(16);

    if let Some(path) = snapshot_path {
        let html = snapshot::read_snapshot(&path).await?;
        tracing::info!(path = %path.display(), "rendering page snapshot");
        signals.send(PageSignal::Render(html)).await?;
        signals.send(PageSignal::Scroll).await?;
    } else {
        tracing::warn!("PAGE_SNAPSHOT is not set; waiting on an empty page");
    }

    let stats = app.run(signal_rx, unload).await?;
    watcher.abort();
    tracing::info!(hidden = stats.hidden, passes = stats.passes, "botfilter stopped");
    Ok(())
}
