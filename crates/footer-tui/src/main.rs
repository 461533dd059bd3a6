mod app;
mod footer;
mod status;
mod theme;

use footer_core::config::Config;
use footer_core::platform;
use footer_core::{DataLoader, WidgetController};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = platform::log_path();

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; keep HTTP client internals quiet by default.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("contact-footer log: {}", log_path.display());
    tracing::info!("contact-footer starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("config unreadable, using defaults: {}", e);
            Config::default()
        }
    };
    tracing::info!("Config loaded from: {:?}", Config::config_path());

    // ── Spawn the widget controller ──────────────────────────────────────────
    let loader = DataLoader::from_config(&config.source)?;
    let (handle, controller) = WidgetController::spawn(
        loader,
        config.loading.load_strategy(),
        Some(config.footer.theme.as_str()),
    );

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let result = app::App::new(handle.clone(), config.footer.owner.clone())
        .run()
        .await;

    handle.shutdown().await;
    if let Err(e) = controller.await {
        tracing::error!("widget controller panicked: {}", e);
    }
    tracing::info!("contact-footer exited");
    result
}
