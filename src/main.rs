#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{Level as TraceLevel, info};
use tracing_subscriber::FmtSubscriber;

use admin_settings_sync::cli::{self, Cli};
use admin_settings_sync::config::{AppConfig, StoreBackend};
use admin_settings_sync::notify;
use admin_settings_sync::remote::{DocumentStore, JsonFileStore, MemoryDocumentStore};
use admin_settings_sync::settings::SettingsContext;

fn trace_level(name: &str) -> TraceLevel {
    match name {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Logs go to stderr so `show --json` output stays clean
    let subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level(&config.log_level))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let in_memory = args.memory || config.store.backend == StoreBackend::Memory;
    let remote: Arc<dyn DocumentStore> = if in_memory {
        info!("using in-memory document store");
        Arc::new(MemoryDocumentStore::new())
    } else {
        let store = JsonFileStore::new(config.documents_dir());
        info!(root = %store.root().display(), "using file document store");
        Arc::new(store)
    };

    let (notifier, mut feed) = notify::channel(config.notice_ttl());
    let context = SettingsContext::new(remote, notifier);

    let outcome = cli::run(args.command, &context).await;

    // Dropping the context closes the feed once every queued notice is read
    drop(context);
    cli::print_notices(&mut feed).await;
    outcome
}
