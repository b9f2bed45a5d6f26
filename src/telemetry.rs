//! Process-wide tracing subscriber.
//!
//! Bunyan records go to `<log_directory>/<name>.log`, rotated daily, and JSON
//! lines go to stdout. `RUST_LOG` takes precedence over the configured level.
use anyhow::{anyhow, bail};
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::set_global_default};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Registry, fmt, fmt::MakeWriter, layer::SubscriberExt};

use crate::AppConfig;

// flushes the file writer on drop, so it lives for the whole process
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// The layered subscriber, not yet installed. `records` receives the bunyan output.
pub fn build_subscriber<W>(
    app_name: String,
    filter: EnvFilter,
    records: W,
) -> impl Subscriber + Send + Sync
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    Registry::default()
        .with(filter)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(app_name, records))
        .with(fmt::layer().json())
}

pub fn init_tracing(app: &AppConfig) -> anyhow::Result<()> {
    if LOG_GUARD.get().is_some() {
        bail!("tracing already initialized");
    }
    LogTracer::init()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(app.env_filter()));
    let appender = rolling::daily(&app.log_directory, format!("{}.log", app.name));
    let (records, guard) = tracing_appender::non_blocking(appender);

    set_global_default(build_subscriber(app.name.clone(), filter, records))?;
    LOG_GUARD
        .set(guard)
        .map_err(|_| anyhow!("tracing already initialized"))?;
    Ok(())
}
