//! Daily per-interface network usage recorder.
//!
//! Polls the kernel byte counters every few seconds, accumulates per-day
//! usage for each interface and for the physical/virtual category totals, and
//! keeps one human-readable history file per interface under the storage root.

mod config;
pub mod core;
mod error;
pub mod services;
pub mod store;

use std::time::Duration;

use anyhow::Context;

pub use crate::core::{ByteCounterPair, InterfaceCategory, UsageHistory};
pub use config::storage_root;
pub use error::AppError;
pub use services::{BackgroundServices, MonitorHandle, UsageMonitor};
pub use store::StorageLayout;

/// Start the monitor and run until Ctrl-C or SIGTERM.
pub async fn run() -> anyhow::Result<()> {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("PANIC in netusage: {info}");
        default_hook(info);
    }));

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netusage=info,netusage_lib=info".into()),
        )
        .init();

    let root = config::storage_root()?;
    let layout = StorageLayout::new(root);
    layout
        .ensure_dirs()
        .with_context(|| format!("failed to prepare {}", layout.root().display()))?;
    tracing::info!("Storing usage history under {}", layout.root().display());

    let monitor = UsageMonitor::initialize(layout, &core::SysfsClassifier::new());
    let handle = BackgroundServices::start(
        monitor,
        core::counters::default_source(),
        Duration::from_secs(config::POLL_INTERVAL_SECS),
    )?;

    shutdown_signal().await;
    tracing::info!("Shutdown requested, stopping usage monitor");
    tokio::task::spawn_blocking(move || handle.join()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
