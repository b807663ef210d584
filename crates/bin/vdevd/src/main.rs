//! # vdevd — virtual device daemon
//!
//! Composition root that wires all adapters together and runs the scheduler.
//!
//! ## Responsibilities
//! - Parse configuration (`vdev.toml`, env vars, device lists)
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct backend clients (adapters)
//! - Build the device registry, injecting adapters via port traits
//! - Drive the short and long poll cadences
//! - Forward device events to the log
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::time::Duration;

use tracing_subscriber::EnvFilter;
use vdev_adapter_isy::IsyClient;
use vdev_adapter_ratgdo::RatgdoClient;
use vdev_adapter_storage_sqlite_sqlx::{Config as DbConfig, SqliteRecordStore};
use vdev_app::registry::{DeviceRegistry, PollKind};
use vdev_app::status_bus::StatusBus;
use vdev_domain::device::DeviceParams;
use vdev_domain::event::DeviceEvent;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = DbConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let store = SqliteRecordStore::new(db.pool().clone());

    // Status bus; subscribe before devices start so startup notices land in
    // the log too
    let bus = StatusBus::new(256);
    spawn_event_logger(bus.subscribe());

    // Backend clients
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let specs = config.device_specs()?;
    if config.needs_variable_host(&specs) && config.isy.host.is_empty() {
        tracing::warn!(
            "devices reference controller variables but no [isy] host is configured; their backend reads will fail"
        );
    }
    let vars = IsyClient::new(http.clone(), &config.isy.host, config.isy_credentials());
    let rest = {
        let http = http.clone();
        move |host: &str| RatgdoClient::new(http.clone(), host)
    };

    // Probe each configured door controller before its device goes live.
    // A failed probe is a notice, not a startup failure: the reconciler
    // freezes on its own until the controller answers.
    for spec in &specs {
        if let DeviceParams::Garage(params) = &spec.params {
            if let Some(host) = &params.ratgdo {
                if let Err(error) = RatgdoClient::new(http.clone(), host)
                    .check_availability()
                    .await
                {
                    tracing::warn!(device = %spec.id, host = %host, %error, "door controller did not answer its availability probe");
                }
            }
        }
    }

    let mut registry = DeviceRegistry::new(store, bus.clone(), vars, rest);
    registry.apply(specs).await?;
    tracing::info!(devices = registry.len(), "vdevd running");

    let mut short = tokio::time::interval(Duration::from_secs(config.poll.short_seconds));
    let mut long = tokio::time::interval(Duration::from_secs(config.poll.long_seconds));
    // intervals fire immediately; swallow the first tick of each so startup
    // does not double-poll
    short.tick().await;
    long.tick().await;

    loop {
        tokio::select! {
            _ = short.tick() => registry.poll(PollKind::Short).await,
            _ = long.tick() => registry.poll(PollKind::Long).await,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tracing::info!("shutting down");
    registry.stop().await;
    Ok(())
}

/// Forward every device event to the log. Reports and notices are the
/// operator-facing surface; plain status updates stay at debug.
fn spawn_event_logger(mut rx: tokio::sync::broadcast::Receiver<DeviceEvent>) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(DeviceEvent::Status { device, update }) => {
                    tracing::debug!(device = %device, ?update, "status");
                }
                Ok(DeviceEvent::Report { device, command }) => {
                    tracing::info!(device = %device, command = %command, "report");
                }
                Ok(DeviceEvent::Notice { device, message }) => {
                    tracing::warn!(?device, message = %message, "notice");
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event log fell behind");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
