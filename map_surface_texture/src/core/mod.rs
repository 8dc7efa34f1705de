//! Core implementation of the surface-to-texture bridge.
//!
//! This module contains:
//! - The collaborator interfaces for the renderer surface and the host texture registrar
//! - The per-surface [`TextureBridge`](bridge::TextureBridge) and its lifecycle
//! - The [`BridgeRegistry`](registry::BridgeRegistry) of live bridges
//! - Headless collaborators and, behind the `flutter` feature, the irondash texture adapter

pub mod bridge;
pub mod error;
#[cfg(feature = "flutter")]
pub mod flutter;
pub mod headless;
pub mod registry;
pub mod surface;
pub mod texture_registrar;

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use log::debug;
use parking_lot::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::api::plugin_types::LoggerConfig;

lazy_static::lazy_static! {
    static ref IS_LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);
    static ref WORKER_GUARD: Mutex<Option<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(None);
}

/// Installs the global log subscriber.
///
/// Records emitted through the `log` facade are forwarded to a `tracing` registry with a console
/// layer and, when [`LoggerConfig::log_directory`] is set, a daily-rolling file layer. The filter
/// comes from `RUST_LOG`, falling back to [`LoggerConfig::default_level`].
///
/// Only the first call installs anything; later calls return `Ok(())`.
pub fn init_logger(config: &LoggerConfig) -> anyhow::Result<()> {
    if IS_LOGGER_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_level))
        .context("invalid log filter")?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(config.with_ansi);

    let file_layer = config.log_directory.as_ref().map(|directory| {
        let file_appender =
            tracing_appender::rolling::daily(directory, &config.log_file_prefix);
        let (non_blocking_file_writer, guard) = tracing_appender::non_blocking(file_appender);
        WORKER_GUARD.lock().replace(guard);

        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_file_writer)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .boxed()
    });

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    if let Err(err) = result {
        IS_LOGGER_INITIALIZED.store(false, Ordering::SeqCst);
        WORKER_GUARD.lock().take();
        return Err(anyhow::anyhow!("failed to install log subscriber: {err}"));
    }

    debug!("Done initializing logger");
    Ok(())
}
