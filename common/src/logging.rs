//! Common logging initializer
//!

use std::sync::{Mutex, OnceLock};

use eyre::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_tree::HierarchicalLayer;

/// Keeps the file appender worker alive until [`close_logging`].
static LOG_GUARD: OnceLock<Mutex<Option<WorkerGuard>>> = OnceLock::new();

#[tracing::instrument]
pub fn init_logging(name: &'static str, use_tree: bool, use_file: Option<String>) -> Result<()> {
    // Initialise logging early
    //
    // Load filters from environment
    //
    let filter = EnvFilter::from_default_env();

    // Do we want hierarchical output?
    //
    let tree = if use_tree {
        Some(
            HierarchicalLayer::new(2)
                .with_ansi(true)
                .with_span_retrace(true)
                .with_span_modes(true)
                .with_targets(true)
                .with_verbose_entry(true)
                .with_verbose_exit(true)
                .with_bracketed_fields(true),
        )
    } else {
        None
    };

    // Log to file?
    //
    let file = use_file.map(|dir| {
        // Basic append-only rolling file for all traces.
        //
        let file_appender = tracing_appender::rolling::hourly(dir, name);
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(Mutex::new(Some(guard)));
        tracing_subscriber::fmt::layer().with_writer(writer)
    });

    // Combine filters & exporters
    //
    tracing_subscriber::registry()
        .with(filter)
        .with(tree)
        .with(file)
        .init();

    Ok(())
}

/// Flush and shut down the file appender, if one was set up.
///
#[tracing::instrument]
pub fn close_logging() {
    if let Some(guard) = LOG_GUARD.get() {
        if let Ok(mut guard) = guard.lock() {
            guard.take();
        }
    }
}
