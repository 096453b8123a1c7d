use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Hub logging to stderr, `info` unless `RUST_LOG` says otherwise.
pub fn init_server_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,mdns_sd=warn"));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Client logging. The TUI owns the terminal, so logs go to `log_path`
/// and only when `RUST_LOG` is set.
pub fn init_client_tracing(log_path: &Path) {
    let Ok(env_filter) = EnvFilter::try_from_default_env() else {
        return;
    };
    let Ok(file) = OpenOptions::new().create(true).append(true).open(log_path) else {
        return;
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
