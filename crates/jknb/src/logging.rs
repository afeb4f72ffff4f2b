//! Tracing setup for kernel processes.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::host_log_layer::HostLogLayer;

fn level_from(raw: Option<&str>) -> &'static str {
    match raw {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("warn") | Some("warning") => "warn",
        Some("error") => "error",
        _ => "info",
    }
}

/// `RUST_LOG` wins; otherwise `JKNB_LOG` picks the level for the `jknb` target.
fn build_filter() -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    let level = level_from(std::env::var("JKNB_LOG").ok().as_deref());
    EnvFilter::new(format!("warn,jknb={level}"))
}

fn use_json() -> bool {
    std::env::var("LOG_FORMAT").as_deref() == Ok("json")
}

/// Install a stderr subscriber. Later calls are ignored.
///
/// Stdout is left alone since hosts commonly read frames from it.
pub fn init_tracing() {
    init_with_host_layer(None);
}

/// Like [`init_tracing`], additionally shipping records to the host.
pub fn init_tracing_with_host(layer: HostLogLayer) {
    init_with_host_layer(Some(layer));
}

fn init_with_host_layer(host: Option<HostLogLayer>) {
    let registry = tracing_subscriber::registry().with(build_filter()).with(host);

    let result = if use_json() {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(err) = result {
        eprintln!("tracing init skipped: {err}");
    }
}
