use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured logging at `info` unless `RUST_LOG` says otherwise
pub fn init_logging() {
    init_logging_with_config("info", false);
}

/// Initialize structured logging with an explicit level and format
///
/// `RUST_LOG` takes precedence over `level` when it is set, e.g.
/// `RUST_LOG=qosping=debug` for per-probe detail or `RUST_LOG=qosping=trace`
/// to see every output line the parser skipped. Logs go to stderr so they
/// never interleave with the report on stdout.
pub fn init_logging_with_config(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_thread_names(true),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_names(true)
                    .with_line_number(true)
                    .with_file(true),
            )
            .init();
    }
}
