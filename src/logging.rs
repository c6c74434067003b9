use tracing_subscriber::{fmt, EnvFilter};

/// Logs go to stderr so rendered views on stdout stay clean.
/// `RUST_LOG` overrides `level` when set.
pub fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gradebook={level},sqlx=warn")));

    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
