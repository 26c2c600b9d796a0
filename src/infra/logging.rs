use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber once, honoring `RUST_LOG` (default `info`).
///
/// Output goes to stderr: in stdio mode stdout carries the JSON-RPC stream.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Metric-shaped log line, alongside the `metrics` facade counters.
pub fn log_metric(scope: &str, metric: &str, value: f64) {
    tracing::info!(scope, metric, value, "metric");
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_is_idempotent() {
        super::init();
        super::init();
    }

    #[test]
    fn log_metric_does_not_require_a_subscriber() {
        super::log_metric("http", "request_latency_ms", 1.5);
    }
}
