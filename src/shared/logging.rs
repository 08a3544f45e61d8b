use tracing_subscriber::EnvFilter;

pub const LOG_FILTER_ENV: &str = "TFDOCTOR_LOG";

/// Installs the process-wide subscriber. Output goes to stderr so stdout stays
/// reserved for the handler response.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
