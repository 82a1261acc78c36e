pub mod config;
pub mod sim;
pub mod unified;
pub(self) mod test_utils;

use tracing_subscriber::EnvFilter;

/// install the global subscriber, `RUST_LOG` wins over `default_filter`
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .unwrap_or_else(|e| {
            eprintln!("fail to set tracing subscriber: {e}");
        });
}
