// Define a new module for logging initialization
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Installs the global subscriber. `serve` always wants lifecycle logs, so
/// `default_level` sets the floor when `verbose` is off.
pub fn init_logging(verbose: bool, default_level: LevelFilter) {
    let level_filter = if verbose {
        LevelFilter::DEBUG
    } else {
        default_level
    };
    let app_filter = Targets::new().with_target("rublebot", level_filter);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_filter.to_string()));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time())
        .with(app_filter)
        .with(env_filter)
        .init();
}
