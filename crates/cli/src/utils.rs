use tracing_subscriber::{EnvFilter, prelude::*};

/// Initializes a tracing subscriber writing to stderr, filtered by `RUST_LOG`.
pub fn subscriber() {
    let registry = tracing_subscriber::Registry::default()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    if let Err(err) = registry.try_init() {
        eprintln!("failed to initialize tracing subscriber: {err}");
    }
}

/// Disables terminal colors if stdout is not a terminal or `NO_COLOR` is set.
pub fn enable_paint() {
    let enable = yansi::Condition::os_support() && yansi::Condition::tty_and_color_live();
    yansi::whenever(yansi::Condition::cached(enable));
}
