use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `verbosity` (the `-v` count) picks the
/// level for this crate: 0 → warn, 1 → info, 2+ → debug.
pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub(crate) fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "campus_energy=warn",
        1 => "campus_energy=info",
        _ => "campus_energy=debug",
    }
}
