use std::io;

use tracing_subscriber::EnvFilter;

/// Filter directive for the number of `-v` flags given.
fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialise logging on standard error.
///
/// Only `-v` raises the level, `RUST_LOG` is not read. Without it nothing
/// below `warn` is written.
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level_for(verbosity)))
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
