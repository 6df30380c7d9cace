//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Filter directive for a verbosity level: 0 warnings, 1 info, 2+ debug
pub const fn verbosity_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "setlyze=error";
    }
    match verbose {
        0 => "setlyze=warn",
        1 => "setlyze=info",
        _ => "setlyze=debug",
    }
}

/// Install the global subscriber writing to stderr
///
/// `RUST_LOG` takes precedence over the verbosity flags. Calling this
/// twice keeps the first subscriber.
pub fn init_tracing(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_directive(verbose, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
