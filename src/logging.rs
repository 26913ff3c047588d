use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. `ATLAS_LOG` takes precedence over the
/// verbosity flag.
pub fn init(verbose: bool) {
    let default_directive = if verbose {
        "atlas_import=debug"
    } else {
        "atlas_import=info"
    };
    let filter = EnvFilter::try_from_env("ATLAS_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
