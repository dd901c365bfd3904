use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is unset: our crates at `info`, dependencies
/// (alloy, hyper, reqwest) only when they warn.
const DEFAULT_DIRECTIVES: &str =
    "warn,tokenkit_core=info,tokenkit_chain=info,tokenkit_deploy=info,api=info";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Initialise the global tracing subscriber.
///
/// Respects `RUST_LOG`. Calling it twice is harmless; the second call is ignored.
pub fn init() {
    if fmt().with_env_filter(filter()).with_target(true).try_init().is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
