//! Logging Bootstrap
//!
//! Startup hook for embedding applications: call once before the first
//! lookup to route tracing output. Library code only emits events, so
//! hosts with their own subscriber can skip this entirely.

/// Initialize logging with an env-filterable formatter.
///
/// Honors `RUST_LOG` when set and defaults to `info`. Safe to call
/// more than once; later calls leave the installed subscriber alone.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
