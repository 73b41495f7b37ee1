use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: this crate and the `plasma` binary at
/// info, HTTP and TLS dependencies at warn.
pub const DEFAULT_FILTER: &str = "warn,plasma_account=info,plasma=info";

/// Installs the global subscriber. `RUST_LOG` overrides [`DEFAULT_FILTER`];
/// `PLASMA_LOG_JSON=1` switches to JSON lines.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let use_json = std::env::var("PLASMA_LOG_JSON")
        .map(|value| value == "1")
        .unwrap_or(false);

    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .pretty()
            .with_writer(std::io::stderr)
            .try_init();
    }
}
