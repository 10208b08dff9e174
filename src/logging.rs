use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the global fmt subscriber once. `RUST_LOG` overrides `default_directive`.
pub fn init_tracing(default_directive: &str) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    });
}
