//! # Logging
//! src/logging.rs
//!
//! Subscriber de `tracing` a stderr filtrado por `RUST_LOG`.
//!
//! ```bash
//! RUST_LOG=raw_http_server=debug ./raw_http_server
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filtro cuando `RUST_LOG` no está definida
pub const DEFAULT_FILTER: &str = "raw_http_server=info";

/// Instala el subscriber global. Solo la primera llamada tiene efecto.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_thread_names(true))
        .try_init();
}
