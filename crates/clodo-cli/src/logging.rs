//! Tracing initialization, grounded on `aion-server`'s
//! `tracing_subscriber::registry()...with(EnvFilter)...with(fmt::layer())`
//! pattern. `DEBUG`/`VERBOSE` (spec.md §6) bump the default filter the
//! same way `-v`/`--verbose` does; `RUST_LOG` always wins when set.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init(verbose: bool) {
    let default_directive = if std::env::var("DEBUG").is_ok() || std::env::var("VERBOSE").is_ok() || verbose {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(false)).init();
}
