use std::io::{stdout, IsTerminal};
use tracing_subscriber::EnvFilter;

/// Terminal runs get ANSI pretty output; anything else (containers, service
/// managers) gets JSON lines. `RUST_LOG` overrides the default filter, which
/// keeps the bot and its HTTP trace layer at `info`.
pub fn setup_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("storebot=info,tower_http=info"));

    if stdout().is_terminal() {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_ansi(true)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_target(true)
            .init();
    }
}
