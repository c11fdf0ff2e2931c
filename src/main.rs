//! Table server (default binary).
//!
//! Reads `MAHJONG_*` environment variables and serves one four-seat table.
//! Log verbosity follows `RUST_LOG` (default: info).

use anyhow::Result;
use log::info;

use tw_mahjong::adapter::{run_server, ServerConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env();
    info!(
        "tw-mahjong server {} starting on {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.host,
        config.port
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_server(config, None))
}
