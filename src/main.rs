//! ZLL gateway bridge daemon
//!
//! Bridges TCP control clients and an interactive console to a
//! serial-attached ZigBee Light Link coordinator.

use std::env;
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use zll_gateway::console::spawn_console_reader;
use zll_gateway::error::Error;
use zll_gateway::scheduler::Scheduler;
use zll_gateway::transport::SerialTransport;
use zll_gateway::{AppConfig, Result};

/// Parse config path from command line arguments.
///
/// Supports:
/// - `zll-gatewayd <path>` (positional)
/// - `zll-gatewayd --config <path>` (flag-based)
/// - `zll-gatewayd -c <path>` (short flag)
///
/// Defaults to `/etc/zll-gateway.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "/etc/zll-gateway.toml".to_string()
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let config = AppConfig::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("config {} not usable ({}), using defaults", config_path, e);
        AppConfig::defaults()
    });

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.logging.level),
    )
    .init();

    log::info!("zll-gateway starting (config: {})", config_path);

    let link = SerialTransport::open(&config.serial.port, config.serial.baud_rate)?;
    log::info!(
        "serial link open on {} at {} baud",
        config.serial.port,
        config.serial.baud_rate
    );

    let listener = TcpListener::bind(&config.network.bind_address)
        .map_err(|e| Error::Other(format!("failed to bind {}: {}", config.network.bind_address, e)))?;
    log::info!("listening on {}", config.network.bind_address);

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("error setting Ctrl-C handler: {}", e)))?;

    let console_rx = spawn_console_reader()?;

    let mut scheduler = Scheduler::new(link, listener, console_rx, running)?;
    scheduler.run()?;

    log::info!("zll-gateway stopped");
    Ok(())
}
