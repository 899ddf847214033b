mod net;
mod tui;

use anyhow::Context;
use clap::Parser;

use net::{ClientConfig, NetworkClient};

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Drop four game client")]
struct Args {
    #[arg(long, default_value = dropfour::DEFAULT_HOST, help = "Server host name or address")]
    host: String,

    #[arg(short, long, default_value_t = dropfour::DEFAULT_PORT)]
    port: u16,

    #[arg(long, default_value_t = 5, help = "Seconds to wait for the connection and seat")]
    connect_timeout: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = ClientConfig {
        host: args.host,
        port: args.port,
        connect_timeout_secs: args.connect_timeout,
        ..ClientConfig::default()
    };

    let client = NetworkClient::connect(&config)
        .with_context(|| format!("unable to join game at {}:{}", config.host, config.port))?;
    log::info!(
        "Seated as player {} at {}",
        client.player() + 1,
        client.server_addr()
    );

    tui::run_game(client, config.linger())?;
    log::info!("Exiting");

    Ok(())
}
