//! omdinv
//!
//! Ansible dynamic inventory backed by an OMD/Checkmk Livestatus socket

use chrono::Local;
use clap::Parser;
use color_eyre::Result;
use omdinv_inventory::{LivestatusClient, RenderOptions, render_host, render_list, render_static};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod location;

use cli::{Action, Cli};
use config::{Config, LogFormat};
use location::SocketEnv;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = Config::load_default(cli.config.as_deref())?;

    init_tracing(&config, cli.verbose);

    let env = SocketEnv::from_process();
    let connection = location::resolve(&cli.connection, &config.connection, &env)?;
    debug!(?connection, "resolved livestatus connection");

    let encoding = cli.encoding.unwrap_or(config.inventory.encoding);
    let key = cli.inventory_key(config.inventory.by_ip);

    let client = LivestatusClient::new(connection.transport(&config.connection))
        .with_encoding(encoding.into());
    let inventory = client.fetch_inventory(key).await?;

    let options = RenderOptions::new()
        .with_pretty(config.inventory.pretty)
        .with_sort_keys(config.inventory.sort_keys);

    let output = match cli.action.action() {
        Action::List => render_list(&inventory, options)?,
        Action::Host(host) => render_host(&inventory, &host, options)?,
        Action::Static => render_static(&inventory, Some(Local::now())),
    };
    println!("{output}");

    Ok(())
}

/// Log to stderr; stdout carries the inventory
fn init_tracing(config: &Config, verbose: u8) {
    let level = match verbose {
        0 => config.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match config.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
