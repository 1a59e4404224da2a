use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use std::path::PathBuf;
use treedn_controller::{ControllerConfig, Topology};

mod commands;
mod utils;

/// TreeDN operator command line interface
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Sets the level of verbosity
    #[clap(short, long, global = true)]
    verbose: bool,

    /// Controller configuration file (TOML or JSON)
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    /// Topology description, overrides the configured one
    #[clap(short, long, global = true)]
    topology: Option<PathBuf>,

    /// Subcommand to execute
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the path an Interest takes from a switch to the content source
    Path {
        /// Switch the Interest arrives at
        switch: String,

        /// Content name, only used for logging
        #[clap(short, long, default_value = "/")]
        name: String,

        /// Content source host, overrides the configured one
        #[clap(short, long)]
        source: Option<String>,
    },

    /// Summarize the topology: switches, links with ports, hosts
    Topology,

    /// Encode a TreeDN packet as an Ethernet frame and print it as hex
    Frame {
        #[clap(subcommand)]
        cmd: FrameCommands,
    },

    /// Decode a hex Ethernet frame
    Decode {
        /// Frame bytes as hex; whitespace and colons are ignored
        hex: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum FrameCommands {
    /// Interest for a name
    Interest {
        name: String,

        #[clap(long, default_value = "64")]
        hop_limit: u8,

        /// Source MAC address
        #[clap(long, default_value = "02:00:00:00:00:01")]
        src: String,
    },

    /// Data for a name
    Data {
        name: String,

        /// Payload (string)
        payload: String,

        #[clap(long, default_value = "64")]
        hop_limit: u8,

        /// Source MAC address
        #[clap(long, default_value = "02:00:00:00:00:01")]
        src: String,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let config = ControllerConfig::load(cli.config.as_deref())
        .context("Failed to load controller configuration")?;

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if cli.verbose { "debug" } else { config.log_level.as_str() },
    ))
    .init();
    debug!("Configuration: {:?}", config);

    let topology_path = cli.topology.clone().or_else(|| config.topology.clone());
    let load_topology = || -> Result<Topology> {
        let path = topology_path
            .as_ref()
            .context("No topology given; use --topology or set TREEDN_TOPOLOGY")?;
        Topology::load(path).with_context(|| format!("Failed to load topology {}", path.display()))
    };

    // Execute the specified command
    match cli.command {
        Commands::Path { switch, name, source } => {
            let source = source.unwrap_or_else(|| config.source_host.clone());
            commands::path::show_path(load_topology()?, &source, &switch, &name)?;
        }
        Commands::Topology => {
            commands::topology::show_topology(&load_topology()?)?;
        }
        Commands::Frame { cmd } => {
            commands::frame::encode(cmd)?;
        }
        Commands::Decode { hex } => {
            commands::frame::decode(&hex)?;
        }
    }

    Ok(())
}
