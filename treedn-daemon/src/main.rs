//! TreeDN controller daemon.
//!
//! Runs the controller against one simulated switch per topology switch.
//! Each stdin line `<switch> <port> <name>` is injected as an Interest
//! packet-in at that switch. On end of input or Ctrl-C the daemon stops and
//! prints the multicast trees it built.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use treedn_controller::sim::{NotificationSender, SimulatedSwitch};
use treedn_controller::{Controller, ControllerConfig, SwitchConnection, Topology};

/// TreeDN multicast tree controller
#[derive(Parser)]
#[clap(author, version, about)]
struct Args {
    /// Sets the level of verbosity
    #[clap(short, long)]
    verbose: bool,

    /// Configuration file (TOML or JSON)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Topology description, overrides the configured one
    #[clap(short, long)]
    topology: Option<PathBuf>,

    /// Content source host, overrides the configured one
    #[clap(short, long)]
    source: Option<String>,
}

/// One parsed input line.
#[derive(Debug, PartialEq, Eq)]
struct Injection {
    switch: String,
    port: u32,
    name: String,
}

fn parse_line(line: &str) -> Result<Option<Injection>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut fields = line.split_whitespace();
    let (Some(switch), Some(port), Some(name), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        bail!("expected `<switch> <port> <name>`, got {:?}", line);
    };
    let port = port
        .parse()
        .with_context(|| format!("invalid port {:?}", port))?;
    Ok(Some(Injection {
        switch: switch.to_string(),
        port,
        name: name.to_string(),
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ControllerConfig::load(args.config.as_deref())
        .context("Failed to load controller configuration")?;
    if let Some(topology) = args.topology {
        config.topology = Some(topology);
    }
    if let Some(source) = args.source {
        config.source_host = source;
    }

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if args.verbose { "debug" } else { config.log_level.as_str() },
    ))
    .init();
    debug!("Configuration: {:?}", config);

    let path = config
        .topology
        .clone()
        .context("No topology given; use --topology or set TREEDN_TOPOLOGY")?;
    let topology = Arc::new(
        Topology::load(&path).with_context(|| format!("Failed to load topology {}", path.display()))?,
    );

    let mut senders: HashMap<String, NotificationSender> = HashMap::new();
    let mut connections: Vec<Arc<dyn SwitchConnection>> = Vec::new();
    for id in topology.switch_ids() {
        let (switch, sender) = SimulatedSwitch::new(id.clone(), config.notification_buffer);
        connections.push(switch);
        senders.insert(id.to_string(), sender);
    }

    let controller = Controller::new(&config, Arc::clone(&topology), connections);
    controller.start().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let interrupted = loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break true,
            line = lines.next_line() => line.context("Failed to read stdin")?,
        };
        let Some(line) = line else {
            break false;
        };

        let injection = match parse_line(&line) {
            Ok(Some(injection)) => injection,
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping input line: {}", e);
                continue;
            }
        };
        match senders.get(&injection.switch) {
            Some(sender) => {
                if let Err(e) = sender.send_interest(injection.port, injection.name.as_str()).await {
                    warn!("[{}] Failed to inject Interest: {}", injection.switch, e);
                }
            }
            None => warn!("Unknown switch {} in input", injection.switch),
        }
    };

    if interrupted {
        info!("Interrupted");
        controller.shutdown().await;
    } else {
        // Let the dispatchers drain what was injected
        info!("End of input");
        drop(senders);
        controller.wait().await;
    }

    println!("Multicast trees:");
    for tree in controller.trees().await {
        println!("  tree {} {}", tree.id, tree.name);
        for (switch, ports) in &tree.membership {
            let ports: Vec<_> = ports.iter().map(|p| p.to_string()).collect();
            println!("    {} -> [{}]", switch, ports.join(", "));
        }
    }
    println!("{}", controller.metrics());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("s1 4 /live/a").unwrap(),
            Some(Injection {
                switch: "s1".to_string(),
                port: 4,
                name: "/live/a".to_string(),
            })
        );
        assert_eq!(parse_line("  # comment").unwrap(), None);
        assert_eq!(parse_line("").unwrap(), None);
        assert!(parse_line("s1 four A").is_err());
        assert!(parse_line("s1 4").is_err());
        assert!(parse_line("s1 4 A extra").is_err());
    }
}
