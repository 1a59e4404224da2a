//! TreeDN controller.
//!
//! Builds per-content-name multicast trees in a network of programmable
//! switches. Each switch punts the Interests it receives to the controller,
//! which routes them toward the content source and programs the arrival
//! switch to replicate the returning Data to every port that asked for it.

use futures::future::join_all;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use treedn_common::metrics::ControllerMetrics;
use treedn_common::Result;

pub mod config;
pub mod dispatcher;
pub mod installer;
pub mod name_table;
pub mod planner;
pub mod sim;
pub mod switch;
pub mod topology;
pub mod tree;

pub use config::ControllerConfig;
pub use name_table::{MulticastTree, NameTable};
pub use switch::SwitchConnection;
pub use topology::Topology;
pub use tree::{Interest, InterestOutcome, TreeBuilder};

use installer::RuleInstaller;
use planner::PathPlanner;

/// Wires the components together and owns the dispatcher tasks.
pub struct Controller {
    topology: Arc<Topology>,
    names: Arc<NameTable>,
    builder: Arc<TreeBuilder>,
    connections: Vec<Arc<dyn SwitchConnection>>,
    metrics: Arc<ControllerMetrics>,
    cancel: CancellationToken,
    dispatchers: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a controller for `topology` talking to `connections`.
    ///
    /// A content source missing from the topology is only reported here;
    /// every Interest then fails with `UnknownHost`.
    pub fn new(
        config: &ControllerConfig,
        topology: Arc<Topology>,
        connections: Vec<Arc<dyn SwitchConnection>>,
    ) -> Self {
        let metrics = Arc::new(ControllerMetrics::new());
        let names = Arc::new(NameTable::new());
        let planner = PathPlanner::new(Arc::clone(&topology), config.source_host());
        match planner.source_switch() {
            Ok(switch) => info!("Content source {} is on {}", config.source_host, switch),
            Err(e) => warn!("Content source not found, Interests will be dropped: {}", e),
        }

        for connection in &connections {
            if !topology.contains_switch(connection.id()) {
                warn!("[{}] Connection to a switch outside the topology", connection.id());
            }
        }
        for switch in topology.switch_ids() {
            if !connections.iter().any(|c| c.id() == switch) {
                warn!("[{}] No control connection; rules for it will fail", switch);
            }
        }

        let installer = Arc::new(RuleInstaller::new(
            Arc::clone(&topology),
            connections.iter().cloned(),
            Arc::clone(&metrics),
        ));
        let builder = Arc::new(TreeBuilder::new(
            planner,
            Arc::clone(&names),
            installer,
            Arc::clone(&metrics),
        ));
        info!("Controller ready: {} switches", topology.switch_ids().count());

        Self {
            topology,
            names,
            builder,
            connections,
            metrics,
            cancel: CancellationToken::new(),
            dispatchers: Mutex::new(Vec::new()),
        }
    }

    /// Spawn one dispatcher per switch connection.
    pub async fn start(&self) {
        let mut dispatchers = self.dispatchers.lock().await;
        for connection in &self.connections {
            dispatchers.push(dispatcher::spawn_dispatcher(
                Arc::clone(connection),
                Arc::clone(&self.builder),
                Arc::clone(&self.metrics),
                self.cancel.child_token(),
            ));
        }
        info!("Started {} dispatcher(s)", dispatchers.len());
    }

    /// Process an Interest directly, bypassing the notification streams.
    pub async fn handle_interest(&self, interest: &Interest) -> Result<InterestOutcome> {
        self.builder.handle_interest(interest).await
    }

    /// All multicast trees, ordered by id.
    pub async fn trees(&self) -> Vec<MulticastTree> {
        self.names.snapshot().await
    }

    pub fn names(&self) -> &Arc<NameTable> {
        &self.names
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn metrics(&self) -> &Arc<ControllerMetrics> {
        &self.metrics
    }

    /// Token whose cancellation stops every dispatcher.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for every dispatcher to finish on its own.
    pub async fn wait(&self) {
        let handles: Vec<_> = self.dispatchers.lock().await.drain(..).collect();
        for result in join_all(handles).await {
            if let Err(e) = result {
                warn!("Dispatcher task failed: {}", e);
            }
        }
    }

    /// Stop the dispatchers and wait for them.
    pub async fn shutdown(&self) {
        info!("Shutting down controller");
        self.cancel.cancel();
        self.wait().await;
    }
}
