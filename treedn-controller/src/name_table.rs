//! Name state table.
//!
//! Per-content-name multicast tree bookkeeping. This is the only mutable
//! state shared by all dispatchers: the name map sits behind a `RwLock` that
//! is held just long enough to find or create an entry, and each tree has its
//! own `Mutex` so that Interests for different names never wait on each
//! other while a membership update is in progress.

use log::debug;
use std::collections::{hash_map::Entry, BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use treedn_common::types::{ContentName, PortId, SwitchId, TreeId};

/// First id handed out; ids are never reused.
pub const FIRST_TREE_ID: u32 = 1;

/// The multicast tree of one content name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticastTree {
    pub id: TreeId,
    pub name: ContentName,
    /// Ports each switch replicates Data out of. Only ever grows.
    pub membership: BTreeMap<SwitchId, BTreeSet<PortId>>,
}

impl MulticastTree {
    fn new(id: TreeId, name: ContentName) -> Self {
        Self {
            id,
            name,
            membership: BTreeMap::new(),
        }
    }

    /// Current replication ports of `switch`.
    pub fn ports(&self, switch: &SwitchId) -> BTreeSet<PortId> {
        self.membership.get(switch).cloned().unwrap_or_default()
    }
}

/// Result of [`NameTable::add_member`].
#[derive(Debug, Clone)]
pub struct Membership {
    /// Tree state right after the update.
    pub tree: MulticastTree,
    /// The tree was allocated by this call.
    pub new_tree: bool,
    /// The port was not registered for the switch before.
    pub new_port: bool,
}

#[derive(Debug)]
struct Trees {
    by_name: HashMap<ContentName, Arc<Mutex<MulticastTree>>>,
    next_id: u32,
}

#[derive(Debug)]
pub struct NameTable {
    trees: RwLock<Trees>,
}

impl NameTable {
    pub fn new() -> Self {
        Self {
            trees: RwLock::new(Trees {
                by_name: HashMap::new(),
                next_id: FIRST_TREE_ID,
            }),
        }
    }

    /// Find the entry for `name`, allocating a tree id under the write lock if
    /// there is none yet.
    async fn entry(&self, name: &ContentName) -> (Arc<Mutex<MulticastTree>>, bool) {
        if let Some(tree) = self.trees.read().await.by_name.get(name) {
            return (Arc::clone(tree), false);
        }

        let mut guard = self.trees.write().await;
        let trees = &mut *guard;
        let id = TreeId(trees.next_id);
        match trees.by_name.entry(name.clone()) {
            // Another dispatcher created it between the two locks
            Entry::Occupied(existing) => (Arc::clone(existing.get()), false),
            Entry::Vacant(slot) => {
                let tree = Arc::new(Mutex::new(MulticastTree::new(id, name.clone())));
                slot.insert(Arc::clone(&tree));
                trees.next_id += 1;
                debug!("Allocated tree {} for {}", id, name);
                (tree, true)
            }
        }
    }

    /// Return the tree for `name`, creating it with a fresh id if absent.
    pub async fn get_or_create_tree(&self, name: &ContentName) -> MulticastTree {
        let (tree, _) = self.entry(name).await;
        let tree = tree.lock().await;
        tree.clone()
    }

    /// Register `port` of `switch` as a replication target for `name`.
    ///
    /// Creates the tree if needed. Adding an already present port changes
    /// nothing and reports `new_port == false`.
    pub async fn add_member(&self, name: &ContentName, switch: &SwitchId, port: PortId) -> Membership {
        let (entry, new_tree) = self.entry(name).await;
        let mut tree = entry.lock().await;
        let new_port = tree
            .membership
            .entry(switch.clone())
            .or_default()
            .insert(port);

        Membership {
            tree: tree.clone(),
            new_tree,
            new_port,
        }
    }

    /// Current state of the tree for `name`, if one exists.
    pub async fn get(&self, name: &ContentName) -> Option<MulticastTree> {
        let entry = self.trees.read().await.by_name.get(name).cloned()?;
        let tree = entry.lock().await;
        Some(tree.clone())
    }

    pub async fn len(&self) -> usize {
        self.trees.read().await.by_name.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// All trees, ordered by id.
    pub async fn snapshot(&self) -> Vec<MulticastTree> {
        let entries: Vec<_> = self.trees.read().await.by_name.values().cloned().collect();
        let mut trees = Vec::with_capacity(entries.len());
        for entry in entries {
            trees.push(entry.lock().await.clone());
        }
        trees.sort_by_key(|t| t.id);
        trees
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}
