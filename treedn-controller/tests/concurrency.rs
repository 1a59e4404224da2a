mod common;

use common::{sw, Fixture};
use futures::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use treedn_common::types::{PortId, TreeId};
use treedn_controller::name_table::NameTable;
use treedn_controller::{Interest, Topology};

/// Star around `s0` with the source on `s0`.
fn star(leaves: usize) -> Topology {
    let mut builder = Topology::builder().host("h1", "s0");
    for i in 1..=leaves {
        builder = builder.link("s0", &format!("s{}", i));
    }
    builder.build().unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_interests_share_one_tree() {
    let fx = Arc::new(Fixture::new(star(8)));

    let tasks = (1..=8).map(|i| {
        let fx = Arc::clone(&fx);
        tokio::spawn(async move {
            fx.controller
                .handle_interest(&Interest::new(format!("s{}", i).as_str(), 9, "A"))
                .await
        })
    });
    let outcomes: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let ids: BTreeSet<_> = outcomes.iter().map(|o| o.tree_id).collect();
    assert_eq!(ids, BTreeSet::from([TreeId(1)]));
    assert_eq!(outcomes.iter().filter(|o| o.new_tree).count(), 1);

    let trees = fx.controller.trees().await;
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].membership.len(), 8);
    assert_eq!(fx.controller.metrics().trees_created.value(), 1);

    // The source switch needs no rules of its own
    assert!(fx.switch("s0").writes().await.is_empty());
    for i in 1..=8 {
        let tables = fx.switch(&format!("s{}", i)).tables().await;
        assert_eq!(tables.fib.len(), 1);
        assert_eq!(tables.groups.get(&TreeId(1)), Some(&BTreeSet::from([PortId(9)])));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ports_on_one_switch_all_land() {
    let fx = Arc::new(Fixture::new(star(1)));

    let tasks = (10..30).map(|port| {
        let fx = Arc::clone(&fx);
        tokio::spawn(async move {
            fx.controller
                .handle_interest(&Interest::new("s1", port, "A"))
                .await
        })
    });
    for joined in join_all(tasks).await {
        joined.unwrap().unwrap();
    }

    let expected: BTreeSet<_> = (10..30).map(PortId).collect();
    let tree = fx.controller.names().get(&"A".into()).await.unwrap();
    assert_eq!(tree.ports(&sw("s1")), expected);

    // Whatever order the group writes landed in, the last one is complete
    let tables = fx.switch("s1").tables().await;
    assert_eq!(tables.groups.get(&TreeId(1)), Some(&expected));
    assert_eq!(fx.controller.metrics().forwarding_writes.value(), 1);
    assert_eq!(fx.controller.metrics().binding_writes.value(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_names_get_unique_ids() {
    let table = Arc::new(NameTable::new());

    let tasks = (0..32).map(|i| {
        let table = Arc::clone(&table);
        tokio::spawn(async move {
            let name = format!("/n/{}", i % 16).into();
            table.add_member(&name, &sw("s1"), PortId(i)).await.tree.id
        })
    });
    let ids: Vec<_> = join_all(tasks).await.into_iter().map(|j| j.unwrap()).collect();

    let unique: BTreeSet<_> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 16);
    assert_eq!(unique.iter().next(), Some(&TreeId(1)));
    assert_eq!(unique.iter().last(), Some(&TreeId(16)));
    assert_eq!(table.len().await, 16);
}
