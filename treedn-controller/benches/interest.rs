use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tokio::runtime::Runtime;
use treedn_common::wire::{decode_frame, encode_frame, Packet};
use treedn_controller::sim::{SimulatedSwitch, HOST_MAC};
use treedn_controller::{Controller, ControllerConfig, Interest, SwitchConnection, Topology};

/// A chain `s0 - s1 - ... - s{len-1}` with the source on the last switch.
fn chain(len: usize) -> Topology {
    let mut builder = Topology::builder().host("h1", &format!("s{}", len - 1));
    for i in 1..len {
        builder = builder.link(&format!("s{}", i - 1), &format!("s{}", i));
    }
    builder.build().expect("chain topology")
}

fn controller(topology: Topology) -> Controller {
    let connections: Vec<Arc<dyn SwitchConnection>> = topology
        .switch_ids()
        .map(|id| SimulatedSwitch::new(id.clone(), 1).0 as Arc<dyn SwitchConnection>)
        .collect();
    Controller::new(&ControllerConfig::default(), Arc::new(topology), connections)
}

fn bench_interest(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("handle_interest");

    for len in [2usize, 8, 32] {
        let controller = &controller(chain(len));
        let mut port = 0u32;
        group.bench_with_input(BenchmarkId::new("new_port", len), &len, |b, _| {
            b.to_async(&rt).iter(|| {
                port = port.wrapping_add(1);
                let interest = Interest::new("s0", port, "/bench/content");
                async move { controller.handle_interest(&interest).await.expect("interest") }
            })
        });

        let interest = &Interest::new("s0", 1, "/bench/content");
        group.bench_with_input(BenchmarkId::new("repeat", len), &len, |b, _| {
            b.to_async(&rt).iter(move || async move {
                controller.handle_interest(interest).await.expect("interest")
            })
        });
    }
    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let frame = encode_frame(HOST_MAC, &Packet::interest("/bench/content/segment/0")).expect("frame");
    c.bench_function("decode_frame", |b| b.iter(|| decode_frame(&frame).expect("decode")));
}

criterion_group!(benches, bench_interest, bench_codec);
criterion_main!(benches);
