use contact_fl::consensus::{ConsensusWeightBuilder, GossipAverager};
use contact_fl::core::DenseMatrix;
use contact_fl::federated::{FederatedTrainer, TrainerConfig};
use contact_fl::graph::GraphModel;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Ring lattice where each node links to its `k` nearest neighbours on each side.
fn ring_lattice(n: usize, k: usize) -> GraphModel {
    let features = (0..n)
        .map(|i| {
            let t = i as f64 / n as f64;
            vec![t, 1.0 - t, (t * 6.0).sin(), (t * 6.0).cos(), t * t, 0.5]
        })
        .collect();
    let labels = (0..n).map(|i| (i % 4 == 0) as u8).collect();
    let edges: Vec<_> = (0..n)
        .flat_map(|i| (1..=k).map(move |j| (i, (i + j) % n)))
        .collect();
    GraphModel::new(features, labels, &edges).expect("valid lattice")
}

fn bench_gossip(c: &mut Criterion) {
    let mut group = c.benchmark_group("gossip");
    for n in [100, 400] {
        let graph = ring_lattice(n, 3);
        let weights = ConsensusWeightBuilder::new().build(&graph);
        let initial = DenseMatrix::zeros(n, 7);

        group.bench_with_input(BenchmarkId::new("sequential", n), &n, |b, _| {
            b.iter(|| {
                GossipAverager::new()
                    .average(black_box(&initial), &weights, 50)
                    .expect("shapes match")
            })
        });
        group.bench_with_input(BenchmarkId::new("parallel", n), &n, |b, _| {
            b.iter(|| {
                GossipAverager::new()
                    .with_parallel(true)
                    .average(black_box(&initial), &weights, 50)
                    .expect("shapes match")
            })
        });
    }
    group.finish();
}

fn bench_training(c: &mut Criterion) {
    let graph = ring_lattice(200, 3);
    c.bench_function("train_default_200", |b| {
        b.iter(|| {
            let mut trainer =
                FederatedTrainer::new(black_box(&graph), TrainerConfig::default()).expect("valid");
            trainer.train().expect("training runs")
        })
    });
}

criterion_group!(benches, bench_gossip, bench_training);
criterion_main!(benches);
