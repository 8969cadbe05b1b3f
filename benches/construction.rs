use criterion::{AxisScale, BatchSize, BenchmarkId, Criterion, PlotConfiguration};
use criterion::{criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dap_index::builder::DapBuilder;
use dap_index::pfp::{self, PfpParams};
use dap_index::refs::RefCatalog;

/// A synthetic two-document corpus of total length `len` over a binary
/// alphabet, built deterministically so runs are comparable across sizes.
fn binary_corpus(len: usize, prob: f64) -> (RefCatalog, Vec<u8>) {
    let mut rng: StdRng = SeedableRng::from_seed([0; 32]);
    let half = len / 2;
    let mut text = Vec::with_capacity(len + 2);
    for _ in 0..half {
        text.push(if rng.gen_bool(prob) { b'0' } else { b'1' });
    }
    text.push(0x01);
    for _ in half..len {
        text.push(if rng.gen_bool(prob) { b'0' } else { b'1' });
    }
    text.push(0x00);

    let doc_ends = vec![half, text.len() - 1];
    let refs = RefCatalog::new(text.len(), doc_ends).unwrap();
    (refs, text)
}

pub fn bench(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group("construction");
    group.plot_config(plot_config);
    for n in [1000usize, 10_000usize, 100_000usize].iter() {
        group.bench_with_input(BenchmarkId::new("DapBuilder", n), n, |b, &n| {
            b.iter_batched(
                || {
                    let (refs, text) = binary_corpus(n, 0.5);
                    let pfp = pfp::build(&text, PfpParams::default()).unwrap();
                    let dir = tempfile::tempdir().unwrap();
                    (refs, pfp, dir)
                },
                |(refs, pfp, dir)| {
                    let prefix = dir.path().join("bench");
                    DapBuilder::new(&pfp, &refs).build(&prefix).unwrap();
                },
                BatchSize::SmallInput,
            )
        });
    }
}

criterion_group!(benches, bench);
criterion_main!(benches);
