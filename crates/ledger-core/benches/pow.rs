use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ledger_core::{pow, BlockHash, BlockTemplate, CancelToken, TransferRecord};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;

fn template(rng: &mut StdRng) -> BlockTemplate {
    let txs: Vec<TransferRecord> = (0..10)
        .map(|i| TransferRecord::new(format!("alice-{i}"), "bob", rng.gen_range(1..10)))
        .collect();
    BlockTemplate::new(1_700_000_000_000, txs, BlockHash::ZERO)
}

fn bench_pow(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let template = template(&mut rng);

    let mut group = c.benchmark_group("search_nonce");
    for difficulty in 1..=3u32 {
        group.bench_with_input(
            BenchmarkId::new("sequential", difficulty),
            &difficulty,
            |b, &d| b.iter(|| pow::search_nonce(black_box(&template), d)),
        );
        group.bench_with_input(
            BenchmarkId::new("parallel", difficulty),
            &difficulty,
            |b, &d| {
                let cancel = CancelToken::new();
                b.iter(|| pow::search_nonce_parallel(black_box(&template), d, &cancel))
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_pow);
criterion_main!(benches);
