use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kmer::Kmer;
use std::hash::Hasher;
use twox_hash::xxh3;

#[inline]
fn xx_hash(key: u64) -> u64 {
    let mut xhash = xxh3::Hash64::default();
    xhash.write_u64(key);
    xhash.finish()
}

fn criterion_benchmark(c: &mut Criterion) {
    let m = Kmer::parse(&"ACGT".repeat(8)).expect("32-symbol k-mer parses");
    let key = m.value();

    c.bench_function("kmer_hash", |b| b.iter(|| black_box(m).hash()));
    c.bench_function("seahash", |b| {
        b.iter(|| seahash::hash(&black_box(key).to_be_bytes()))
    });
    c.bench_function("xx_hash", |b| b.iter(|| xx_hash(black_box(key))));
    c.bench_function("farmhash", |b| {
        b.iter(|| farmhash::hash64(&black_box(key).to_be_bytes()))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
