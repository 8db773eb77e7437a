//! Dispatch benchmarks over a synthetic speaker data set
//!
//! ```sh
//! cargo bench -p vowel-normalizers --bench dispatch
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use formant_table::{Column, FormantTable};
use vowel_normalizers::{normalize, NormalizeOptions};

const VOWELS: [(&str, f64, f64, f64); 5] = [
    ("fleece", 300.0, 2300.0, 3000.0),
    ("trap", 800.0, 1700.0, 2600.0),
    ("goose", 320.0, 1200.0, 2400.0),
    ("lot", 700.0, 1100.0, 2500.0),
    ("ə", 500.0, 1500.0, 2500.0),
];

fn synthetic(speakers: usize, tokens: usize) -> FormantTable {
    let mut speaker = Vec::new();
    let mut vowel = Vec::new();
    let mut f = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];
    for s in 0..speakers {
        let scale = 1.0 + s as f64 * 0.03;
        for t in 0..tokens {
            let (label, f1, f2, f3) = VOWELS[t % VOWELS.len()];
            let jitter = 1.0 + ((t * 7 + s * 13) % 11) as f64 * 0.005;
            speaker.push(format!("s{}", s));
            vowel.push(label.to_string());
            f[0].push(120.0 * scale * jitter);
            f[1].push(f1 * scale * jitter);
            f[2].push(f2 * scale * jitter);
            f[3].push(f3 * scale * jitter);
        }
    }
    let [f0, f1, f2, f3] = f;
    FormantTable::from_columns(vec![
        ("speaker", Column::from(speaker)),
        ("vowel", Column::from(vowel)),
        ("f0", Column::from(f0)),
        ("f1", Column::from(f1)),
        ("f2", Column::from(f2)),
        ("f3", Column::from(f3)),
    ])
    .unwrap()
}

fn methods_bench(c: &mut Criterion) {
    let table = synthetic(40, 100);
    let options = NormalizeOptions::default();
    let mut group = c.benchmark_group("methods");
    group.throughput(Throughput::Elements(table.n_rows() as u64));
    for method in ["bark", "lobanov", "nearygm", "barkdiff", "wattfab1", "ie-ht", "pca"] {
        group.bench_with_input(BenchmarkId::new(method, table.n_rows()), &table, |b, t| {
            b.iter(|| normalize(black_box(t.clone()), method, &options).unwrap())
        });
    }
    group.finish();
}

fn scaling_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("lobanov_speakers");
    for speakers in [10, 100, 1000] {
        let table = synthetic(speakers, 50);
        group.throughput(Throughput::Elements(table.n_rows() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(speakers), &table, |b, t| {
            b.iter(|| {
                normalize(black_box(t.clone()), "lobanov", &NormalizeOptions::default()).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(dispatch_benches, methods_bench, scaling_bench);
criterion_main!(dispatch_benches);
