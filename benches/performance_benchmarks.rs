use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use powercurve::import::parallel::BatchConfig;
use powercurve::synthetic::generate_ride;
use powercurve::{
    compute_activity_curve, decode, normalize, ActivityFile, DateRange, DurationGrid,
    PowerCurveEngine,
};

/// Performance benchmarks for the power-curve pipeline
///
/// Ride lengths and batch sizes are chosen to cover a short interval session
/// up to a season of long rides.

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("FIT Decode");

    for &seconds in &[1800u32, 3600, 14400] {
        let bytes = generate_ride(1_000_000_000, seconds, 230, 1);

        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("decode", seconds), &bytes, |b, bytes| {
            b.iter(|| decode(black_box(bytes)));
        });
    }

    group.finish();
}

fn bench_activity_curve(c: &mut Criterion) {
    let mut group = c.benchmark_group("Activity Curve");
    let grid = DurationGrid::standard();

    for &seconds in &[1800u32, 3600, 7200, 14400] {
        let bytes = generate_ride(1_000_000_000, seconds, 230, 2);
        let segments = normalize(decode(&bytes).unwrap());

        group.throughput(Throughput::Elements(seconds as u64));
        group.bench_with_input(
            BenchmarkId::new("compute_activity_curve", seconds),
            &segments,
            |b, segments| {
                b.iter(|| compute_activity_curve(black_box(segments), &grid));
            },
        );
    }

    group.finish();
}

fn bench_engine_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("Engine Batch");
    group.sample_size(10);

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let range = DateRange::new(start, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()).unwrap();
    let engine = PowerCurveEngine::new(DurationGrid::standard(), BatchConfig::default()).unwrap();

    for &count in &[10usize, 50, 200] {
        let activities: Vec<ActivityFile> = (0..count)
            .map(|i| {
                let date = start + chrono::Days::new((i % 365) as u64);
                ActivityFile::new(
                    format!("ride-{}", i),
                    "bench",
                    date,
                    generate_ride(1_000_000_000, 3600, 200 + (i % 50) as u16, i as u32),
                )
            })
            .collect();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("compute", count), &activities, |b, activities| {
            b.iter(|| engine.compute("bench", black_box(activities), &range));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_activity_curve, bench_engine_batch);
criterion_main!(benches);
