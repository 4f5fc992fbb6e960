//! Benchmarks for road synthesis and the self-intersection heuristic.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use road_search::{
    Configuration, GeometryConfig, GeometryRng, RoadSynthesizer, is_likely_self_intersecting,
};

fn bench_synthesize(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesize");

    for section_count in [2, 5, 10, 20] {
        let config = GeometryConfig {
            road_section_count: section_count,
            ..Default::default()
        };
        let synthesizer = RoadSynthesizer::new(&config).unwrap();
        let configuration = Configuration((0..2 * section_count).map(|i| i % 5).collect());
        let mut rng = GeometryRng::new(42);

        group.bench_with_input(
            BenchmarkId::from_parameter(section_count),
            &section_count,
            |b, _| {
                b.iter(|| synthesizer.synthesize(black_box(&configuration), &mut rng));
            },
        );
    }

    group.finish();
}

fn bench_self_intersection(c: &mut Criterion) {
    let mut group = c.benchmark_group("self_intersection");

    let config = GeometryConfig::default();
    let synthesizer = RoadSynthesizer::new(&config).unwrap();
    let mut rng = GeometryRng::new(42);
    let road = synthesizer.synthesize(&Configuration(vec![4; 10]), &mut rng);

    group.bench_function("default_road", |b| {
        b.iter(|| is_likely_self_intersecting(black_box(&road.points), 10.0));
    });

    group.finish();
}

criterion_group!(benches, bench_synthesize, bench_self_intersection);
criterion_main!(benches);
