use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use population::{split_into_batches, AttributeSource, PopulationGenerator, PopulationSpec};
use rand::rngs::StdRng;
use rand::SeedableRng;

const POPULATION_SIZE: usize = 10_000;

fn bench_spec() -> PopulationSpec {
    let mut spec = PopulationSpec::default();
    spec.attributes.insert(
        "skill".to_string(),
        AttributeSource::Normal {
            median: 1000.0,
            std_dev: 400.0,
        },
    );
    spec.latency.insert(
        "us-east-1".to_string(),
        AttributeSource::Candidates(vec![20.0, 40.0, 60.0, 80.0]),
    );
    spec
}

fn bench_population(c: &mut Criterion) {
    let mut group = c.benchmark_group("population");
    group.throughput(Throughput::Elements(POPULATION_SIZE as u64));

    group.bench_function(BenchmarkId::new("generate", POPULATION_SIZE), |b| {
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| {
            let mut generator = PopulationGenerator::new(bench_spec());
            black_box(generator.generate(POPULATION_SIZE, &mut rng));
        });
    });

    group.bench_function(BenchmarkId::new("split_into_batches", POPULATION_SIZE), |b| {
        let mut rng = StdRng::seed_from_u64(11);
        let players = PopulationGenerator::new(bench_spec()).generate(POPULATION_SIZE, &mut rng);
        b.iter(|| {
            black_box(split_into_batches(players.clone(), 8, &mut rng));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_population);
criterion_main!(benches);
