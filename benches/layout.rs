use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use family_layout::config::LayoutOptions;
use family_layout::graph::{CollapseSet, NodeKey, build_graph};
use family_layout::ir::{Direction, FamilyDataset, Person};
use family_layout::layout::{LayoutStrategy, compute_layout};
use family_layout::layout_dump::LayoutDump;
use family_layout::validate::validate_graph;
use std::hint::black_box;

/// Every person in generations before the last marries and has `fanout` kids.
fn generated_family(generations: usize, fanout: usize) -> FamilyDataset {
    let mut members = Vec::new();
    let mut current = vec!["g0-0".to_string()];
    members.push(Person::new("g0-0", "Founder"));

    for generation in 1..generations {
        let mut next = Vec::new();
        for (idx, parent) in current.iter().enumerate() {
            let spouse = format!("s{generation}-{idx}");
            members.push(Person::new(spouse.clone(), "Spouse").with_spouse(parent.clone()));
            if let Some(person) = members.iter_mut().find(|person| &person.id == parent) {
                person.spouse_id = Some(spouse.clone());
            }
            for kid in 0..fanout {
                let id = format!("g{generation}-{}", idx * fanout + kid);
                members.push(Person::new(id.clone(), "Child").with_parents([parent.clone(), spouse.clone()]));
                next.push(id);
            }
        }
        current = next;
    }
    FamilyDataset::new(members, Direction::TopDown)
}

const SIZES: [(&str, usize, usize); 3] = [("small", 3, 2), ("medium", 4, 3), ("large", 5, 4)];

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for (name, generations, fanout) in SIZES {
        let dataset = generated_family(generations, fanout);
        let collapsed: CollapseSet = [NodeKey::couple("g1-0", "s2-0")].into_iter().collect();
        group.bench_with_input(BenchmarkId::new("expanded", name), &dataset, |b, dataset| {
            b.iter(|| {
                let graph = build_graph(black_box(dataset), &CollapseSet::new());
                black_box(graph.nodes.len());
            });
        });
        group.bench_with_input(BenchmarkId::new("collapsed", name), &dataset, |b, dataset| {
            b.iter(|| {
                let graph = build_graph(black_box(dataset), &collapsed);
                black_box(graph.nodes.len());
            });
        });
    }
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    for (name, generations, fanout) in SIZES {
        let graph = build_graph(&generated_family(generations, fanout), &CollapseSet::new());
        group.bench_with_input(BenchmarkId::from_parameter(name), &graph, |b, graph| {
            b.iter(|| {
                let report = validate_graph(black_box(&graph.nodes), &graph.edges);
                black_box(report.warnings.len());
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let options = LayoutOptions::default().with_direction(Direction::TopDown);
    for (name, generations, fanout) in SIZES {
        let graph = build_graph(&generated_family(generations, fanout), &CollapseSet::new());
        for strategy in [LayoutStrategy::Layered, LayoutStrategy::Tree] {
            group.bench_with_input(
                BenchmarkId::new(format!("{strategy:?}").to_lowercase(), name),
                &graph,
                |b, graph| {
                    b.iter(|| {
                        let result = compute_layout(black_box(&graph.nodes), &graph.edges, &options, strategy);
                        black_box(result.nodes.len());
                    });
                },
            );
        }
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let options = LayoutOptions::default().with_direction(Direction::TopDown);
    let json = generated_family(4, 3).to_json().expect("serialize failed");
    group.bench_function("medium_tree_dump", |b| {
        b.iter(|| {
            let dataset = FamilyDataset::from_json(black_box(&json)).expect("parse failed");
            let graph = build_graph(&dataset, &CollapseSet::new());
            let result = compute_layout(&graph.nodes, &graph.edges, &options, LayoutStrategy::Tree);
            let dump = LayoutDump::from_result(&result, &result.nodes, &graph.edges, &options, LayoutStrategy::Tree);
            black_box(serde_json::to_string(&dump).expect("dump failed"));
        });
    });
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_build, bench_validate, bench_layout, bench_end_to_end
);
criterion_main!(benches);
