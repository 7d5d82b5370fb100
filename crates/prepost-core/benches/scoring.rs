use criterion::{black_box, criterion_group, criterion_main, Criterion};
use prepost_core::engine::assign;
use prepost_core::model::{Catalog, Constraints, QuestionItem, SearchBudget};
use prepost_core::score::{Checker, ScoreStrategy, SideTally, WeightedPenalty};

fn synthetic_catalog(items: usize) -> Catalog {
    let concepts = ["genetics", "ecology", "cells", "evolution"];
    let catalog = (0..items)
        .map(|i| {
            let subparts = 1 + (i % 4) as u32;
            QuestionItem {
                id: format!("q{i:03}"),
                concept: concepts[i % concepts.len()].to_string(),
                subparts,
                true_count: subparts / 2,
                false_count: subparts - subparts / 2,
            }
        })
        .collect();
    Catalog::new(catalog)
}

fn bench_measure(c: &mut Criterion) {
    let catalog = synthetic_catalog(60);
    let ids: Vec<String> = catalog.iter().map(|i| i.id.clone()).collect();
    let (left, right) = ids.split_at(30);
    let tally_a = SideTally::from_ids(left, &catalog);
    let tally_b = SideTally::from_ids(right, &catalog);
    let constraints = Constraints::default();
    let concepts = catalog.concepts();
    let checker = Checker {
        constraints: &constraints,
        target_size: 30,
        available: catalog.len(),
        concepts: &concepts,
    };
    let strategy = WeightedPenalty::default();

    c.bench_function("measure_and_score_60_items", |b| {
        b.iter(|| {
            let violations = checker.measure(black_box(&tally_a), black_box(&tally_b));
            black_box(strategy.score(&violations))
        })
    });
}

fn bench_assign(c: &mut Criterion) {
    let catalog = synthetic_catalog(40);
    let constraints = Constraints {
        search: SearchBudget {
            seed: Some(7),
            ..SearchBudget::default()
        },
        ..Constraints::default()
    };

    c.bench_function("assign_40_item_catalog", |b| {
        b.iter(|| assign(black_box(&catalog), black_box(&constraints)).unwrap())
    });
}

criterion_group!(benches, bench_measure, bench_assign);
criterion_main!(benches);
