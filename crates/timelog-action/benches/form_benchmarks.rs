//! Benchmarks for form rendering and commit planning.
//!
//! Measures the pure per-launch work: turning queried rows into form fields,
//! and turning a submitted form into an ordered commit plan. Gateway round
//! trips are excluded.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};
use timelog_action::form::{build_form, decode_values};
use timelog_action::{plan_commit, TimelogRecord};

/// Generate a queried time log row as returned by the gateway.
fn generate_row(index: usize) -> Value {
    json!({
        "id": format!("timelog-{:05}", index),
        "comment": format!("Review notes for shot {}", index),
        "context_id": "task-1",
        "duration": (index % 8 + 1) * 900,
        "name": null,
        "start": "2024-03-01T09:00:00",
        "user": {"first_name": "Artist", "last_name": format!("{}", index % 12)}
    })
}

/// Submitted values for `count` records, every fourth flagged for deletion.
fn generate_submission(count: usize) -> Value {
    let values: serde_json::Map<String, Value> = (0..count)
        .map(|i| {
            (
                format!("timelog-{:05}", i),
                json!([format!("edited {}", i), i * 60, i % 4 == 0]),
            )
        })
        .collect();
    Value::Object(values)
}

fn bench_build_form(c: &mut Criterion) {
    let records: Vec<TimelogRecord> = (0..200)
        .map(|i| serde_json::from_value(generate_row(i)).unwrap())
        .collect();

    let mut group = c.benchmark_group("form");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("decode_rows_200", |b| {
        let rows: Vec<Value> = (0..200).map(generate_row).collect();
        b.iter(|| {
            rows.iter()
                .cloned()
                .map(serde_json::from_value::<TimelogRecord>)
                .collect::<Result<Vec<_>, _>>()
        });
    });

    group.bench_function("build_form_200", |b| {
        b.iter(|| build_form(black_box(&records)));
    });

    group.finish();
}

fn bench_plan_commit(c: &mut Criterion) {
    let submission = generate_submission(200);

    let mut group = c.benchmark_group("commit");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("decode_values_200", |b| {
        b.iter(|| decode_values(black_box(&submission)));
    });

    // Decoded once; planning alone
    let values = decode_values(&submission).unwrap();
    group.bench_function("plan_commit_200", |b| {
        b.iter(|| plan_commit(black_box(&values)));
    });

    group.finish();
}

criterion_group!(benches, bench_build_form, bench_plan_commit);
criterion_main!(benches);
