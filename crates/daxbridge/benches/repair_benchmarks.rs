//! Repair performance benchmarks.
//!
//! Measures repair cost across reply sizes and defect densities.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use daxbridge::repair::{clean, normalize, repair};
use daxbridge::schema::schema_from_statistics;
use daxbridge::ResultSet;
use serde_json::json;

/// Generate a fenced reply with `columns` group-by columns, a share of them
/// wrapped in date-part calls.
fn generate_reply(columns: usize, date_every: usize) -> String {
    let mut reply = String::from("```dax\nEVALUATE\nSUMMARIZECOLUMNS(\n");

    for i in 0..columns {
        if date_every > 0 && i % date_every == 0 {
            reply.push_str(&format!("    YEAR('Table {}'[Date_{}]),\n", i % 7, i));
        } else {
            reply.push_str(&format!("    'Table {}'[Column_{}],\n", i % 7, i));
        }
    }

    reply.push_str("    \"TotalSales\", SUM(Sales[Amount])\n)\n```\nNote: grouped as requested.");
    reply
}

/// Generate the redundant wrapper around a query with `columns` group-bys.
fn generate_wrapped(columns: usize) -> String {
    let groups: Vec<String> = (0..columns)
        .map(|i| format!("Sales[Column_{}]", i))
        .collect();
    format!(
        "EVALUATE CALCULATETABLE(ADDCOLUMNS(SUMMARIZECOLUMNS({}, \"TotalSales\", SUM(Sales[Amount])), \"TotalSales\", SUM(Sales[Amount])))",
        groups.join(", ")
    )
}

/// Generate a column statistics result for `tables` tables of 20 columns.
fn generate_statistics(tables: usize) -> ResultSet {
    let rows = (0..tables)
        .flat_map(|t| {
            (0..20).map(move |c| {
                let (min, max) = match c % 3 {
                    0 => (json!("2020-01-01T00:00:00"), json!("2024-12-31T00:00:00")),
                    1 => (json!(0), json!(1000)),
                    _ => (json!("A"), json!("Z")),
                };
                vec![json!(format!("Table{}", t)), json!(format!("Column{}", c)), min, max]
            })
        })
        .collect();
    ResultSet::from_values(
        vec![
            "Table Name".into(),
            "Column Name".into(),
            "Min".into(),
            "Max".into(),
        ],
        rows,
    )
}

/// Benchmark full repair on replies of various sizes.
fn bench_repair(c: &mut Criterion) {
    let mut group = c.benchmark_group("repair");

    for columns in [5, 50, 500].iter() {
        let reply = generate_reply(*columns, 3);
        group.throughput(Throughput::Bytes(reply.len() as u64));
        group.bench_with_input(BenchmarkId::new("columns", columns), &reply, |b, reply| {
            b.iter(|| black_box(repair(reply)))
        });
    }

    group.finish();
}

/// Benchmark each stage separately.
fn bench_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("repair_stages");
    let reply = generate_reply(100, 2);

    group.bench_function("normalize", |b| b.iter(|| black_box(normalize(&reply))));
    group.bench_function("clean", |b| b.iter(|| black_box(clean(&reply))));

    for columns in [5, 50, 500].iter() {
        let wrapped = generate_wrapped(*columns);
        group.bench_with_input(BenchmarkId::new("wrapper", columns), &wrapped, |b, text| {
            b.iter(|| black_box(normalize(text)))
        });
    }

    group.finish();
}

/// Benchmark schema construction from column statistics.
fn bench_schema_from_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema_from_statistics");

    for tables in [1, 10, 100].iter() {
        let stats = generate_statistics(*tables);
        group.bench_with_input(BenchmarkId::new("tables", tables), &stats, |b, stats| {
            b.iter(|| black_box(schema_from_statistics(stats)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_repair,
    bench_stages,
    bench_schema_from_statistics,
);
criterion_main!(benches);
