//! Criterion measurements for the named-placeholder rewriter and for a single-row lookup
//! through a session versus raw `rusqlite`, so rewriting and binding overhead stay visible.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sql_session::prelude::*;
use sql_session::translation::NamedStatement;
use sql_session::{named_params, params};

const SHORT: &str = "SELECT id, name FROM users WHERE id = :id";

const LONG: &str = "SELECT o.id, o.total, c.name
    FROM orders o JOIN customers c ON c.id = o.customer_id
    WHERE o.created_at >= :from AND o.created_at < :to
      AND c.region = :region -- :ignored in comments
      AND o.note <> ':not_a_param'
      AND (o.status = :status OR o.status = :fallback_status)
      AND o.total::numeric > :min_total
    ORDER BY o.created_at";

fn bench_rewrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("rewrite");
    for (label, sql) in [("short", SHORT), ("long", LONG)] {
        group.throughput(Throughput::Bytes(sql.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), sql, |b, sql| {
            b.iter(|| NamedStatement::parse(black_box(sql)));
        });
    }
    group.finish();
}

fn seeded_session() -> Session<SqliteConnection> {
    let conn = SqliteConnection::open_in_memory().expect("open in-memory database");
    conn.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
        .expect("create table");
    let mut session = Session::new(conn, SessionOptions::default()).expect("open session");
    let rows: Vec<Vec<Parameter>> = (1..=1_000_i64)
        .map(|id| params![id, format!("user-{id}")])
        .collect();
    session
        .batch_prepared_statement("INSERT INTO users (id, name) VALUES (?, ?)", &rows)
        .expect("seed users");
    session
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_row_lookup");

    let mut session = seeded_session();
    group.bench_function("session_named", |b| {
        let mut id = 0_i64;
        b.iter(|| {
            id = id % 1_000 + 1;
            let query = named_query_of(SHORT, named_params! { "id" => id });
            black_box(
                session
                    .single(&query, |row| row.string("name"))
                    .expect("lookup"),
            )
        });
    });

    let raw = rusqlite::Connection::open_in_memory().expect("open raw connection");
    raw.execute_batch(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 1000)
         INSERT INTO users (id, name) SELECT n, 'user-' || n FROM seq;",
    )
    .expect("seed raw users");
    group.bench_function("rusqlite_raw", |b| {
        let mut id = 0_i64;
        b.iter(|| {
            id = id % 1_000 + 1;
            let mut stmt = raw
                .prepare_cached("SELECT id, name FROM users WHERE id = ?1")
                .expect("prepare");
            black_box(
                stmt.query_row([id], |row| row.get::<_, String>(1))
                    .expect("lookup"),
            )
        });
    });

    group.finish();
}

criterion_group!(benches, bench_rewrite, bench_lookup);
criterion_main!(benches);
