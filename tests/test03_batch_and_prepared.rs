#![cfg(feature = "sqlite")]

use sql_session::driver::PreparedStatement;
use sql_session::prelude::*;
use sql_session::{named_params, params};

fn products() -> Result<Session<SqliteConnection>, SqlSessionError> {
    let session = Session::new(SqliteConnection::open_in_memory()?, SessionOptions::default())?;
    session
        .connection()
        .execute_batch("CREATE TABLE products (sku TEXT PRIMARY KEY, qty INTEGER, note TEXT)")?;
    Ok(session)
}

#[test]
fn positional_batch_reports_each_row() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = products()?;
    let counts = session.batch_prepared_statement(
        "INSERT INTO products (sku, qty) VALUES (?, ?)",
        &[params!["a-1", 3_i64], params!["b-2", 0_i64], params!["c-3", 7_i64]],
    )?;
    assert_eq!(counts, vec![1, 1, 1]);

    let stored = session.list(
        &query_of("SELECT sku, qty FROM products ORDER BY rowid", params![]),
        |row| Ok::<_, SqlSessionError>((row.string("sku")?, row.i64("qty")?)),
    )?;
    assert_eq!(
        stored,
        vec![
            ("a-1".to_string(), 3),
            ("b-2".to_string(), 0),
            ("c-3".to_string(), 7),
        ]
    );

    let updated = session.batch_prepared_statement(
        "UPDATE products SET qty = qty + 1 WHERE qty >= ?",
        &[params![5_i64], params![0_i64]],
    )?;
    assert_eq!(updated, vec![1, 3]);
    Ok(())
}

#[test]
fn batch_rows_must_fill_every_marker() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = products()?;
    let err = session
        .batch_prepared_statement(
            "INSERT INTO products (sku, note) VALUES (?, ?)",
            &[params!["full", "first note"], params!["short"]],
        )
        .unwrap_err();
    assert!(matches!(err, SqlSessionError::MalformedQuery(_)));

    // the first row ran; the short row never borrowed its note
    let stored = session.list(
        &query_of("SELECT sku, note FROM products ORDER BY rowid", params![]),
        |row| Ok::<_, SqlSessionError>((row.string("sku")?, row.string_opt("note")?)),
    )?;
    assert_eq!(stored, vec![("full".to_string(), Some("first note".to_string()))]);

    let err = session
        .batch_prepared_statement(
            "INSERT INTO products (sku) VALUES (?)",
            &[params!["one", "too many"]],
        )
        .unwrap_err();
    assert!(matches!(err, SqlSessionError::MalformedQuery(_)));
    Ok(())
}

#[test]
fn named_batch_rows_do_not_inherit_earlier_values() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = products()?;
    session.batch_prepared_named_statement(
        "INSERT INTO products (sku, note) VALUES (:sku, :note)",
        &[
            named_params! { "sku" => "n1", "note" => "kept" },
            named_params! { "sku" => "n2" },
        ],
    )?;
    let notes = session.list(
        &query_of("SELECT note FROM products ORDER BY rowid", params![]),
        |row| row.string_opt("note"),
    )?;
    assert_eq!(notes, vec![Some("kept".to_string()), None]);
    Ok(())
}

#[test]
fn positional_queries_need_one_value_per_marker() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = products()?;
    let err = session
        .update(&query_of(
            "INSERT INTO products (sku, note) VALUES (?, ?)",
            params!["only-sku"],
        ))
        .unwrap_err();
    assert!(matches!(err, SqlSessionError::MalformedQuery(_)));

    let err = session
        .list(
            &query_of("SELECT sku FROM products WHERE sku = ?", params!["a", "b"]),
            |row| row.string(0_usize),
        )
        .unwrap_err();
    assert!(matches!(err, SqlSessionError::MalformedQuery(_)));

    let count = session.single(&query_of("SELECT COUNT(*) FROM products", params![]), |row| {
        row.i64(0_usize)
    })?;
    assert_eq!(count, Some(0));
    Ok(())
}

#[test]
fn named_batch_binds_missing_names_as_null() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = products()?;
    let counts = session.batch_prepared_named_statement(
        "INSERT INTO products (sku, qty, note) VALUES (:sku, :qty, :note)",
        &[
            named_params! { "sku" => "x", "qty" => 1_i64, "note" => "first" },
            named_params! { "sku" => "y", "qty" => 2_i64 },
        ],
    )?;
    assert_eq!(counts, vec![1, 1]);

    let notes = session.list(
        &query_of("SELECT note FROM products ORDER BY sku", params![]),
        |row| row.string_opt("note"),
    )?;
    assert_eq!(notes, vec![Some("first".to_string()), None]);

    let err = session
        .batch_prepared_named_statement(
            "INSERT INTO products (sku, qty) VALUES (:sku, ?)",
            &[named_params! { "sku" => "z" }],
        )
        .unwrap_err();
    assert!(matches!(err, SqlSessionError::MalformedQuery(_)));
    Ok(())
}

#[test]
fn repeated_names_bind_every_occurrence() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = products()?;
    session.update(&query_of(
        "INSERT INTO products (sku, qty) VALUES ('p', 5), ('q', 50), ('r', 500)",
        params![],
    ))?;

    let query = named_query_of(
        "SELECT sku FROM products WHERE qty >= :low AND qty <= :high AND (qty = :low OR qty > :low)
         ORDER BY sku",
        named_params! { "low" => 5_i64, "high" => 100_i64 },
    );
    assert_eq!(query.normalized_statement().matches('?').count(), 4);
    let skus = session.list(&query, |row| row.string(0_usize))?;
    assert_eq!(skus, vec!["p", "q"]);
    Ok(())
}

#[test]
fn prepared_statement_escape_hatch() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = products()?;
    let insert = named_query_of(
        "INSERT INTO products (sku, qty) VALUES (:sku, :qty)",
        named_params! { "sku" => "hatch", "qty" => 9_i64 },
    );

    let mut stmt = session.create_prepared_statement(&insert)?;
    assert_eq!(stmt.parameter_count(), 2);
    assert_eq!(stmt.execute_update()?, 1);
    drop(stmt);

    let qty = session.single(
        &query_of("SELECT qty FROM products WHERE sku = 'hatch'", params![]),
        |row| row.i32("qty"),
    )?;
    assert_eq!(qty, Some(9));

    let mut for_each_total = 0;
    session.for_each(&query_of("SELECT qty FROM products", params![]), |row| {
        for_each_total += row.i64(0_usize)?;
        Ok(())
    })?;
    assert_eq!(for_each_total, 9);
    Ok(())
}

#[test]
fn quoted_and_cast_colons_are_left_alone() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = products()?;
    let query = named_query_of(
        "SELECT ':not_a_param' AS literal, CAST(:n AS INTEGER) AS n -- :comment",
        named_params! { "n" => "12" },
    );
    let (literal, n) = session
        .single(&query, |row| {
            Ok::<_, SqlSessionError>((row.string("literal")?, row.i64("n")?))
        })?
        .ok_or("no row")?;
    assert_eq!(literal, ":not_a_param");
    assert_eq!(n, 12);
    Ok(())
}
