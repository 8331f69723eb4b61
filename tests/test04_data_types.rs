#![cfg(feature = "sqlite")]

use std::io::Read;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::json;
use sql_session::prelude::*;
use sql_session::{named_params, params};
use uuid::Uuid;

fn session() -> Result<Session<SqliteConnection>, SqlSessionError> {
    let session = Session::new(SqliteConnection::open_in_memory()?, SessionOptions::default())?;
    session.connection().execute_batch(
        "CREATE TABLE samples (
            id INTEGER PRIMARY KEY,
            small INTEGER, medium INTEGER, big INTEGER,
            ratio REAL, price TEXT, active INTEGER,
            payload BLOB, born DATE, alarm TIME, seen_at TIMESTAMP, logged_at TIMESTAMPTZ,
            ref_id TEXT, doc TEXT, tags TEXT, body TEXT
        );",
    )?;
    Ok(session)
}

#[test]
fn every_semantic_type_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session()?;

    let born = NaiveDate::from_ymd_opt(1990, 7, 14).ok_or("date")?;
    let alarm = NaiveTime::from_hms_opt(6, 45, 30).ok_or("time")?;
    let seen_at: NaiveDateTime = born.and_hms_milli_opt(23, 59, 58, 125).ok_or("timestamp")?;
    let logged_at: DateTime<FixedOffset> = DateTime::parse_from_rfc3339("2024-03-10T18:15:00+05:30")?;
    let ref_id = Uuid::new_v4();
    let price = Decimal::parse("1234.50")?;

    session.update(&named_query_of(
        "INSERT INTO samples (id, small, medium, big, ratio, price, active, payload, born, alarm,
                              seen_at, logged_at, ref_id, doc, tags, body)
         VALUES (1, :small, :medium, :big, :ratio, :price, :active, :payload, :born, :alarm,
                 :seen_at, :logged_at, :ref_id, :doc, :tags, :body)",
        named_params! {
            "small" => -7_i16,
            "medium" => 70_000_i32,
            "big" => 9_000_000_000_i64,
            "ratio" => 0.25_f64,
            "price" => price.clone(),
            "active" => true,
            "payload" => vec![0xde_u8, 0xad, 0xbe, 0xef],
            "born" => born,
            "alarm" => alarm,
            "seen_at" => seen_at,
            "logged_at" => logged_at,
            "ref_id" => ref_id,
            "doc" => json!({ "kind": "sample", "n": 3 }),
            "tags" => Parameter::array([1_i64, 2, 3]),
            "body" => "héllo wörld",
        },
    ))?;

    let select = query_of("SELECT * FROM samples WHERE id = ?", params![1_i64]);
    let checked = session.single(&select, |row| {
        assert_eq!(row.i16("small")?, -7);
        assert_eq!(row.i32("medium")?, 70_000);
        assert_eq!(row.i64("big")?, 9_000_000_000);
        assert!((row.f64("ratio")? - 0.25).abs() < f64::EPSILON);
        assert!((row.f32("ratio")? - 0.25).abs() < f32::EPSILON);
        assert_eq!(row.decimal("price")?, price);
        assert!(row.boolean("active")?);
        assert_eq!(row.bytes("payload")?, vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(row.date("born")?, born);
        assert_eq!(row.time("alarm")?, alarm);
        assert_eq!(row.naive_date_time("seen_at")?, seen_at);

        // zoned values come back in the local zone but denote the same instant
        let expected_instant = logged_at.with_timezone(&Utc);
        assert_eq!(row.instant("logged_at")?, expected_instant);
        assert_eq!(row.zoned_date_time("logged_at")?.with_timezone(&Utc), expected_instant);
        assert_eq!(row.offset_date_time("logged_at")?.with_timezone(&Utc), expected_instant);

        assert_eq!(row.uuid("ref_id")?, ref_id);
        assert_eq!(row.json("doc")?["kind"], json!("sample"));
        assert_eq!(
            row.array::<i64, _>("tags")?,
            vec![Some(1), Some(2), Some(3)]
        );

        let clob = row.clob("body")?;
        assert_eq!(clob.length(), 11);
        assert_eq!(clob.sub_string(1, 5), "héllo");

        let blob = row.blob("payload")?;
        assert_eq!(blob.length(), 4);
        let mut streamed = Vec::new();
        row.binary_stream("payload")?
            .read_to_end(&mut streamed)
            .map_err(SqlSessionError::driver)?;
        assert_eq!(streamed, blob.as_bytes());
        Ok::<_, SqlSessionError>(true)
    })?;
    assert_eq!(checked, Some(true));
    Ok(())
}

#[test]
fn optional_accessors_see_nulls_for_every_type() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session()?;
    session.update(&query_of("INSERT INTO samples (id) VALUES (2)", params![]))?;

    let select = query_of("SELECT * FROM samples WHERE id = 2", params![]);
    let all_absent = session
        .single(&select, |row| {
            Ok::<_, SqlSessionError>(
                row.i16_opt("small")?.is_none()
                    && row.i32_opt("medium")?.is_none()
                    && row.i64_opt("big")?.is_none()
                    && row.f64_opt("ratio")?.is_none()
                    && row.decimal_opt("price")?.is_none()
                    && row.boolean_opt("active")?.is_none()
                    && row.bytes_opt("payload")?.is_none()
                    && row.date_opt("born")?.is_none()
                    && row.time_opt("alarm")?.is_none()
                    && row.naive_date_time_opt("seen_at")?.is_none()
                    && row.instant_opt("logged_at")?.is_none()
                    && row.uuid_opt("ref_id")?.is_none()
                    && row.json_opt("doc")?.is_none()
                    && row.array_opt::<i64, _>("tags")?.is_none()
                    && row.clob_opt("body")?.is_none()
                    && row.blob_opt("payload")?.is_none(),
            )
        })?
        .ok_or("no row")?;
    assert!(all_absent);

    let err = session.single(&select, |row| row.date("born")).unwrap_err();
    assert!(matches!(err, SqlSessionError::MissingValue { .. }));
    Ok(())
}

#[test]
fn typed_nulls_and_lookup_errors() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session()?;
    session.update(&query_of(
        "INSERT INTO samples (id, born, body) VALUES (3, ?, ?)",
        params![None::<NaiveDate>, "not a number"],
    ))?;

    let select = query_of("SELECT born, body AS Body FROM samples WHERE id = 3", params![]);
    let born = session.single(&select, |row| row.date_opt("born"))?;
    assert_eq!(born, Some(None));

    // case-insensitive fallback on column labels
    let body = session.single(&select, |row| row.string("body"))?;
    assert_eq!(body.as_deref(), Some("not a number"));

    let err = session.single(&select, |row| row.i64("Body")).unwrap_err();
    assert!(matches!(
        err,
        SqlSessionError::TypeMismatch { expected: "i64", .. }
    ));

    let err = session.single(&select, |row| row.string("missing")).unwrap_err();
    assert!(matches!(err, SqlSessionError::ColumnNotFound(_)));
    Ok(())
}
