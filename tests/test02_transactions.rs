#![cfg(feature = "sqlite")]

use std::panic::{self, AssertUnwindSafe};

use sql_session::driver::DriverConnection;
use sql_session::params;
use sql_session::prelude::*;

fn accounts() -> Result<Session<SqliteConnection>, SqlSessionError> {
    let session = Session::new(SqliteConnection::open_in_memory()?, SessionOptions::default())?;
    session.connection().execute_batch(
        "CREATE TABLE accounts (id INTEGER PRIMARY KEY, balance INTEGER NOT NULL CHECK (balance >= 0));
         INSERT INTO accounts (id, balance) VALUES (1, 100), (2, 0);",
    )?;
    Ok(session)
}

fn balance(session: &mut Session<SqliteConnection>, id: i64) -> Result<i64, SqlSessionError> {
    session
        .single(
            &query_of("SELECT balance FROM accounts WHERE id = ?", params![id]),
            |row| row.i64("balance"),
        )?
        .ok_or_else(|| SqlSessionError::ConfigError(format!("no account {id}")))
}

fn transfer<C: DriverConnection>(
    tx: &mut TransactionalSession<'_, C>,
    amount: i64,
) -> Result<(), SqlSessionError> {
    tx.update(&query_of(
        "UPDATE accounts SET balance = balance - ? WHERE id = 1",
        params![amount],
    ))?;
    tx.update(&query_of(
        "UPDATE accounts SET balance = balance + ? WHERE id = 2",
        params![amount],
    ))?;
    Ok(())
}

#[test]
fn successful_body_commits() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = accounts()?;
    let moved = session.transaction(|tx| {
        transfer(tx, 40)?;
        Ok::<_, SqlSessionError>(40)
    })?;
    assert_eq!(moved, 40);
    assert_eq!(balance(&mut session, 1)?, 60);
    assert_eq!(balance(&mut session, 2)?, 40);
    assert!(session.connection().auto_commit());
    Ok(())
}

#[test]
fn failing_statement_rolls_back_earlier_work() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = accounts()?;
    let result = session.transaction(|tx| {
        tx.update(&query_of(
            "UPDATE accounts SET balance = balance + 500 WHERE id = 2",
            params![],
        ))?;
        // violates the CHECK constraint
        transfer(tx, 1_000)
    });
    assert!(matches!(result, Err(SqlSessionError::SqliteError(_))));
    assert_eq!(balance(&mut session, 1)?, 100);
    assert_eq!(balance(&mut session, 2)?, 0);
    assert!(session.connection().auto_commit());
    Ok(())
}

#[derive(Debug)]
enum TransferError {
    Insufficient { wanted: i64, available: i64 },
    #[allow(dead_code)]
    Db(SqlSessionError),
}

impl From<SqlSessionError> for TransferError {
    fn from(err: SqlSessionError) -> Self {
        TransferError::Db(err)
    }
}

#[test]
fn caller_error_type_passes_through_unchanged() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = accounts()?;
    let result: Result<(), TransferError> = session.transaction(|tx| {
        transfer(tx, 10)?;
        let available = tx
            .single(
                &query_of("SELECT balance FROM accounts WHERE id = 1", params![]),
                |row| row.i64(0_usize),
            )?
            .unwrap_or_default();
        Err(TransferError::Insufficient {
            wanted: 500,
            available,
        })
    });

    match result {
        Err(TransferError::Insufficient { wanted, available }) => {
            assert_eq!(wanted, 500);
            assert_eq!(available, 90);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    // the transfer inside the failed body is gone
    assert_eq!(balance(&mut session, 1)?, 100);
    Ok(())
}

#[test]
fn nested_transactions_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = accounts()?;
    let outer: Result<(), SqlSessionError> = session.transaction(|tx| {
        transfer(tx, 5)?;
        let inner: Result<(), SqlSessionError> = tx.transaction(|inner| transfer(inner, 5));
        assert!(matches!(inner, Err(SqlSessionError::NestedTransaction)));
        // the outer transaction is still open and usable
        assert!(!tx.connection().auto_commit());
        Ok(())
    });
    outer?;
    assert_eq!(balance(&mut session, 1)?, 95);
    Ok(())
}

#[test]
fn session_is_reusable_after_rollback() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = accounts()?;
    let _: Result<(), SqlSessionError> =
        session.transaction(|_| Err(SqlSessionError::ConfigError("abort".into())));
    session.transaction(|tx| transfer(tx, 1))?;
    assert_eq!(balance(&mut session, 2)?, 1);
    Ok(())
}

#[test]
fn panicking_body_rolls_back() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = accounts()?;

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        session.transaction(|tx| -> Result<(), SqlSessionError> {
            transfer(tx, 40)?;
            panic!("body gave up halfway");
        })
    }));
    assert!(outcome.is_err());

    assert!(session.connection().auto_commit());
    assert_eq!(balance(&mut session, 1)?, 100);
    assert_eq!(balance(&mut session, 2)?, 0);

    // the connection accepts a fresh transaction
    session.transaction(|tx| transfer(tx, 25))?;
    assert_eq!(balance(&mut session, 2)?, 25);
    Ok(())
}
