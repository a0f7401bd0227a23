//! Durable store access.
//!
//! Repositories borrow any sea-orm connection (`DatabaseConnection` or `DatabaseTransaction`)
//! so the same queries serve both plain reads and the killmail persist transaction.

pub mod eve;
pub mod killmail;
pub mod market;

use sea_orm::{DbErr, SqlErr};

/// Whether the error is a unique or primary key violation, i.e. another resolver inserted the
/// same row first.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
