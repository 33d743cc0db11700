//! Shared helpers for Diesel repository implementations.
//!
//! Each repository owns its port error type; these helpers classify pool and
//! Diesel failures once so the per-repository mappers stay small.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Extract a readable message from a pool error.
pub fn map_pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

/// Coarse classification of a Diesel failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DieselFailure {
    /// The connection dropped mid-operation.
    Connection(String),
    /// A foreign key constraint rejected the write.
    ForeignKey { constraint: Option<String> },
    /// A unique constraint rejected the write.
    UniqueViolation { constraint: Option<String> },
    /// Any other failure; the message is safe to log.
    Query(String),
}

/// Classify `error` and emit debug context.
pub fn classify_diesel_error(error: DieselError) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => DieselFailure::Query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => DieselFailure::Query("database query error".to_owned()),
        DieselError::DatabaseError(kind, info) => {
            let constraint = info.constraint_name().map(str::to_owned);
            match kind {
                DatabaseErrorKind::ForeignKeyViolation => DieselFailure::ForeignKey { constraint },
                DatabaseErrorKind::UniqueViolation => DieselFailure::UniqueViolation { constraint },
                DatabaseErrorKind::ClosedConnection => {
                    DieselFailure::Connection("database connection error".to_owned())
                }
                _ => DieselFailure::Query(format!("database error: {}", info.message())),
            }
        }
        other => DieselFailure::Query(other.to_string()),
    }
}

/// Collect row conversion results, mapping the first error through `map_err`.
pub fn collect_rows<T, E>(
    results: impl Iterator<Item = Result<T, String>>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    results.collect::<Result<Vec<_>, _>>().map_err(map_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::DatabaseErrorInformation;
    use rstest::rstest;

    #[derive(Debug)]
    struct StubInfo {
        message: &'static str,
        constraint: Option<&'static str>,
    }

    impl DatabaseErrorInformation for StubInfo {
        fn message(&self) -> &str {
            self.message
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            self.constraint
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(kind: DatabaseErrorKind, constraint: Option<&'static str>) -> DieselError {
        DieselError::DatabaseError(
            kind,
            Box::new(StubInfo {
                message: "stub failure",
                constraint,
            }),
        )
    }

    #[rstest]
    fn foreign_key_keeps_constraint_name() {
        let failure = classify_diesel_error(database_error(
            DatabaseErrorKind::ForeignKeyViolation,
            Some("user_segments_user_id_fkey"),
        ));
        assert_eq!(
            failure,
            DieselFailure::ForeignKey {
                constraint: Some("user_segments_user_id_fkey".to_owned())
            }
        );
    }

    #[rstest]
    fn unique_violation_is_classified() {
        let failure = classify_diesel_error(database_error(
            DatabaseErrorKind::UniqueViolation,
            Some("segments_slug_key"),
        ));
        assert!(matches!(failure, DieselFailure::UniqueViolation { .. }));
    }

    #[rstest]
    fn closed_connection_is_connection_failure() {
        let failure =
            classify_diesel_error(database_error(DatabaseErrorKind::ClosedConnection, None));
        assert!(matches!(failure, DieselFailure::Connection(_)));
    }

    #[rstest]
    fn not_found_is_query_failure() {
        assert_eq!(
            classify_diesel_error(DieselError::NotFound),
            DieselFailure::Query("record not found".to_owned())
        );
    }

    #[rstest]
    fn pool_messages_are_unwrapped() {
        assert_eq!(map_pool_error_message(PoolError::checkout("timed out")), "timed out");
    }
}
