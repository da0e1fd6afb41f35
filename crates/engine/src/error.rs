use dojo_core::error::CoreError;
use dojo_db::UQ_ATTENDANCE_QR_STUDENT_DATE;

/// Engine-level error type returned by every operation.
///
/// Wraps [`CoreError`] for domain errors and keeps raw storage failures in
/// [`EngineError::Database`]. Any storage failure aborts only the operation
/// that hit it; its transaction is rolled back.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A domain-level error from `dojo_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migrations could not be applied.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Convenience type alias for engine return values.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Stable error code for the calling layer.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Core(core) => match core {
                CoreError::NotFound { .. } => "NOT_FOUND",
                CoreError::Validation(_) => "VALIDATION_ERROR",
                CoreError::Duplicate(_) => "DUPLICATE",
                CoreError::OutOfWindow(_) => "OUT_OF_WINDOW",
                CoreError::Internal(_) => "INTERNAL_ERROR",
            },
            EngineError::Database(_) | EngineError::Migration(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Whether the caller supplied bad input (4xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::Core(
                CoreError::NotFound { .. }
                    | CoreError::Validation(_)
                    | CoreError::Duplicate(_)
                    | CoreError::OutOfWindow(_)
            )
        )
    }
}

/// Classify a sqlx error raised by an attendance write.
///
/// - A unique violation on the QR same-day index becomes [`CoreError::Duplicate`].
/// - Everything else stays a database error and is logged.
pub(crate) fn classify_attendance_write(err: sqlx::Error) -> EngineError {
    if unique_violation(&err) == Some(UQ_ATTENDANCE_QR_STUDENT_DATE) {
        return EngineError::Core(CoreError::Duplicate(
            "Attendance already recorded by QR scan for this student today".into(),
        ));
    }
    log_database_error(&err);
    EngineError::Database(err)
}

/// Name of the violated unique constraint, if `err` is a PostgreSQL 23505.
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            Some(db_err.constraint().unwrap_or("unknown"))
        }
        _ => None,
    }
}

pub(crate) fn log_database_error(err: &sqlx::Error) {
    tracing::error!(error = %err, "Database error");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_taxonomy() {
        let cases = [
            (EngineError::from(CoreError::not_found("Student", 7)), "NOT_FOUND"),
            (EngineError::from(CoreError::Validation("x".into())), "VALIDATION_ERROR"),
            (EngineError::from(CoreError::Duplicate("x".into())), "DUPLICATE"),
            (EngineError::from(CoreError::OutOfWindow("x".into())), "OUT_OF_WINDOW"),
            (EngineError::from(sqlx::Error::RowNotFound), "PERSISTENCE_ERROR"),
        ];
        for (err, code) in cases {
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn client_errors() {
        assert!(EngineError::from(CoreError::Duplicate("x".into())).is_client_error());
        assert!(!EngineError::from(CoreError::Internal("x".into())).is_client_error());
        assert!(!EngineError::from(sqlx::Error::PoolTimedOut).is_client_error());
    }

    #[test]
    fn non_unique_errors_stay_database_errors() {
        let err = classify_attendance_write(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, EngineError::Database(sqlx::Error::PoolTimedOut)));
    }
}
