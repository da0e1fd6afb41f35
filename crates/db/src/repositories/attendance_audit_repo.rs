//! Repository for the `attendance_audit` table.

use sqlx::PgPool;
use dojo_core::types::{DbId, Timestamp};

use crate::models::attendance_audit::{AttendanceAudit, FieldChange, AUDIT_ACTION_UPDATE};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, attendance_id, action, field_name, old_value, new_value, changed_by, changed_at";

/// Provides read access to the correction audit trail. Rows are written by
/// [`AttendanceRepo::apply_correction`](crate::repositories::AttendanceRepo::apply_correction).
pub struct AttendanceAuditRepo;

impl AttendanceAuditRepo {
    /// Audit rows for one event, oldest first.
    pub async fn list_for_attendance(
        pool: &PgPool,
        attendance_id: DbId,
    ) -> Result<Vec<AttendanceAudit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM attendance_audit
             WHERE attendance_id = $1
             ORDER BY changed_at ASC, id ASC"
        );
        sqlx::query_as::<_, AttendanceAudit>(&query)
            .bind(attendance_id)
            .fetch_all(pool)
            .await
    }

    /// Insert one audit row inside an existing transaction.
    pub(crate) async fn create_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        attendance_id: DbId,
        change: &FieldChange,
        changed_by: DbId,
        changed_at: Timestamp,
    ) -> Result<AttendanceAudit, sqlx::Error> {
        let query = format!(
            "INSERT INTO attendance_audit
                (attendance_id, action, field_name, old_value, new_value, changed_by, changed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceAudit>(&query)
            .bind(attendance_id)
            .bind(AUDIT_ACTION_UPDATE)
            .bind(change.field_name)
            .bind(&change.old_value)
            .bind(&change.new_value)
            .bind(changed_by)
            .bind(changed_at)
            .fetch_one(&mut **tx)
            .await
    }
}
