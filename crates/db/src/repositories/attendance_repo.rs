//! Repository for the `attendance` table.

use chrono::NaiveDate;
use sqlx::PgPool;
use dojo_core::types::{DbId, Timestamp};

use crate::models::attendance::{
    Attendance, AttendanceCorrection, AttendanceHistoryEntry, CreateAttendance,
};
use crate::models::attendance_audit::{AttendanceAudit, FieldChange};
use crate::repositories::AttendanceAuditRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, student_id, date, status, notes, check_in_method, recorded_by, \
                        class_id, check_in_time, created_at, updated_at";

/// Provides write and query operations for attendance events.
pub struct AttendanceRepo;

impl AttendanceRepo {
    /// Insert a single event, returning the created row.
    ///
    /// A second QR event for the same student and date violates
    /// `uq_attendance_qr_student_date`.
    pub async fn create(pool: &PgPool, input: &CreateAttendance) -> Result<Attendance, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let row = Self::create_inner(&mut tx, input).await?;
        tx.commit().await?;
        Ok(row)
    }

    /// Insert several events in one transaction. Either all rows are written or none.
    pub async fn create_many(
        pool: &PgPool,
        inputs: &[CreateAttendance],
    ) -> Result<Vec<Attendance>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut rows = Vec::with_capacity(inputs.len());
        for input in inputs {
            rows.push(Self::create_inner(&mut tx, input).await?);
        }
        tx.commit().await?;
        Ok(rows)
    }

    /// Find an event by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Attendance>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM attendance WHERE id = $1");
        sqlx::query_as::<_, Attendance>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether any event (any method) exists for the student on `date`.
    pub async fn exists_on(
        pool: &PgPool,
        student_id: DbId,
        date: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM attendance WHERE student_id = $1 AND date = $2)",
        )
        .bind(student_id)
        .bind(date)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Creation time of the student's most recent event.
    pub async fn last_created_at(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        let row: (Option<Timestamp>,) =
            sqlx::query_as("SELECT MAX(created_at) FROM attendance WHERE student_id = $1")
                .bind(student_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// Count a student's events created in `[from, until)`, regardless of status.
    pub async fn count_created_between(
        pool: &PgPool,
        student_id: DbId,
        from: Timestamp,
        until: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM attendance
             WHERE student_id = $1 AND created_at >= $2 AND created_at < $3",
        )
        .bind(student_id)
        .bind(from)
        .bind(until)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// `(date, status)` pairs for a student's events dated in `[from, to]`.
    pub async fn list_dates_between(
        pool: &PgPool,
        student_id: DbId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, String)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT date, status FROM attendance
             WHERE student_id = $1 AND date >= $2 AND date <= $3
             ORDER BY date",
        )
        .bind(student_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// A student's events, newest creation first, with the recorder's name.
    pub async fn list_history(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Vec<AttendanceHistoryEntry>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceHistoryEntry>(
            "SELECT a.id, a.date, a.status, a.notes, a.check_in_method, a.created_at,
                    a.recorded_by,
                    CASE WHEN p.id IS NULL THEN NULL
                         ELSE p.first_name || ' ' || p.last_name END AS recorded_by_name
             FROM attendance a
             LEFT JOIN people p ON p.id = a.recorded_by
             WHERE a.student_id = $1
             ORDER BY a.created_at DESC, a.id DESC",
        )
        .bind(student_id)
        .fetch_all(pool)
        .await
    }

    /// Apply an administrative correction and write one audit row per changed
    /// field, all in one transaction.
    ///
    /// Returns `None` if the event does not exist. Unchanged fields produce no
    /// audit rows; a correction that changes nothing writes nothing.
    pub async fn apply_correction(
        pool: &PgPool,
        id: DbId,
        input: &AttendanceCorrection,
        changed_by: DbId,
        changed_at: Timestamp,
    ) -> Result<Option<(Attendance, Vec<AttendanceAudit>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM attendance WHERE id = $1 FOR UPDATE");
        let Some(current) = sqlx::query_as::<_, Attendance>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };

        let changes = diff_correction(&current, input);
        if changes.is_empty() {
            tx.rollback().await?;
            return Ok(Some((current, Vec::new())));
        }

        let query = format!(
            "UPDATE attendance SET
                status = COALESCE($2, status),
                notes = COALESCE($3, notes),
                date = COALESCE($4, date)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Attendance>(&query)
            .bind(id)
            .bind(input.status.map(|s| s.as_str()))
            .bind(&input.notes)
            .bind(input.date)
            .fetch_one(&mut *tx)
            .await?;

        let mut audits = Vec::with_capacity(changes.len());
        for change in &changes {
            audits.push(
                AttendanceAuditRepo::create_inner(&mut tx, id, change, changed_by, changed_at)
                    .await?,
            );
        }

        tx.commit().await?;
        Ok(Some((updated, audits)))
    }

    /// Insert one event inside an existing transaction.
    async fn create_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &CreateAttendance,
    ) -> Result<Attendance, sqlx::Error> {
        let query = format!(
            "INSERT INTO attendance
                (student_id, date, status, notes, check_in_method, recorded_by,
                 class_id, check_in_time, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Attendance>(&query)
            .bind(input.student_id)
            .bind(input.date)
            .bind(input.status.as_str())
            .bind(&input.notes)
            .bind(input.check_in_method.as_str())
            .bind(input.recorded_by)
            .bind(input.class_id)
            .bind(input.check_in_time)
            .bind(input.created_at)
            .fetch_one(&mut **tx)
            .await
    }
}

/// Fields that `input` would actually change on `current`.
fn diff_correction(current: &Attendance, input: &AttendanceCorrection) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    if let Some(status) = input.status {
        if status.as_str() != current.status {
            changes.push(FieldChange {
                field_name: "status",
                old_value: Some(current.status.clone()),
                new_value: Some(status.as_str().to_string()),
            });
        }
    }
    if let Some(notes) = &input.notes {
        if current.notes.as_ref() != Some(notes) {
            changes.push(FieldChange {
                field_name: "notes",
                old_value: current.notes.clone(),
                new_value: Some(notes.clone()),
            });
        }
    }
    if let Some(date) = input.date {
        if date != current.date {
            changes.push(FieldChange {
                field_name: "date",
                old_value: Some(current.date.to_string()),
                new_value: Some(date.to_string()),
            });
        }
    }
    changes
}
