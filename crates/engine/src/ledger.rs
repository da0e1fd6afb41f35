//! Attendance Ledger.
//!
//! Single source of truth for check-in events. Manual recording allows any
//! number of events per student and day; QR recording allows one, enforced by
//! the `uq_attendance_qr_student_date` index. The application-level existence
//! check in [`record_qr_check_in`] only gives a friendlier early answer.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use dojo_core::attendance::{
    parse_date, parse_status, validate_notes, AttendanceStatus, CheckInMethod,
};
use dojo_core::error::CoreError;
use dojo_core::qr;
use dojo_core::stats::{self, MonthlyCount, STATS_MONTHS};
use dojo_core::types::{DbId, Timestamp};
use dojo_db::models::attendance::{
    Attendance, AttendanceCorrection, AttendanceHistoryEntry, CreateAttendance,
};
use dojo_db::models::attendance_audit::AttendanceAudit;
use dojo_db::models::person::Person;
use dojo_db::repositories::{AttendanceAuditRepo, AttendanceRepo, PersonRepo};
use serde::{Deserialize, Serialize};

use crate::directory;
use crate::error::{classify_attendance_write, EngineError, EngineResult};
use crate::state::EngineState;

// ---------------------------------------------------------------------------
// Inputs and results
// ---------------------------------------------------------------------------

/// A teacher-entered attendance record. Date and status arrive as raw text
/// and are validated here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManualAttendanceInput {
    pub student_id: DbId,
    /// `YYYY-MM-DD`.
    pub date: Option<String>,
    /// `present`, `absent` or `late`.
    pub status: Option<String>,
    pub notes: Option<String>,
    pub class_id: Option<DbId>,
}

/// One line of a bulk submission. Lines without a status are skipped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkAttendanceEntry {
    pub student_id: DbId,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// Result of a successful QR check-in.
#[derive(Debug, Clone, Serialize)]
pub struct QrCheckIn {
    pub event: Attendance,
    /// `first last` of the student who checked in.
    pub student_name: String,
}

/// A student's last attendance, with the timestamp shown in the canonical zone.
#[derive(Debug, Clone, Serialize)]
pub struct LastAttended {
    pub student: Person,
    pub last_attended_at: Option<Timestamp>,
    pub last_attended_local: Option<NaiveDateTime>,
}

/// Result of an administrative correction.
#[derive(Debug, Clone, Serialize)]
pub struct Correction {
    pub event: Attendance,
    /// One row per changed field; empty when nothing changed.
    pub changes: Vec<AttendanceAudit>,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Record a manual event. Repeats on the same date create new events.
pub async fn record_manual_attendance(
    state: &EngineState,
    input: &ManualAttendanceInput,
    recorded_by: DbId,
) -> EngineResult<Attendance> {
    let date = parse_date(input.date.as_deref())?;
    let status = parse_status(input.status.as_deref())?;
    validate_notes(input.notes.as_deref())?;
    directory::find_student(state, input.student_id).await?;
    ensure_recorder(state, recorded_by).await?;

    let event = AttendanceRepo::create(
        &state.pool,
        &CreateAttendance {
            student_id: input.student_id,
            date,
            status,
            notes: input.notes.clone(),
            check_in_method: CheckInMethod::Manual,
            recorded_by,
            class_id: input.class_id,
            check_in_time: None,
            created_at: state.now(),
        },
    )
    .await
    .map_err(classify_attendance_write)?;

    tracing::info!(
        event_id = event.id,
        student_id = event.student_id,
        date = %event.date,
        status = %status,
        "Manual attendance recorded"
    );
    Ok(event)
}

/// Record one date's attendance for many students as a single unit.
///
/// Every entry is validated before anything is written; one unknown student
/// or malformed status rejects the whole batch. Entries without a status are
/// skipped.
pub async fn record_bulk_attendance(
    state: &EngineState,
    date: &str,
    entries: &[BulkAttendanceEntry],
    recorded_by: DbId,
) -> EngineResult<Vec<Attendance>> {
    let date = parse_date(Some(date))?;
    ensure_recorder(state, recorded_by).await?;

    let created_at = state.now();
    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(raw_status) = entry.status.as_deref().filter(|s| !s.trim().is_empty()) else {
            continue;
        };
        let status = parse_status(Some(raw_status))?;
        validate_notes(entry.notes.as_deref())?;
        directory::find_student(state, entry.student_id).await?;
        rows.push(CreateAttendance {
            student_id: entry.student_id,
            date,
            status,
            notes: entry.notes.clone(),
            check_in_method: CheckInMethod::Manual,
            recorded_by,
            class_id: None,
            check_in_time: None,
            created_at,
        });
    }

    let events = AttendanceRepo::create_many(&state.pool, &rows)
        .await
        .map_err(classify_attendance_write)?;

    tracing::info!(
        date = %date,
        recorded = events.len(),
        skipped = entries.len() - events.len(),
        "Bulk attendance recorded"
    );
    Ok(events)
}

/// Record a student's own QR check-in at instant `now`.
///
/// Order of checks: payload format, token lookup, eligibility window, same-day
/// existence. All time rules use the single `now` passed in.
pub async fn record_qr_check_in(
    state: &EngineState,
    payload: &str,
    recorded_by: DbId,
    now: Timestamp,
) -> EngineResult<QrCheckIn> {
    let token = qr::decode_payload(payload)?;

    let student = directory::find_by_token(state, token)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "Student",
            key: token.to_string(),
        })?;
    ensure_recorder(state, recorded_by).await?;

    let local = state.zone().to_local(now);
    if let Err(e) = state.checkin_window().check(local) {
        tracing::warn!(student_id = student.id, local_time = %local.time(), "QR check-in outside window");
        return Err(e.into());
    }

    let today = local.date();
    if AttendanceRepo::exists_on(&state.pool, student.id, today).await? {
        tracing::warn!(student_id = student.id, date = %today, "Duplicate QR check-in");
        return Err(CoreError::Duplicate(format!(
            "Attendance already marked today for {}",
            student.display_name()
        ))
        .into());
    }

    let event = AttendanceRepo::create(
        &state.pool,
        &CreateAttendance {
            student_id: student.id,
            date: today,
            status: AttendanceStatus::Present,
            notes: None,
            check_in_method: CheckInMethod::QrScan,
            recorded_by,
            class_id: None,
            check_in_time: Some(local.time()),
            created_at: now,
        },
    )
    .await
    .map_err(|e| {
        let err = classify_attendance_write(e);
        if matches!(err, EngineError::Core(CoreError::Duplicate(_))) {
            tracing::warn!(student_id = student.id, date = %today, "Racing QR check-in rejected");
        }
        err
    })?;

    tracing::info!(event_id = event.id, student_id = student.id, "QR check-in recorded");
    Ok(QrCheckIn {
        event,
        student_name: student.display_name(),
    })
}

/// [`record_qr_check_in`] at the injected clock's current instant.
pub async fn record_qr_check_in_now(
    state: &EngineState,
    payload: &str,
    recorded_by: DbId,
) -> EngineResult<QrCheckIn> {
    let now = state.now();
    record_qr_check_in(state, payload, recorded_by, now).await
}

/// Correct status, notes, or date of an event, auditing each changed field.
pub async fn correct_attendance(
    state: &EngineState,
    event_id: DbId,
    input: &AttendanceCorrection,
    changed_by: DbId,
) -> EngineResult<Correction> {
    validate_notes(input.notes.as_deref())?;
    ensure_recorder(state, changed_by).await?;

    let (event, changes) =
        AttendanceRepo::apply_correction(&state.pool, event_id, input, changed_by, state.now())
            .await
            .map_err(classify_attendance_write)?
            .ok_or_else(|| CoreError::not_found("Attendance", event_id))?;

    if !changes.is_empty() {
        tracing::info!(event_id, changed_by, fields = changes.len(), "Attendance corrected");
    }
    Ok(Correction { event, changes })
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Whether any event exists for the student on `date`.
pub async fn has_attendance_on(
    state: &EngineState,
    student_id: DbId,
    date: NaiveDate,
) -> EngineResult<bool> {
    Ok(AttendanceRepo::exists_on(&state.pool, student_id, date).await?)
}

/// Creation time of the student's most recent event.
pub async fn last_attended_at(
    state: &EngineState,
    student_id: DbId,
) -> EngineResult<Option<Timestamp>> {
    Ok(AttendanceRepo::last_created_at(&state.pool, student_id).await?)
}

/// [`last_attended_at`] for every student, most recent first, never-attended last.
pub async fn last_attended_summary(state: &EngineState) -> EngineResult<Vec<LastAttended>> {
    let rows = directory::students_by_last_attended(state).await?;
    let zone = state.zone();
    Ok(rows
        .into_iter()
        .map(|row| LastAttended {
            last_attended_local: row.last_attended_at.map(|ts| zone.to_local(ts)),
            last_attended_at: row.last_attended_at,
            student: row.student,
        })
        .collect())
}

/// A student's events, newest first, with the recorder's name.
pub async fn attendance_history(
    state: &EngineState,
    student_id: DbId,
) -> EngineResult<Vec<AttendanceHistoryEntry>> {
    directory::find_student(state, student_id).await?;
    Ok(AttendanceRepo::list_history(&state.pool, student_id).await?)
}

/// Audit rows of an event, oldest first.
pub async fn audit_trail(state: &EngineState, event_id: DbId) -> EngineResult<Vec<AttendanceAudit>> {
    AttendanceRepo::find_by_id(&state.pool, event_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Attendance", event_id))?;
    Ok(AttendanceAuditRepo::list_for_attendance(&state.pool, event_id).await?)
}

/// Present-counts for the last twelve calendar months, oldest first.
pub async fn monthly_present_counts(
    state: &EngineState,
    student_id: DbId,
) -> EngineResult<Vec<MonthlyCount>> {
    directory::find_student(state, student_id).await?;

    let today = state.today();
    let from = today
        .with_day(1)
        .and_then(|first| first.checked_sub_months(Months::new(STATS_MONTHS - 1)))
        .unwrap_or(NaiveDate::MIN);
    let rows = AttendanceRepo::list_dates_between(&state.pool, student_id, from, today).await?;

    let events = rows
        .into_iter()
        .filter_map(|(date, status)| AttendanceStatus::from_str(&status).map(|s| (date, s)));
    Ok(stats::monthly_present_counts(today, events))
}

async fn ensure_recorder(state: &EngineState, recorded_by: DbId) -> EngineResult<Person> {
    PersonRepo::find_by_id(&state.pool, recorded_by)
        .await?
        .ok_or_else(|| CoreError::not_found("Person", recorded_by).into())
}
