//! Attendance event model and DTOs.

use chrono::{NaiveDate, NaiveTime};
use dojo_core::attendance::{AttendanceStatus, CheckInMethod};
use dojo_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `attendance` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attendance {
    pub id: DbId,
    pub student_id: DbId,
    /// Calendar date the event counts for, in the canonical timezone.
    pub date: NaiveDate,
    pub status: String,
    pub notes: Option<String>,
    pub check_in_method: String,
    /// Teacher or staff member who recorded the event.
    pub recorded_by: DbId,
    pub class_id: Option<DbId>,
    /// Local wall time of a QR scan.
    pub check_in_time: Option<NaiveTime>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Attendance {
    pub fn status(&self) -> Option<AttendanceStatus> {
        AttendanceStatus::from_str(&self.status)
    }

    pub fn method(&self) -> Option<CheckInMethod> {
        CheckInMethod::from_str(&self.check_in_method)
    }
}

/// DTO for inserting an attendance event.
///
/// `created_at` is supplied by the caller's clock so window rules and
/// ordering are deterministic.
#[derive(Debug, Clone)]
pub struct CreateAttendance {
    pub student_id: DbId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    pub check_in_method: CheckInMethod,
    pub recorded_by: DbId,
    pub class_id: Option<DbId>,
    pub check_in_time: Option<NaiveTime>,
    pub created_at: Timestamp,
}

/// DTO for an administrative correction. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceCorrection {
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
    pub date: Option<NaiveDate>,
}

impl AttendanceCorrection {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.notes.is_none() && self.date.is_none()
    }
}

/// One line of a student's attendance history, joined with the recorder's name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceHistoryEntry {
    pub id: DbId,
    pub date: NaiveDate,
    pub status: String,
    pub notes: Option<String>,
    pub check_in_method: String,
    pub created_at: Timestamp,
    pub recorded_by: DbId,
    /// `first last` of the recorder, or `None` if the recorder row is gone.
    pub recorded_by_name: Option<String>,
}
