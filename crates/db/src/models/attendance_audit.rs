//! Attendance audit model.

use dojo_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Audit action written for administrative corrections.
pub const AUDIT_ACTION_UPDATE: &str = "update";

/// A row from the `attendance_audit` table: one changed field.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceAudit {
    pub id: DbId,
    pub attendance_id: DbId,
    pub action: String,
    pub field_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changed_by: DbId,
    pub changed_at: Timestamp,
}

/// A field change waiting to be written as an audit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field_name: &'static str,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}
