//! Attendance vocabulary and the QR check-in eligibility window.
//!
//! Status and method strings must match the CHECK constraints in
//! `20240101000002_create_attendance.sql`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of free-form attendance notes.
pub const MAX_NOTES_LENGTH: usize = 2_000;

/// Date format accepted from callers (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Outcome recorded for a student on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    /// Return the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
        }
    }

    /// Parse a status string. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "present" => Some(Self::Present),
            "absent" => Some(Self::Absent),
            "late" => Some(Self::Late),
            _ => None,
        }
    }

    /// All valid status values.
    pub const ALL: &'static [&'static str] = &["present", "absent", "late"];
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Recording method
// ---------------------------------------------------------------------------

/// How an attendance event was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInMethod {
    /// Entered by a teacher. Several events per day are allowed.
    Manual,
    /// Unsupervised QR scan. At most one per student per day.
    QrScan,
}

impl CheckInMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::QrScan => "qr_scan",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "qr_scan" => Some(Self::QrScan),
            _ => None,
        }
    }
}

impl std::fmt::Display for CheckInMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Parse and validate a caller-supplied status. Missing or unknown values fail.
pub fn parse_status(raw: Option<&str>) -> Result<AttendanceStatus, CoreError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::Validation("Attendance status is required".into()))?;
    AttendanceStatus::from_str(raw).ok_or_else(|| {
        CoreError::Validation(format!(
            "Invalid attendance status '{raw}'. Must be one of: {}",
            AttendanceStatus::ALL.join(", ")
        ))
    })
}

/// Parse and validate a caller-supplied `YYYY-MM-DD` date.
pub fn parse_date(raw: Option<&str>) -> Result<NaiveDate, CoreError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::Validation("Date is required".into()))?;
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| CoreError::Validation(format!("Invalid date '{raw}'. Expected YYYY-MM-DD")))
}

/// Validate optional notes length.
pub fn validate_notes(notes: Option<&str>) -> Result<(), CoreError> {
    match notes {
        Some(n) if n.chars().count() > MAX_NOTES_LENGTH => Err(CoreError::Validation(format!(
            "Notes must be at most {MAX_NOTES_LENGTH} characters"
        ))),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Eligibility window
// ---------------------------------------------------------------------------

/// Local-time range during which unsupervised QR check-ins are accepted.
///
/// Both bounds are inclusive and compared at full precision: with the default
/// `[09:00, 21:00]` window, `21:00:00` is accepted and `21:00:01` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInWindow {
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

impl CheckInWindow {
    pub fn new(opens_at: NaiveTime, closes_at: NaiveTime) -> Result<Self, CoreError> {
        if opens_at > closes_at {
            return Err(CoreError::Validation(format!(
                "Check-in window opens ({opens_at}) after it closes ({closes_at})"
            )));
        }
        Ok(Self { opens_at, closes_at })
    }

    /// Parse `HH:MM` bounds.
    pub fn parse(opens_at: &str, closes_at: &str) -> Result<Self, CoreError> {
        let parse = |raw: &str| {
            NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
                CoreError::Validation(format!("Invalid window time '{raw}'. Expected HH:MM"))
            })
        };
        Self::new(parse(opens_at)?, parse(closes_at)?)
    }

    pub fn contains(&self, local_time: NaiveTime) -> bool {
        self.opens_at <= local_time && local_time <= self.closes_at
    }

    /// Reject `local` when it falls outside the window.
    pub fn check(&self, local: NaiveDateTime) -> Result<(), CoreError> {
        if self.contains(local.time()) {
            Ok(())
        } else {
            Err(CoreError::OutOfWindow(format!(
                "Attendance can only be marked between {} and {} (local time is {})",
                self.opens_at.format("%H:%M"),
                self.closes_at.format("%H:%M"),
                local.time().format("%H:%M:%S")
            )))
        }
    }
}

impl Default for CheckInWindow {
    fn default() -> Self {
        Self {
            opens_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            closes_at: NaiveTime::from_hms_opt(21, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn status_round_trip_names() {
        for name in AttendanceStatus::ALL {
            assert_eq!(AttendanceStatus::from_str(name).unwrap().as_str(), *name);
        }
        assert_eq!(AttendanceStatus::from_str("excused"), None);
    }

    #[test]
    fn method_names_match_schema() {
        assert_eq!(CheckInMethod::QrScan.as_str(), "qr_scan");
        assert_eq!(CheckInMethod::from_str("manual"), Some(CheckInMethod::Manual));
        assert_eq!(CheckInMethod::from_str("qr_code"), None);
    }

    #[test]
    fn parse_status_requires_value() {
        assert!(matches!(parse_status(None), Err(CoreError::Validation(_))));
        assert!(matches!(parse_status(Some("  ")), Err(CoreError::Validation(_))));
        assert!(matches!(parse_status(Some("sick")), Err(CoreError::Validation(_))));
        assert_eq!(parse_status(Some("late")).unwrap(), AttendanceStatus::Late);
    }

    #[test]
    fn parse_date_rejects_malformed() {
        assert!(parse_date(None).is_err());
        assert!(parse_date(Some("2024/01/01")).is_err());
        assert!(parse_date(Some("2024-02-30")).is_err());
        assert_eq!(
            parse_date(Some("2024-02-29")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn notes_length_limit() {
        assert!(validate_notes(None).is_ok());
        assert!(validate_notes(Some("make-up class")).is_ok());
        let long = "x".repeat(MAX_NOTES_LENGTH + 1);
        assert!(validate_notes(Some(&long)).is_err());
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        let window = CheckInWindow::default();
        assert!(matches!(window.check(at(8, 59, 59)), Err(CoreError::OutOfWindow(_))));
        assert!(window.check(at(9, 0, 0)).is_ok());
        assert!(window.check(at(14, 30, 0)).is_ok());
        assert!(window.check(at(21, 0, 0)).is_ok());
        assert!(matches!(window.check(at(21, 0, 1)), Err(CoreError::OutOfWindow(_))));
    }

    #[test]
    fn window_parse_and_order() {
        let window = CheckInWindow::parse("06:30", "22:00").unwrap();
        assert!(window.contains(NaiveTime::from_hms_opt(6, 30, 0).unwrap()));
        assert!(CheckInWindow::parse("22:00", "06:30").is_err());
        assert!(CheckInWindow::parse("9am", "21:00").is_err());
    }
}
