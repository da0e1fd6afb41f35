//! Membership programs, plan windows, and remaining-class accounting.
//!
//! Plan fields live on the person row. This module turns them into a
//! [`PlanWindow`] and a [`PlanUsage`] summary; counting the attendance rows
//! inside the window is the caller's job.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

use crate::clock::CivilZone;
use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Programs
// ---------------------------------------------------------------------------

pub const PROGRAM_THREE_MONTHS: &str = "3 months";
pub const PROGRAM_SIX_MONTHS: &str = "6 months";
pub const PROGRAM_ONE_YEAR: &str = "1 year";

pub const VALID_PROGRAMS: &[&str] = &[PROGRAM_THREE_MONTHS, PROGRAM_SIX_MONTHS, PROGRAM_ONE_YEAR];

/// Program duration class. Each maps to a fixed day offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Program {
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl Program {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            PROGRAM_THREE_MONTHS => Some(Self::ThreeMonths),
            PROGRAM_SIX_MONTHS => Some(Self::SixMonths),
            PROGRAM_ONE_YEAR => Some(Self::OneYear),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ThreeMonths => PROGRAM_THREE_MONTHS,
            Self::SixMonths => PROGRAM_SIX_MONTHS,
            Self::OneYear => PROGRAM_ONE_YEAR,
        }
    }

    /// Days added to the start date to obtain the plan end date.
    pub fn offset_days(&self) -> i64 {
        match self {
            Self::ThreeMonths => 90,
            Self::SixMonths => 180,
            Self::OneYear => 365,
        }
    }

    pub fn end_date(&self, start: NaiveDate) -> NaiveDate {
        start + Duration::days(self.offset_days())
    }
}

/// Validate a program label supplied by a teacher.
pub fn validate_program(label: &str) -> Result<Program, CoreError> {
    Program::from_label(label).ok_or_else(|| {
        CoreError::Validation(format!(
            "Invalid program '{label}'. Must be one of: {}",
            VALID_PROGRAMS.join(", ")
        ))
    })
}

/// Validate a class allotment supplied by a teacher: digits only, when present.
pub fn validate_allotment(raw: Option<&str>) -> Result<(), CoreError> {
    match raw {
        Some(s) if !is_all_digits(s) => Err(CoreError::Validation(format!(
            "Class allotment '{s}' must be a whole number"
        ))),
        _ => Ok(()),
    }
}

/// Interpret a stored allotment. Empty, non-numeric, or overflowing values count as 0.
pub fn parse_allotment(raw: Option<&str>) -> i64 {
    raw.filter(|s| is_all_digits(s))
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0)
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

// ---------------------------------------------------------------------------
// Plan window
// ---------------------------------------------------------------------------

/// The span over which attendance counts against an allotment.
///
/// Runs from 00:01 on the start date through 23:59 on the end date, both
/// inclusive at minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanWindow {
    pub program: Program,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
}

impl PlanWindow {
    pub fn new(program: Program, start_date: NaiveDate) -> Self {
        let end_date = program.end_date(start_date);
        Self {
            program,
            start_date,
            end_date,
            starts_at: start_date.and_time(first_minute()),
            ends_at: end_date.and_time(last_minute()),
        }
    }

    /// Whether a local wall-clock time, truncated to the minute, is in the window.
    pub fn contains_local(&self, local: NaiveDateTime) -> bool {
        let truncated = local
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(local);
        self.starts_at <= truncated && truncated <= self.ends_at
    }

    /// UTC bounds `[start, end)` equivalent to [`contains_local`](Self::contains_local).
    ///
    /// The exclusive end is midnight after the end date, so every second of
    /// the 23:59 minute is counted.
    pub fn utc_bounds(&self, zone: &CivilZone) -> (Timestamp, Timestamp) {
        let start = zone.to_utc(self.starts_at);
        let end_exclusive = zone.to_utc((self.end_date + Duration::days(1)).and_time(NaiveTime::MIN));
        (start, end_exclusive)
    }
}

fn first_minute() -> NaiveTime {
    NaiveTime::from_hms_opt(0, 1, 0).unwrap_or(NaiveTime::MIN)
}

fn last_minute() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

/// Outcome of resolving a person's plan fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanResolution {
    /// No program or no start date.
    NoPlan,
    /// A program label outside [`VALID_PROGRAMS`].
    InvalidProgram(String),
    Active(PlanWindow),
}

/// Resolve stored plan fields into a window.
pub fn resolve_plan(program: Option<&str>, start_date: Option<NaiveDate>) -> PlanResolution {
    let (Some(label), Some(start)) = (program.filter(|p| !p.is_empty()), start_date) else {
        return PlanResolution::NoPlan;
    };
    match Program::from_label(label) {
        Some(program) => PlanResolution::Active(PlanWindow::new(program, start)),
        None => PlanResolution::InvalidProgram(label.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Usage summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Active,
    NoPlan,
    InvalidProgram,
}

/// Remaining-class summary for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanUsage {
    pub status: PlanStatus,
    /// Explanation for the non-active cases.
    pub message: Option<String>,
    pub attended: i64,
    pub total: i64,
    pub remaining: i64,
    pub window: Option<PlanWindow>,
}

impl PlanUsage {
    pub fn no_plan() -> Self {
        Self::empty(PlanStatus::NoPlan, "No plan data found".into())
    }

    pub fn invalid_program(label: &str) -> Self {
        Self::empty(
            PlanStatus::InvalidProgram,
            format!("Invalid program duration '{label}'"),
        )
    }

    /// Summary for an active plan. `remaining` never goes below zero.
    pub fn active(window: PlanWindow, attended: i64, total: i64) -> Self {
        Self {
            status: PlanStatus::Active,
            message: None,
            attended,
            total,
            remaining: (total - attended).max(0),
            window: Some(window),
        }
    }

    fn empty(status: PlanStatus, message: String) -> Self {
        Self {
            status,
            message: Some(message),
            attended: 0,
            total: 0,
            remaining: 0,
            window: None,
        }
    }
}
