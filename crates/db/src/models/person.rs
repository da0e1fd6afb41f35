//! Person entity model and DTOs.

use chrono::NaiveDate;
use dojo_core::membership::Program;
use dojo_core::qr;
use dojo_core::roles::ROLE_STUDENT;
use dojo_core::types::{DbId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `people` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Person {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// `"student"` or `"teacher"`.
    pub role: String,
    /// Opaque token embedded in the QR payload. Never changes.
    pub checkin_token: String,
    /// Current belt rank label.
    pub rank: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone_number: Option<String>,
    pub program: Option<String>,
    /// Weekly-frequency label, e.g. `"2/week"`.
    pub weekly_plan: Option<String>,
    /// Total class allotment as entered (digits expected, not enforced for legacy rows).
    pub class_allotment: Option<String>,
    pub plan_start_date: Option<NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Person {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_student(&self) -> bool {
        self.role == ROLE_STUDENT
    }

    /// The `student:<token>` payload to print on this person's QR code.
    pub fn qr_payload(&self) -> String {
        qr::encode_payload(&self.checkin_token)
    }

    /// The membership plan fields, or `None` when nothing is set.
    pub fn plan(&self) -> Option<MembershipPlan> {
        if self.program.is_none()
            && self.weekly_plan.is_none()
            && self.class_allotment.is_none()
            && self.plan_start_date.is_none()
        {
            return None;
        }
        let end_date = match (self.program.as_deref().and_then(Program::from_label), self.plan_start_date) {
            (Some(program), Some(start)) => Some(program.end_date(start)),
            _ => None,
        };
        Some(MembershipPlan {
            program: self.program.clone(),
            weekly_plan: self.weekly_plan.clone(),
            class_allotment: self.class_allotment.clone(),
            start_date: self.plan_start_date,
            end_date,
        })
    }
}

/// Membership plan view derived from a person row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipPlan {
    pub program: Option<String>,
    pub weekly_plan: Option<String>,
    pub class_allotment: Option<String>,
    pub start_date: Option<NaiveDate>,
    /// Start date plus the program offset, when both are known.
    pub end_date: Option<NaiveDate>,
}

/// DTO for registering a new person. The check-in token is generated by the caller.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePerson {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 64))]
    pub first_name: String,
    #[validate(length(min = 1, max = 64))]
    pub last_name: String,
    pub role: String,
}

/// DTO for a teacher's profile edit. `None` leaves the field unchanged.
///
/// The optional columns take `Some(None)` (JSON `null`) to clear the stored
/// value; an empty string clears `phone_number` and `gender` as well.
///
/// `rank` is not written by the profile update itself; the engine routes it
/// through the promotion path so history stays consistent.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfile {
    #[validate(length(min = 1, max = 64))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    #[validate(length(max = 20))]
    pub phone_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub date_of_birth: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "present_or_null")]
    #[validate(length(max = 10))]
    pub gender: Option<Option<String>>,
    #[validate(length(min = 1, max = 20))]
    pub rank: Option<String>,
}

/// Keep an explicit `null` distinct from an absent field.
fn present_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// DTO replacing a student's membership plan wholesale.
#[derive(Debug, Clone, Deserialize)]
pub struct SetPlan {
    pub program: String,
    pub weekly_plan: Option<String>,
    pub class_allotment: Option<String>,
    pub start_date: NaiveDate,
}

/// A student with the creation time of their most recent attendance event.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudentLastAttended {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub student: Person,
    pub last_attended_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_patch_distinguishes_absent_from_null() {
        let patch: UpdateProfile =
            serde_json::from_str(r#"{"date_of_birth": null, "gender": "f"}"#).unwrap();
        assert_eq!(patch.date_of_birth, Some(None));
        assert_eq!(patch.gender, Some(Some("f".to_string())));
        assert_eq!(patch.phone_number, None);

        let patch: UpdateProfile =
            serde_json::from_str(r#"{"date_of_birth": "2010-03-04"}"#).unwrap();
        assert_eq!(patch.date_of_birth, Some(NaiveDate::from_ymd_opt(2010, 3, 4)));
    }

    #[test]
    fn profile_patch_validates_inner_values() {
        let patch = UpdateProfile {
            phone_number: Some(Some("5".repeat(21))),
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        let patch = UpdateProfile {
            phone_number: Some(None),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }
}
