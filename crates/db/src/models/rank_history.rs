//! Rank history entry model and DTOs.

use chrono::NaiveDate;
use dojo_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::person::Person;

/// A row from the `rank_history` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RankHistoryEntry {
    pub id: DbId,
    pub student_id: DbId,
    pub rank: String,
    pub date_obtained: NaiveDate,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a history entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRankHistoryEntry {
    pub student_id: DbId,
    pub rank: String,
    pub date_obtained: NaiveDate,
}

/// DTO for editing a history entry. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRankHistoryEntry {
    pub rank: Option<String>,
    pub date_obtained: Option<NaiveDate>,
}

/// Result of a rank change: the updated student, the rank it replaced, and
/// the history entry written for a real promotion.
#[derive(Debug, Clone, Serialize)]
pub struct RankChange {
    pub student: Person,
    pub previous_rank: String,
    pub entry: Option<RankHistoryEntry>,
}
