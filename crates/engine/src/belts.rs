//! Belt History Tracker.
//!
//! `promote` changes a student's current rank. It locks the student row and
//! appends a history entry in the same transaction unless the rank is
//! unchanged or a sentinel. Edits and deletes of history entries never touch
//! the current rank.

use chrono::NaiveDate;
use dojo_core::error::CoreError;
use dojo_core::rank::normalize_rank;
use dojo_core::types::DbId;
use dojo_db::models::person::Person;
use dojo_db::models::rank_history::{
    CreateRankHistoryEntry, RankHistoryEntry, UpdateRankHistoryEntry,
};
use dojo_db::repositories::{PersonRepo, RankHistoryRepo};
use serde::Serialize;

use crate::directory;
use crate::error::EngineResult;
use crate::state::EngineState;

/// Outcome of [`promote`].
#[derive(Debug, Clone, Serialize)]
pub struct Promotion {
    pub student: Person,
    /// The history entry written, if the change was a milestone.
    pub entry: Option<RankHistoryEntry>,
}

/// Set a student's current rank, recording history for real promotions.
///
/// `date_obtained` defaults to today in the canonical timezone.
pub async fn promote(
    state: &EngineState,
    student_id: DbId,
    new_rank: &str,
    date_obtained: Option<NaiveDate>,
) -> EngineResult<Promotion> {
    let new_rank = normalize_rank(new_rank)?;
    let date_obtained = date_obtained.unwrap_or_else(|| state.today());

    let change = RankHistoryRepo::apply_rank_change(&state.pool, student_id, &new_rank, date_obtained)
        .await?
        .ok_or_else(|| CoreError::not_found("Student", student_id))?;

    tracing::info!(
        student_id,
        from = %change.previous_rank,
        to = %change.student.rank,
        recorded = change.entry.is_some(),
        "Rank updated"
    );
    Ok(Promotion {
        student: change.student,
        entry: change.entry,
    })
}

/// Entries ordered by date obtained (newest first), then creation order.
pub async fn list_history(
    state: &EngineState,
    student_id: DbId,
) -> EngineResult<Vec<RankHistoryEntry>> {
    directory::find_student(state, student_id).await?;
    Ok(RankHistoryRepo::list_for_student(&state.pool, student_id).await?)
}

/// Back-fill a historical entry without changing the current rank.
pub async fn add_history_entry(
    state: &EngineState,
    student_id: DbId,
    rank: &str,
    date_obtained: NaiveDate,
) -> EngineResult<RankHistoryEntry> {
    let rank = normalize_rank(rank)?;
    PersonRepo::find_student(&state.pool, student_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Student", student_id))?;

    let entry = RankHistoryRepo::create(
        &state.pool,
        &CreateRankHistoryEntry {
            student_id,
            rank,
            date_obtained,
        },
    )
    .await?;
    tracing::info!(student_id, entry_id = entry.id, "Rank history entry added");
    Ok(entry)
}

/// Update only the given fields of an entry belonging to the student.
pub async fn edit_history_entry(
    state: &EngineState,
    student_id: DbId,
    entry_id: DbId,
    new_rank: Option<&str>,
    new_date_obtained: Option<NaiveDate>,
) -> EngineResult<RankHistoryEntry> {
    let input = UpdateRankHistoryEntry {
        rank: new_rank.map(normalize_rank).transpose()?,
        date_obtained: new_date_obtained,
    };
    let entry = RankHistoryRepo::update_for_student(&state.pool, student_id, entry_id, &input)
        .await?
        .ok_or_else(|| CoreError::not_found("RankHistoryEntry", entry_id))?;
    tracing::info!(student_id, entry_id, "Rank history entry edited");
    Ok(entry)
}

pub async fn delete_history_entry(
    state: &EngineState,
    student_id: DbId,
    entry_id: DbId,
) -> EngineResult<()> {
    if !RankHistoryRepo::delete_for_student(&state.pool, student_id, entry_id).await? {
        return Err(CoreError::not_found("RankHistoryEntry", entry_id).into());
    }
    tracing::info!(student_id, entry_id, "Rank history entry deleted");
    Ok(())
}
