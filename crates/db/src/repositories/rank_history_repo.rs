//! Repository for the `rank_history` table.

use chrono::NaiveDate;
use sqlx::PgPool;
use dojo_core::rank::records_history;
use dojo_core::types::DbId;

use crate::models::rank_history::{
    CreateRankHistoryEntry, RankChange, RankHistoryEntry, UpdateRankHistoryEntry,
};
use crate::repositories::PersonRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, student_id, rank, date_obtained, created_at, updated_at";

/// Provides CRUD operations for rank history and the atomic promotion write.
pub struct RankHistoryRepo;

impl RankHistoryRepo {
    /// Insert a history entry without touching the student's current rank.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRankHistoryEntry,
    ) -> Result<RankHistoryEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO rank_history (student_id, rank, date_obtained)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RankHistoryEntry>(&query)
            .bind(input.student_id)
            .bind(&input.rank)
            .bind(input.date_obtained)
            .fetch_one(pool)
            .await
    }

    /// List a student's entries, newest `date_obtained` first, then creation order.
    pub async fn list_for_student(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Vec<RankHistoryEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM rank_history
             WHERE student_id = $1
             ORDER BY date_obtained DESC, id ASC"
        );
        sqlx::query_as::<_, RankHistoryEntry>(&query)
            .bind(student_id)
            .fetch_all(pool)
            .await
    }

    /// Find an entry that belongs to the given student.
    pub async fn find_for_student(
        pool: &PgPool,
        student_id: DbId,
        id: DbId,
    ) -> Result<Option<RankHistoryEntry>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM rank_history WHERE id = $1 AND student_id = $2");
        sqlx::query_as::<_, RankHistoryEntry>(&query)
            .bind(id)
            .bind(student_id)
            .fetch_optional(pool)
            .await
    }

    /// Update an entry. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if the entry does not exist or belongs to another student.
    pub async fn update_for_student(
        pool: &PgPool,
        student_id: DbId,
        id: DbId,
        input: &UpdateRankHistoryEntry,
    ) -> Result<Option<RankHistoryEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE rank_history SET
                rank = COALESCE($3, rank),
                date_obtained = COALESCE($4, date_obtained)
             WHERE id = $1 AND student_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RankHistoryEntry>(&query)
            .bind(id)
            .bind(student_id)
            .bind(&input.rank)
            .bind(input.date_obtained)
            .fetch_optional(pool)
            .await
    }

    /// Delete an entry that belongs to the given student. Returns `true` if removed.
    pub async fn delete_for_student(
        pool: &PgPool,
        student_id: DbId,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM rank_history WHERE id = $1 AND student_id = $2")
            .bind(id)
            .bind(student_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set a student's current rank, appending a history entry dated
    /// `date_obtained` when the change is a real promotion. Both writes share
    /// one transaction.
    ///
    /// Returns `None` (and writes nothing) if the student does not exist.
    pub async fn apply_rank_change(
        pool: &PgPool,
        student_id: DbId,
        rank: &str,
        date_obtained: NaiveDate,
    ) -> Result<Option<RankChange>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let Some(change) =
            Self::apply_rank_change_inner(&mut tx, student_id, rank, date_obtained).await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };
        tx.commit().await?;
        Ok(Some(change))
    }

    /// [`apply_rank_change`](Self::apply_rank_change) inside an existing
    /// transaction. The student row stays locked until the transaction ends,
    /// so concurrent changes to the same rank record history once.
    pub async fn apply_rank_change_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        student_id: DbId,
        rank: &str,
        date_obtained: NaiveDate,
    ) -> Result<Option<RankChange>, sqlx::Error> {
        let Some(previous_rank) = PersonRepo::lock_rank_inner(tx, student_id).await? else {
            return Ok(None);
        };

        let entry = if records_history(&previous_rank, rank) {
            let query = format!(
                "INSERT INTO rank_history (student_id, rank, date_obtained)
                 VALUES ($1, $2, $3)
                 RETURNING {COLUMNS}"
            );
            let entry = sqlx::query_as::<_, RankHistoryEntry>(&query)
                .bind(student_id)
                .bind(rank)
                .bind(date_obtained)
                .fetch_one(&mut **tx)
                .await?;
            Some(entry)
        } else {
            None
        };

        let Some(student) = PersonRepo::set_rank_inner(tx, student_id, rank).await? else {
            return Ok(None);
        };

        Ok(Some(RankChange {
            student,
            previous_rank,
            entry,
        }))
    }
}
