//! Repository for the `people` table.

use sqlx::PgPool;
use dojo_core::roles::ROLE_STUDENT;
use dojo_core::types::DbId;

use crate::models::person::{CreatePerson, Person, SetPlan, StudentLastAttended, UpdateProfile};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, email, first_name, last_name, role, checkin_token, rank, \
                        date_of_birth, gender, phone_number, program, weekly_plan, \
                        class_allotment, plan_start_date, created_at, updated_at";

/// Provides CRUD and lookup operations for people.
pub struct PersonRepo;

impl PersonRepo {
    /// Insert a new person with the given check-in token, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePerson,
        checkin_token: &str,
    ) -> Result<Person, sqlx::Error> {
        let query = format!(
            "INSERT INTO people (username, email, first_name, last_name, role, checkin_token)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.role)
            .bind(checkin_token)
            .fetch_one(pool)
            .await
    }

    /// Find a person by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Person>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM people WHERE id = $1");
        sqlx::query_as::<_, Person>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a student by internal ID. Teachers are not returned.
    pub async fn find_student(pool: &PgPool, id: DbId) -> Result<Option<Person>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM people WHERE id = $1 AND role = $2");
        sqlx::query_as::<_, Person>(&query)
            .bind(id)
            .bind(ROLE_STUDENT)
            .fetch_optional(pool)
            .await
    }

    /// Find a student by check-in token.
    pub async fn find_student_by_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<Person>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM people WHERE checkin_token = $1 AND role = $2");
        sqlx::query_as::<_, Person>(&query)
            .bind(token)
            .bind(ROLE_STUDENT)
            .fetch_optional(pool)
            .await
    }

    /// Find a person by email (case-sensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Person>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM people WHERE email = $1 ORDER BY id LIMIT 1");
        sqlx::query_as::<_, Person>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// List all students ordered by last name, then first name.
    pub async fn list_students(pool: &PgPool) -> Result<Vec<Person>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM people WHERE role = $1 ORDER BY last_name, first_name, id"
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(ROLE_STUDENT)
            .fetch_all(pool)
            .await
    }

    /// Every student with their latest attendance creation time, most recent
    /// first. Students who never attended come last.
    pub async fn list_students_by_last_attended(
        pool: &PgPool,
    ) -> Result<Vec<StudentLastAttended>, sqlx::Error> {
        let columns = COLUMNS
            .split(',')
            .map(|c| format!("p.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT {columns}, MAX(a.created_at) AS last_attended_at
             FROM people p
             LEFT JOIN attendance a ON a.student_id = p.id
             WHERE p.role = $1
             GROUP BY p.id
             ORDER BY MAX(a.created_at) DESC NULLS LAST, p.id"
        );
        sqlx::query_as::<_, StudentLastAttended>(&query)
            .bind(ROLE_STUDENT)
            .fetch_all(pool)
            .await
    }

    /// Update profile fields. Only non-`None` fields in `input` are applied;
    /// `Some(None)` clears an optional column. `input.rank` is ignored here.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_profile(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProfile,
    ) -> Result<Option<Person>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let person = Self::update_profile_inner(&mut tx, id, input).await?;
        tx.commit().await?;
        Ok(person)
    }

    /// [`update_profile`](Self::update_profile) inside an existing transaction.
    pub async fn update_profile_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        input: &UpdateProfile,
    ) -> Result<Option<Person>, sqlx::Error> {
        let query = format!(
            "UPDATE people SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone_number = CASE WHEN $5 THEN NULLIF($6, '') ELSE phone_number END,
                date_of_birth = CASE WHEN $7 THEN $8 ELSE date_of_birth END,
                gender = CASE WHEN $9 THEN NULLIF($10, '') ELSE gender END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(input.phone_number.is_some())
            .bind(input.phone_number.clone().flatten())
            .bind(input.date_of_birth.is_some())
            .bind(input.date_of_birth.flatten())
            .bind(input.gender.is_some())
            .bind(input.gender.clone().flatten())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Replace all plan fields of a student.
    pub async fn set_plan(
        pool: &PgPool,
        id: DbId,
        input: &SetPlan,
    ) -> Result<Option<Person>, sqlx::Error> {
        let query = format!(
            "UPDATE people SET
                program = $2,
                weekly_plan = $3,
                class_allotment = $4,
                plan_start_date = $5
             WHERE id = $1 AND role = $6
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(id)
            .bind(&input.program)
            .bind(&input.weekly_plan)
            .bind(&input.class_allotment)
            .bind(input.start_date)
            .bind(ROLE_STUDENT)
            .fetch_optional(pool)
            .await
    }

    /// Null out all plan fields of a student. Returns `true` if the row exists.
    pub async fn clear_plan(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE people SET
                program = NULL,
                weekly_plan = NULL,
                class_allotment = NULL,
                plan_start_date = NULL
             WHERE id = $1 AND role = $2",
        )
        .bind(id)
        .bind(ROLE_STUDENT)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lock a student's row and return the current rank.
    ///
    /// Returns `None` if the student does not exist.
    pub(crate) async fn lock_rank_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT rank FROM people WHERE id = $1 AND role = $2 FOR UPDATE")
                .bind(id)
                .bind(ROLE_STUDENT)
                .fetch_optional(&mut **tx)
                .await?;
        Ok(row.map(|(rank,)| rank))
    }

    /// Set the current rank inside an existing transaction.
    ///
    /// Returns `None` if the student does not exist.
    pub(crate) async fn set_rank_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        rank: &str,
    ) -> Result<Option<Person>, sqlx::Error> {
        let query = format!(
            "UPDATE people SET rank = $2 WHERE id = $1 AND role = $3 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(id)
            .bind(rank)
            .bind(ROLE_STUDENT)
            .fetch_optional(&mut **tx)
            .await
    }
}
