//! Identity Directory: people lookup, registration, and profile edits.
//!
//! Owns no attendance logic. A rank in a profile edit is applied with the
//! same history rules as [`belts::promote`](crate::belts::promote), in the
//! transaction that writes the rest of the profile.

use dojo_core::error::CoreError;
use dojo_core::qr;
use dojo_core::rank::normalize_rank;
use dojo_core::roles::validate_role;
use dojo_core::types::DbId;
use dojo_db::models::person::{CreatePerson, Person, StudentLastAttended, UpdateProfile};
use dojo_db::repositories::{PersonRepo, RankHistoryRepo};
use validator::Validate;

use crate::error::{log_database_error, unique_violation, EngineError, EngineResult};
use crate::state::EngineState;

/// Register a student or teacher. The check-in token is assigned here, once.
pub async fn register_person(state: &EngineState, input: &CreatePerson) -> EngineResult<Person> {
    input.validate().map_err(validation)?;
    validate_role(&input.role)?;
    ensure_email_free(state, &input.email, None).await?;

    let token = qr::new_checkin_token();
    let person = PersonRepo::create(&state.pool, input, &token)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some("uq_people_username") => EngineError::Core(CoreError::Validation(format!(
                "Username '{}' is already taken",
                input.username
            ))),
            _ => {
                log_database_error(&e);
                EngineError::Database(e)
            }
        })?;

    tracing::info!(person_id = person.id, role = %person.role, "Person registered");
    Ok(person)
}

pub async fn find_by_id(state: &EngineState, id: DbId) -> EngineResult<Option<Person>> {
    Ok(PersonRepo::find_by_id(&state.pool, id).await?)
}

/// Resolve a check-in token to a student.
pub async fn find_by_token(state: &EngineState, token: &str) -> EngineResult<Option<Person>> {
    Ok(PersonRepo::find_student_by_token(&state.pool, token).await?)
}

/// Load a student, failing with `NotFound` for unknown ids and teachers.
pub async fn find_student(state: &EngineState, id: DbId) -> EngineResult<Person> {
    PersonRepo::find_student(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Student", id).into())
}

/// All students ordered by last name, then first name.
pub async fn all_students(state: &EngineState) -> EngineResult<Vec<Person>> {
    Ok(PersonRepo::list_students(&state.pool).await?)
}

/// Every student with their most recent attendance creation time, most
/// recent first; students who never attended come last.
pub async fn students_by_last_attended(
    state: &EngineState,
) -> EngineResult<Vec<StudentLastAttended>> {
    Ok(PersonRepo::list_students_by_last_attended(&state.pool).await?)
}

/// The text to encode in a person's QR code.
pub fn qr_payload(person: &Person) -> String {
    person.qr_payload()
}

/// Apply a profile patch. The whole patch is validated before anything is
/// written; a rank in the patch is recorded like a promotion dated today.
/// Profile fields and rank commit together or not at all.
pub async fn update_profile(
    state: &EngineState,
    id: DbId,
    patch: &UpdateProfile,
) -> EngineResult<Person> {
    patch.validate().map_err(validation)?;
    let rank = patch.rank.as_deref().map(normalize_rank).transpose()?;
    if let Some(email) = &patch.email {
        ensure_email_free(state, email, Some(id)).await?;
    }

    let existing = PersonRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Person", id))?;
    if rank.is_some() && !existing.is_student() {
        return Err(CoreError::Validation("Only students carry a belt rank".into()).into());
    }

    let mut tx = state.pool.begin().await?;
    let mut person = PersonRepo::update_profile_inner(&mut tx, id, patch)
        .await?
        .ok_or_else(|| CoreError::not_found("Person", id))?;

    if let Some(rank) = rank {
        let change = RankHistoryRepo::apply_rank_change_inner(&mut tx, id, &rank, state.today())
            .await?
            .ok_or_else(|| CoreError::not_found("Student", id))?;
        tracing::info!(
            student_id = id,
            from = %change.previous_rank,
            to = %change.student.rank,
            recorded = change.entry.is_some(),
            "Rank updated"
        );
        person = change.student;
    }
    tx.commit().await?;

    tracing::info!(person_id = id, "Profile updated");
    Ok(person)
}

async fn ensure_email_free(
    state: &EngineState,
    email: &str,
    owner: Option<DbId>,
) -> EngineResult<()> {
    match PersonRepo::find_by_email(&state.pool, email).await? {
        Some(other) if Some(other.id) != owner => Err(CoreError::Validation(format!(
            "Email '{email}' is already in use"
        ))
        .into()),
        _ => Ok(()),
    }
}

fn validation(errors: validator::ValidationErrors) -> EngineError {
    EngineError::Core(CoreError::Validation(errors.to_string()))
}
