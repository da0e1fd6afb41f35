//! Membership Plan Calculator and plan maintenance.

use dojo_core::error::CoreError;
use dojo_core::membership::{
    parse_allotment, resolve_plan, validate_allotment, validate_program, PlanResolution,
    PlanUsage,
};
use dojo_core::types::DbId;
use dojo_db::models::person::{MembershipPlan, Person, SetPlan};
use dojo_db::repositories::{AttendanceRepo, PersonRepo};

use crate::directory;
use crate::error::EngineResult;
use crate::state::EngineState;

/// The student's plan fields, or `None` when no plan is set.
pub async fn get_plan(state: &EngineState, student_id: DbId) -> EngineResult<Option<MembershipPlan>> {
    let student = directory::find_student(state, student_id).await?;
    Ok(student.plan())
}

/// Replace the student's plan wholesale.
pub async fn set_plan(state: &EngineState, student_id: DbId, input: &SetPlan) -> EngineResult<Person> {
    let program = validate_program(&input.program)?;
    validate_allotment(input.class_allotment.as_deref())?;

    let student = PersonRepo::set_plan(&state.pool, student_id, input)
        .await?
        .ok_or_else(|| CoreError::not_found("Student", student_id))?;
    tracing::info!(
        student_id,
        program = program.label(),
        start_date = %input.start_date,
        "Membership plan set"
    );
    Ok(student)
}

/// Null out every plan field.
pub async fn clear_plan(state: &EngineState, student_id: DbId) -> EngineResult<()> {
    if !PersonRepo::clear_plan(&state.pool, student_id).await? {
        return Err(CoreError::not_found("Student", student_id).into());
    }
    tracing::info!(student_id, "Membership plan cleared");
    Ok(())
}

/// Classes left on the student's current plan.
///
/// Every event whose creation time falls in the plan window counts, whatever
/// its status. Missing or unrecognized plans are reported in the result, not
/// as errors.
pub async fn remaining_classes(state: &EngineState, student_id: DbId) -> EngineResult<PlanUsage> {
    let student = directory::find_student(state, student_id).await?;

    let window = match resolve_plan(student.program.as_deref(), student.plan_start_date) {
        PlanResolution::NoPlan => return Ok(PlanUsage::no_plan()),
        PlanResolution::InvalidProgram(label) => {
            tracing::warn!(student_id, program = %label, "Stored program is not recognized");
            return Ok(PlanUsage::invalid_program(&label));
        }
        PlanResolution::Active(window) => window,
    };

    let (from, until) = window.utc_bounds(state.zone());
    let attended = AttendanceRepo::count_created_between(&state.pool, student_id, from, until).await?;
    let total = parse_allotment(student.class_allotment.as_deref());

    Ok(PlanUsage::active(window, attended, total))
}
