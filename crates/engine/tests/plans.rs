//! Integration tests for the Membership Plan Calculator.

mod common;

use assert_matches::assert_matches;
use common::{date, student, teacher, test_state, ts, NOON_PACIFIC};
use dojo_core::error::CoreError;
use dojo_core::membership::PlanStatus;
use dojo_db::models::person::SetPlan;
use dojo_db::repositories::PersonRepo;
use dojo_engine::ledger::{self, ManualAttendanceInput};
use dojo_engine::{plans, EngineError};
use sqlx::PgPool;

fn three_month_plan() -> SetPlan {
    SetPlan {
        program: "3 months".into(),
        weekly_plan: Some("2/week".into()),
        class_allotment: Some("48".into()),
        start_date: date(2024, 1, 1),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_remaining_classes_counts_events_in_window(pool: PgPool) {
    let (state, clock) = test_state(pool, NOON_PACIFIC);
    let ana = student(&state, "ana").await;
    let sensei = teacher(&state, "sensei").await;
    plans::set_plan(&state, ana.id, &three_month_plan()).await.unwrap();

    // Creation instants in UTC. January is PST (UTC-8); late March is PDT (UTC-7).
    let inside = [
        "2024-01-01T08:01:00Z", // 00:01 on the start date
        "2024-01-03T19:00:00Z",
        "2024-01-10T19:00:00Z",
        "2024-01-24T19:00:00Z",
        "2024-02-07T19:00:00Z",
        "2024-02-21T19:00:00Z",
        "2024-02-29T19:00:00Z",
        "2024-03-06T19:00:00Z",
        "2024-03-20T18:00:00Z",
        "2024-04-01T06:59:59Z", // 23:59:59 on the end date
    ];
    let outside = [
        "2024-01-01T08:00:30Z", // 00:00:30 on the start date
        "2024-04-01T07:00:00Z", // 00:00 the day after the end date
    ];
    for at in inside.iter().chain(outside.iter()) {
        clock.set(ts(at));
        let input = ManualAttendanceInput {
            student_id: ana.id,
            date: Some(state.today().to_string()),
            status: Some("absent".into()),
            ..Default::default()
        };
        ledger::record_manual_attendance(&state, &input, sensei.id).await.unwrap();
    }

    let usage = plans::remaining_classes(&state, ana.id).await.unwrap();
    assert_eq!(usage.status, PlanStatus::Active);
    assert_eq!((usage.attended, usage.total, usage.remaining), (10, 48, 38));
    let window = usage.window.unwrap();
    assert_eq!(window.end_date, date(2024, 3, 31));

    clock.set(ts("2024-04-02T19:00:00Z"));
    let input = ManualAttendanceInput {
        student_id: ana.id,
        date: Some("2024-04-02".into()),
        status: Some("present".into()),
        ..Default::default()
    };
    ledger::record_manual_attendance(&state, &input, sensei.id).await.unwrap();
    let usage = plans::remaining_classes(&state, ana.id).await.unwrap();
    assert_eq!(usage.attended, 10);
    assert_eq!(usage.remaining, 38);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_remaining_never_goes_negative(pool: PgPool) {
    let (state, _clock) = test_state(pool, "2024-01-05T19:00:00Z");
    let ana = student(&state, "ana").await;
    let sensei = teacher(&state, "sensei").await;
    let plan = SetPlan {
        class_allotment: Some("1".into()),
        ..three_month_plan()
    };
    plans::set_plan(&state, ana.id, &plan).await.unwrap();

    for _ in 0..3 {
        let input = ManualAttendanceInput {
            student_id: ana.id,
            date: Some("2024-01-05".into()),
            status: Some("present".into()),
            ..Default::default()
        };
        ledger::record_manual_attendance(&state, &input, sensei.id).await.unwrap();
    }

    let usage = plans::remaining_classes(&state, ana.id).await.unwrap();
    assert_eq!((usage.attended, usage.total, usage.remaining), (3, 1, 0));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_or_legacy_plans_are_reported_not_raised(pool: PgPool) {
    let (state, _clock) = test_state(pool.clone(), NOON_PACIFIC);
    let ana = student(&state, "ana").await;

    let usage = plans::remaining_classes(&state, ana.id).await.unwrap();
    assert_eq!(usage.status, PlanStatus::NoPlan);
    assert_eq!(usage.remaining, 0);
    assert!(usage.message.is_some());
    assert!(plans::get_plan(&state, ana.id).await.unwrap().is_none());

    // Legacy rows may carry labels the engine no longer accepts on write.
    let legacy = SetPlan {
        program: "2 weeks".into(),
        weekly_plan: None,
        class_allotment: Some("ten".into()),
        start_date: date(2024, 1, 1),
    };
    PersonRepo::set_plan(&pool, ana.id, &legacy).await.unwrap();
    let usage = plans::remaining_classes(&state, ana.id).await.unwrap();
    assert_eq!(usage.status, PlanStatus::InvalidProgram);
    assert_eq!(usage.remaining, 0);

    let legacy = SetPlan {
        program: "6 months".into(),
        ..legacy
    };
    PersonRepo::set_plan(&pool, ana.id, &legacy).await.unwrap();
    let usage = plans::remaining_classes(&state, ana.id).await.unwrap();
    assert_eq!(usage.status, PlanStatus::Active);
    assert_eq!(usage.total, 0);

    let err = plans::remaining_classes(&state, 999_999).await.unwrap_err();
    assert_matches!(err, EngineError::Core(CoreError::NotFound { .. }));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_set_get_and_clear_plan(pool: PgPool) {
    let (state, _clock) = test_state(pool, NOON_PACIFIC);
    let ana = student(&state, "ana").await;
    let sensei = teacher(&state, "sensei").await;

    plans::set_plan(&state, ana.id, &three_month_plan()).await.unwrap();
    let plan = plans::get_plan(&state, ana.id).await.unwrap().unwrap();
    assert_eq!(plan.program.as_deref(), Some("3 months"));
    assert_eq!(plan.end_date, Some(date(2024, 3, 31)));

    let bad_program = SetPlan {
        program: "2 weeks".into(),
        ..three_month_plan()
    };
    let err = plans::set_plan(&state, ana.id, &bad_program).await.unwrap_err();
    assert_matches!(err, EngineError::Core(CoreError::Validation(_)));

    let bad_allotment = SetPlan {
        class_allotment: Some("forty".into()),
        ..three_month_plan()
    };
    let err = plans::set_plan(&state, ana.id, &bad_allotment).await.unwrap_err();
    assert_matches!(err, EngineError::Core(CoreError::Validation(_)));

    let err = plans::set_plan(&state, sensei.id, &three_month_plan()).await.unwrap_err();
    assert_matches!(err, EngineError::Core(CoreError::NotFound { .. }));

    plans::clear_plan(&state, ana.id).await.unwrap();
    assert!(plans::get_plan(&state, ana.id).await.unwrap().is_none());
    let usage = plans::remaining_classes(&state, ana.id).await.unwrap();
    assert_eq!(usage.status, PlanStatus::NoPlan);
}
