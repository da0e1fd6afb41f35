#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use dojo_core::clock::FixedClock;
use dojo_core::types::Timestamp;
use dojo_db::models::person::{CreatePerson, Person};
use dojo_engine::{directory, EngineConfig, EngineState};
use sqlx::PgPool;

/// Noon on 2024-05-01 in US/Pacific (PDT, UTC-7).
pub const NOON_PACIFIC: &str = "2024-05-01T19:00:00Z";

/// Build an engine state on the test pool with a frozen clock.
///
/// The returned clock handle moves "now" for every operation using the state.
pub fn test_state(pool: PgPool, now: &str) -> (EngineState, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(ts(now)));
    let state = EngineState::new(pool, EngineConfig::default_for("postgres://test"), clock.clone());
    (state, clock)
}

pub async fn register(state: &EngineState, username: &str, role: &str) -> Person {
    let input = CreatePerson {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        first_name: capitalize(username),
        last_name: "Tester".to_string(),
        role: role.to_string(),
    };
    directory::register_person(state, &input).await.unwrap()
}

pub async fn student(state: &EngineState, username: &str) -> Person {
    register(state, username, "student").await
}

pub async fn teacher(state: &EngineState, username: &str) -> Person {
    register(state, username, "teacher").await
}

pub fn ts(s: &str) -> Timestamp {
    s.parse().unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
