/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All stored timestamps are UTC. Convert through
/// [`CivilZone`](crate::clock::CivilZone) before comparing against local rules.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
