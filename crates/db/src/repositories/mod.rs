//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Multi-statement writes open
//! their own transaction.

pub mod attendance_audit_repo;
pub mod attendance_repo;
pub mod person_repo;
pub mod rank_history_repo;

pub use attendance_audit_repo::AttendanceAuditRepo;
pub use attendance_repo::AttendanceRepo;
pub use person_repo::PersonRepo;
pub use rank_history_repo::RankHistoryRepo;
