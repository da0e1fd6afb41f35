use std::sync::Arc;

use chrono::NaiveDate;
use dojo_core::attendance::CheckInWindow;
use dojo_core::clock::{CivilZone, Clock, SystemClock};
use dojo_core::types::Timestamp;
use dojo_db::DbPool;

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// Shared state passed to every engine operation.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct EngineState {
    /// Database connection pool.
    pub pool: DbPool,
    pub config: Arc<EngineConfig>,
    /// Source of "now". Tests inject a [`dojo_core::clock::FixedClock`].
    pub clock: Arc<dyn Clock>,
}

impl EngineState {
    pub fn new(pool: DbPool, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            clock,
        }
    }

    /// Connect, verify the database, and apply migrations.
    pub async fn connect(config: EngineConfig) -> EngineResult<Self> {
        let pool = dojo_db::create_pool(&config.database_url, config.max_connections).await?;
        dojo_db::health_check(&pool).await?;
        tracing::info!(max_connections = config.max_connections, "Database pool created");
        dojo_db::run_migrations(&pool).await?;
        Ok(Self::new(pool, config, Arc::new(SystemClock)))
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn zone(&self) -> &CivilZone {
        &self.config.zone
    }

    pub fn checkin_window(&self) -> &CheckInWindow {
        &self.config.checkin_window
    }

    /// Today's date in the canonical timezone.
    pub fn today(&self) -> NaiveDate {
        self.zone().today(self.now())
    }
}
