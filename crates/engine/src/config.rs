use dojo_core::attendance::CheckInWindow;
use dojo_core::clock::{CivilZone, DEFAULT_TIMEZONE};
use dojo_core::error::CoreError;

/// Errors raised while loading [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Pool size (default: `20`).
    pub max_connections: u32,
    /// Canonical civil timezone (default: `US/Pacific`).
    pub zone: CivilZone,
    /// Local-time range for QR check-ins (default: `09:00`-`21:00`).
    pub checkin_window: CheckInWindow,
}

impl EngineConfig {
    /// Defaults for everything but the database URL.
    pub fn default_for(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 20,
            zone: CivilZone::default(),
            checkin_window: CheckInWindow::default(),
        }
    }

    /// Load `.env` if present, then read the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default       |
    /// |------------------------|---------------|
    /// | `DATABASE_URL`         | (required)    |
    /// | `DB_MAX_CONNECTIONS`   | `20`          |
    /// | `DOJO_TIMEZONE`        | `US/Pacific`  |
    /// | `CHECKIN_WINDOW_START` | `09:00`       |
    /// | `CHECKIN_WINDOW_END`   | `21:00`       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS",
                reason: e.to_string(),
            })?,
            None => 20,
        };

        let zone_name = lookup("DOJO_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.into());
        let zone = CivilZone::parse(&zone_name).map_err(|e| invalid("DOJO_TIMEZONE", e))?;

        let checkin_window = match (lookup("CHECKIN_WINDOW_START"), lookup("CHECKIN_WINDOW_END")) {
            (None, None) => CheckInWindow::default(),
            (start, end) => CheckInWindow::parse(
                start.as_deref().unwrap_or("09:00"),
                end.as_deref().unwrap_or("21:00"),
            )
            .map_err(|e| invalid("CHECKIN_WINDOW_START/END", e))?,
        };

        Ok(Self {
            database_url,
            max_connections,
            zone,
            checkin_window,
        })
    }
}

fn invalid(var: &'static str, err: CoreError) -> ConfigError {
    let reason = match err {
        CoreError::Validation(msg) => msg,
        other => other.to_string(),
    };
    ConfigError::Invalid { var, reason }
}
