//! Clock and canonical civil timezone.
//!
//! Every date/time rule in the engine (QR eligibility window, plan window,
//! "today") is evaluated in a single configured timezone, independent of the
//! server locale. Stored timestamps stay UTC; [`CivilZone`] converts between
//! the two. The [`Clock`] trait is injected so tests control "now".

use std::sync::RwLock;

use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Default canonical timezone name.
pub const DEFAULT_TIMEZONE: &str = "US/Pacific";

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// The current instant in UTC.
    fn now(&self) -> Timestamp;
}

/// Wall-clock implementation backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// A clock frozen at a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    instant: RwLock<Timestamp>,
}

impl FixedClock {
    pub fn new(instant: Timestamp) -> Self {
        Self {
            instant: RwLock::new(instant),
        }
    }

    /// Move the clock to `instant`.
    pub fn set(&self, instant: Timestamp) {
        match self.instant.write() {
            Ok(mut guard) => *guard = instant,
            Err(poisoned) => *poisoned.into_inner() = instant,
        }
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let next = self.now() + delta;
        self.set(next);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        match self.instant.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

// ---------------------------------------------------------------------------
// Civil timezone
// ---------------------------------------------------------------------------

/// The canonical civil timezone all local rules are evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilZone {
    tz: Tz,
}

impl CivilZone {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parse an IANA timezone name such as `US/Pacific` or `Europe/Berlin`.
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        name.trim()
            .parse::<Tz>()
            .map(Self::new)
            .map_err(|e| CoreError::Validation(format!("Unknown timezone '{name}': {e}")))
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Wall-clock time in this zone for a UTC instant.
    pub fn to_local(&self, instant: Timestamp) -> NaiveDateTime {
        instant.with_timezone(&self.tz).naive_local()
    }

    /// Calendar date in this zone for a UTC instant.
    pub fn today(&self, instant: Timestamp) -> NaiveDate {
        self.to_local(instant).date()
    }

    /// UTC instant for a wall-clock time in this zone.
    ///
    /// Ambiguous times (DST fold) resolve to the earliest instant. Times that
    /// do not exist (DST gap) resolve forward to the first valid minute.
    pub fn to_utc(&self, local: NaiveDateTime) -> Timestamp {
        let mut candidate = local;
        // A gap is never longer than a few hours; step forward a minute at a time.
        for _ in 0..(24 * 60) {
            if let Some(resolved) = self.tz.from_local_datetime(&candidate).earliest() {
                return resolved.with_timezone(&Utc);
            }
            candidate += Duration::minutes(1);
        }
        Utc.from_utc_datetime(&local)
    }
}

impl Default for CivilZone {
    fn default() -> Self {
        Self::new(chrono_tz::US::Pacific)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn utc(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn parse_known_zone() {
        let zone = CivilZone::parse("US/Pacific").unwrap();
        assert_eq!(zone, CivilZone::default());
    }

    #[test]
    fn parse_unknown_zone_rejected() {
        assert!(matches!(
            CivilZone::parse("Mars/Olympus"),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn local_date_differs_from_utc_date_late_evening() {
        let zone = CivilZone::default();
        // 05:30 UTC on Jan 2nd is 21:30 PST on Jan 1st.
        let instant = utc("2024-01-02T05:30:00Z");
        assert_eq!(zone.today(instant), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(
            zone.to_local(instant).time(),
            NaiveTime::from_hms_opt(21, 30, 0).unwrap()
        );
    }

    #[test]
    fn to_utc_round_trips_regular_time() {
        let zone = CivilZone::default();
        let local = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let instant = zone.to_utc(local);
        assert_eq!(instant, utc("2024-06-01T16:00:00Z"));
        assert_eq!(zone.to_local(instant), local);
    }

    #[test]
    fn to_utc_skips_forward_over_dst_gap() {
        let zone = CivilZone::default();
        // 02:30 on 2024-03-10 does not exist in US/Pacific.
        let local = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let instant = zone.to_utc(local);
        assert_eq!(
            zone.to_local(instant),
            NaiveDate::from_ymd_opt(2024, 3, 10)
                .unwrap()
                .and_hms_opt(3, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn fixed_clock_set_and_advance() {
        let clock = FixedClock::new(utc("2024-01-01T00:00:00Z"));
        clock.advance(Duration::hours(2));
        assert_eq!(clock.now(), utc("2024-01-01T02:00:00Z"));
        clock.set(utc("2025-05-05T05:05:05Z"));
        assert_eq!(clock.now(), utc("2025-05-05T05:05:05Z"));
    }
}
