//! Belt rank labels and history-recording rules.

use crate::error::CoreError;

/// Rank assigned at registration.
pub const RANK_NOT_SET: &str = "Not Set";
/// Explicit "no belt" marker.
pub const RANK_NO_BELT: &str = "No Belt";

/// Ranks meaning "no rank recorded". Changing to one of these never creates
/// a history entry.
pub const SENTINEL_RANKS: &[&str] = &[RANK_NOT_SET, RANK_NO_BELT];

/// Maximum stored length of a rank label.
pub const MAX_RANK_LENGTH: usize = 20;

pub fn is_sentinel(rank: &str) -> bool {
    SENTINEL_RANKS.contains(&rank)
}

/// Trim and validate a rank label, returning the normalized form.
pub fn normalize_rank(raw: &str) -> Result<String, CoreError> {
    let rank = raw.trim();
    if rank.is_empty() {
        return Err(CoreError::Validation("Belt level is required".into()));
    }
    if rank.chars().count() > MAX_RANK_LENGTH {
        return Err(CoreError::Validation(format!(
            "Belt level must be at most {MAX_RANK_LENGTH} characters"
        )));
    }
    Ok(rank.to_string())
}

/// Whether moving from `current` to `new` is a historical milestone.
///
/// Only real changes to a non-sentinel rank are recorded.
pub fn records_history(current: &str, new: &str) -> bool {
    current != new && !is_sentinel(new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels() {
        assert!(is_sentinel("Not Set"));
        assert!(is_sentinel("No Belt"));
        assert!(!is_sentinel("White"));
    }

    #[test]
    fn promotion_to_new_belt_is_recorded() {
        assert!(records_history("White", "Blue"));
        assert!(records_history("Not Set", "White"));
    }

    #[test]
    fn same_rank_is_not_recorded() {
        assert!(!records_history("Blue", "Blue"));
    }

    #[test]
    fn demotion_to_sentinel_is_not_recorded() {
        assert!(!records_history("Blue", "Not Set"));
        assert!(!records_history("Blue", "No Belt"));
    }

    #[test]
    fn normalize_trims_and_bounds() {
        assert_eq!(normalize_rank("  Purple-Blue ").unwrap(), "Purple-Blue");
        assert!(normalize_rank("   ").is_err());
        assert!(normalize_rank(&"B".repeat(MAX_RANK_LENGTH + 1)).is_err());
    }
}
