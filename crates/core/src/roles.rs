//! Well-known person role constants.
//!
//! These must match the CHECK constraint in `20240101000001_create_people.sql`.

use crate::error::CoreError;

pub const ROLE_STUDENT: &str = "student";
pub const ROLE_TEACHER: &str = "teacher";

pub const VALID_ROLES: &[&str] = &[ROLE_STUDENT, ROLE_TEACHER];

/// Validate that `role` is one of the known roles.
pub fn validate_role(role: &str) -> Result<(), CoreError> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_ROLES.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_roles_accepted() {
        assert!(validate_role("student").is_ok());
        assert!(validate_role("teacher").is_ok());
    }

    #[test]
    fn unknown_role_rejected() {
        assert!(validate_role("admin").is_err());
        assert!(validate_role("").is_err());
    }
}
