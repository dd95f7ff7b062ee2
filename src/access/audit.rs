//! Consistency checks for a stored allowlist.

use std::collections::HashSet;
use std::fmt;

/// Problem found in a raw allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditIssue {
    /// The id appears more than once. Reported once per id.
    Duplicate(i64),

    /// Telegram user ids are positive.
    NonPositive(i64),

    /// The owner is listed although they always have access.
    RedundantOwner(i64),
}

impl AuditIssue {
    /// Whether the issue should fail validation.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Duplicate(_) | Self::NonPositive(_))
    }
}

impl fmt::Display for AuditIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate(id) => write!(f, "id {id} is listed more than once"),
            Self::NonPositive(id) => write!(f, "id {id} is not a valid Telegram user id"),
            Self::RedundantOwner(id) => {
                write!(f, "id {id} is the owner and does not need to be listed")
            }
        }
    }
}

/// Checks raw ids in stored order. `owner_id` of `None` or `0` skips the owner check.
#[must_use]
pub fn audit_ids(ids: &[i64], owner_id: Option<i64>) -> Vec<AuditIssue> {
    let owner = owner_id.filter(|&id| id != 0);
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut issues = Vec::new();

    for &id in ids {
        if !seen.insert(id) {
            if reported.insert(id) {
                issues.push(AuditIssue::Duplicate(id));
            }
            continue;
        }
        if id <= 0 {
            issues.push(AuditIssue::NonPositive(id));
        }
        if owner == Some(id) {
            issues.push(AuditIssue::RedundantOwner(id));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_list() {
        assert!(audit_ids(&[1, 2, 3], Some(99)).is_empty());
        assert!(audit_ids(&[], None).is_empty());
    }

    #[test]
    fn test_duplicates_reported_once() {
        let issues = audit_ids(&[5, 5, 6, 5], None);
        assert_eq!(issues, vec![AuditIssue::Duplicate(5)]);
        assert!(issues[0].is_error());
    }

    #[test]
    fn test_non_positive() {
        let issues = audit_ids(&[0, -12, 4], None);
        assert_eq!(
            issues,
            vec![AuditIssue::NonPositive(0), AuditIssue::NonPositive(-12)]
        );
    }

    #[test]
    fn test_redundant_owner_is_warning() {
        let issues = audit_ids(&[7, 1000], Some(1000));
        assert_eq!(issues, vec![AuditIssue::RedundantOwner(1000)]);
        assert!(!issues[0].is_error());
    }

    #[test]
    fn test_zero_owner_is_ignored() {
        let issues = audit_ids(&[0], Some(0));
        assert_eq!(issues, vec![AuditIssue::NonPositive(0)]);
    }
}
