//! DynamoDB key generation functions.
//!
//! Pure functions for generating partition and sort keys following the single-table design.
//! All functions are sync and have no side effects.

// ============================================================================
// Attribute names
// ============================================================================

pub const PK: &str = "Pk";
pub const SK: &str = "Sk";
pub const GS1_PK: &str = "Gs1Pk";
pub const GS1_SK: &str = "Gs1Sk";
pub const GS2_PK: &str = "Gs2Pk";
pub const GS2_SK: &str = "Gs2Sk";

// ============================================================================
// Key prefixes
// ============================================================================

pub const USER_PREFIX: &str = "USER#";
pub const SESSION_PREFIX: &str = "SESSION#";

/// Shared GSI2 partition for all sessions, sorted by expiration.
pub const SESSION_EXPIRATION_PARTITION: &str = "SESSION";

// ============================================================================
// User keys
// ============================================================================

/// Generate primary key for a User.
///
/// Pattern: `USER#<user_id>`
pub fn user_pk(user_id: &str) -> String {
    format!("{USER_PREFIX}{user_id}")
}

/// Generate sort key for a User.
///
/// Pattern: `USER#<user_id>` (same as PK for single-item queries)
pub fn user_sk(user_id: &str) -> String {
    format!("{USER_PREFIX}{user_id}")
}

/// Extract the user ID from a User primary key.
pub fn user_id_from_pk(pk: &str) -> Option<&str> {
    pk.strip_prefix(USER_PREFIX)
}

// ============================================================================
// Session keys
// ============================================================================

/// Generate primary key for a Session.
///
/// Pattern: `SESSION#<session_id>`
pub fn session_pk(session_id: &str) -> String {
    format!("{SESSION_PREFIX}{session_id}")
}

/// Generate sort key for a Session.
///
/// Pattern: `SESSION#<session_id>` (same as PK for single-item queries)
pub fn session_sk(session_id: &str) -> String {
    format!("{SESSION_PREFIX}{session_id}")
}

/// Extract the session ID from a Session primary key.
pub fn session_id_from_pk(pk: &str) -> Option<&str> {
    pk.strip_prefix(SESSION_PREFIX)
}

/// Generate GSI1 partition key for Session (user's sessions lookup).
///
/// Pattern: `USER#<user_id>`
pub fn session_gsi1_pk(user_id: &str) -> String {
    format!("{USER_PREFIX}{user_id}")
}

/// Generate GSI1 sort key for Session.
///
/// Pattern: `SESSION#<session_id>`
pub fn session_gsi1_sk(session_id: &str) -> String {
    format!("{SESSION_PREFIX}{session_id}")
}

/// Generate the GSI1SK prefix for querying all sessions of a user.
///
/// Pattern: `SESSION#`
pub fn session_gsi1_sk_prefix() -> &'static str {
    SESSION_PREFIX
}

/// Generate GSI2 partition key for Session (expiration sweep).
///
/// Pattern: `SESSION`
pub fn session_gsi2_pk() -> &'static str {
    SESSION_EXPIRATION_PARTITION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_keys() {
        assert_eq!(user_pk("ab12"), "USER#ab12");
        assert_eq!(user_sk("ab12"), "USER#ab12");
    }

    #[test]
    fn test_user_id_from_pk() {
        assert_eq!(user_id_from_pk("USER#ab12"), Some("ab12"));
        assert_eq!(user_id_from_pk("USER#"), Some(""));
        assert_eq!(user_id_from_pk("SESSION#ab12"), None);
    }

    #[test]
    fn test_session_keys() {
        assert_eq!(session_pk("s-1"), "SESSION#s-1");
        assert_eq!(session_sk("s-1"), "SESSION#s-1");
        assert_eq!(session_id_from_pk("SESSION#s-1"), Some("s-1"));
        assert_eq!(session_id_from_pk("USER#s-1"), None);
        assert_eq!(session_id_from_pk(&session_pk("")), Some(""));
    }

    #[test]
    fn test_session_gsi1_keys() {
        assert_eq!(session_gsi1_pk("ab12"), "USER#ab12");
        assert_eq!(session_gsi1_sk("s-1"), "SESSION#s-1");
        assert!(session_gsi1_sk("s-1").starts_with(session_gsi1_sk_prefix()));
    }

    #[test]
    fn test_session_gsi1_pk_matches_user_pk() {
        // A user's sessions are grouped under the same value as the user's own key.
        assert_eq!(session_gsi1_pk("ab12"), user_pk("ab12"));
    }

    #[test]
    fn test_session_gsi2_pk() {
        assert_eq!(session_gsi2_pk(), "SESSION");
    }
}
