use chrono::{DateTime, Utc};

use super::{AdapterError, Attributes, DatabaseSession, DatabaseUser, Result};

/// Attribute names the storage layout claims for keys and session fields.
///
/// Records may not use them, in any backend.
pub const RESERVED_ATTRIBUTES: [&str; 8] = [
    "Pk",
    "Sk",
    "Gs1Pk",
    "Gs1Sk",
    "Gs2Pk",
    "Gs2Sk",
    "UserId",
    "ExpiresAt",
];

/// Check if a session has expired.
pub fn is_session_expired(session: &DatabaseSession, now: DateTime<Utc>) -> bool {
    session.expires_at <= now
}

pub fn is_reserved_attribute(name: &str) -> bool {
    RESERVED_ATTRIBUTES.contains(&name)
}

/// Reject a reserved attribute name.
pub fn check_attribute_name(name: &str) -> Result<()> {
    if is_reserved_attribute(name) {
        return Err(AdapterError::InvalidData(format!(
            "Attribute name is reserved: {}",
            name
        )));
    }
    Ok(())
}

/// Reject an attribute map that uses a reserved name.
pub fn check_attribute_names(attributes: &Attributes) -> Result<()> {
    attributes.keys().try_for_each(|name| check_attribute_name(name))
}

/// Check that `user` reads back with the attribute split it is written with.
///
/// Names in `extra_user_attributes` belong in `extra_attributes` and every
/// other name in `attributes`; neither map may use a reserved name.
pub fn check_user_attributes(
    user: &DatabaseUser,
    extra_user_attributes: &[String],
) -> Result<()> {
    check_attribute_names(&user.attributes)?;
    check_attribute_names(&user.extra_attributes)?;

    let is_extra = |name: &String| extra_user_attributes.contains(name);

    if let Some(name) = user.attributes.keys().find(|name| is_extra(name)) {
        return Err(AdapterError::InvalidData(format!(
            "Attribute {} is configured as an extra user attribute",
            name
        )));
    }
    if let Some(name) = user.extra_attributes.keys().find(|name| !is_extra(name)) {
        return Err(AdapterError::InvalidData(format!(
            "Extra attribute {} is not configured on the adapter",
            name
        )));
    }
    Ok(())
}
