//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and the
//! user/session records. These are testable in isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, SecondsFormat, Utc};
use dynauth_core::adapter::{
    check_attribute_name, is_reserved_attribute, AdapterError, Attributes, DatabaseSession,
    DatabaseUser,
};
use serde_json::{Number, Value};

use super::keys;

/// A DynamoDB item.
pub type Item = HashMap<String, AttributeValue>;

// ============================================================================
// Data attribute names
// ============================================================================

pub const USER_ID: &str = "UserId";
pub const EXPIRES_AT: &str = "ExpiresAt";

// ============================================================================
// User conversions
// ============================================================================

/// Convert a DatabaseUser to DynamoDB item.
///
/// Library attributes and extra attributes are flattened onto the same item.
pub fn user_to_item(user: &DatabaseUser) -> Result<Item, AdapterError> {
    let mut item = HashMap::new();

    // Keys
    item.insert(keys::PK.to_string(), AttributeValue::S(keys::user_pk(&user.id)));
    item.insert(keys::SK.to_string(), AttributeValue::S(keys::user_sk(&user.id)));

    // Data
    insert_attributes(&mut item, &user.attributes)?;
    insert_attributes(&mut item, &user.extra_attributes)?;

    Ok(item)
}

/// Convert a DynamoDB item to DatabaseUser.
///
/// Attributes named in `extra_user_attributes` go to `extra_attributes`, every
/// other non-key attribute to `attributes`. The split is by name only, so a
/// configured name read back always lands in `extra_attributes`.
pub fn item_to_user(
    item: &Item,
    extra_user_attributes: &[String],
) -> Result<DatabaseUser, AdapterError> {
    let pk = get_string(item, keys::PK)?;
    let id = keys::user_id_from_pk(&pk)
        .ok_or_else(|| AdapterError::InvalidData(format!("Not a user key: {}", pk)))?;

    let mut user = DatabaseUser::new(id);
    for (name, value) in item {
        if is_reserved_attribute(name) {
            continue;
        }
        let value = attribute_value_to_json(value)?;
        if extra_user_attributes.iter().any(|a| a == name) {
            user.extra_attributes.insert(name.clone(), value);
        } else {
            user.attributes.insert(name.clone(), value);
        }
    }

    Ok(user)
}

// ============================================================================
// Session conversions
// ============================================================================

/// Convert a DatabaseSession to DynamoDB item.
pub fn session_to_item(session: &DatabaseSession) -> Result<Item, AdapterError> {
    let mut item = HashMap::new();
    let expires_at = format_expires_at(session.expires_at);

    // Keys
    item.insert(
        keys::PK.to_string(),
        AttributeValue::S(keys::session_pk(&session.id)),
    );
    item.insert(
        keys::SK.to_string(),
        AttributeValue::S(keys::session_sk(&session.id)),
    );
    item.insert(
        keys::GS1_PK.to_string(),
        AttributeValue::S(keys::session_gsi1_pk(&session.user_id)),
    );
    item.insert(
        keys::GS1_SK.to_string(),
        AttributeValue::S(keys::session_gsi1_sk(&session.id)),
    );
    item.insert(
        keys::GS2_PK.to_string(),
        AttributeValue::S(keys::session_gsi2_pk().to_string()),
    );
    item.insert(
        keys::GS2_SK.to_string(),
        AttributeValue::S(expires_at.clone()),
    );

    // Data
    item.insert(
        USER_ID.to_string(),
        AttributeValue::S(session.user_id.clone()),
    );
    item.insert(EXPIRES_AT.to_string(), AttributeValue::S(expires_at));
    insert_attributes(&mut item, &session.attributes)?;

    Ok(item)
}

/// Convert a DynamoDB item to DatabaseSession.
pub fn item_to_session(item: &Item) -> Result<DatabaseSession, AdapterError> {
    let pk = get_string(item, keys::PK)?;
    let id = keys::session_id_from_pk(&pk)
        .ok_or_else(|| AdapterError::InvalidData(format!("Not a session key: {}", pk)))?;

    let mut session = DatabaseSession::new(
        id,
        get_string(item, USER_ID)?,
        parse_expires_at(&get_string(item, EXPIRES_AT)?)?,
    );
    for (name, value) in item {
        if !is_reserved_attribute(name) {
            session
                .attributes
                .insert(name.clone(), attribute_value_to_json(value)?);
        }
    }

    Ok(session)
}

// ============================================================================
// Expiration timestamps
// ============================================================================

/// Format an expiration timestamp.
///
/// Fixed-width RFC 3339 in UTC with nanosecond precision, so the stored value
/// parses back to the same instant and lexicographic order on `Gs2Sk` equals
/// time order.
pub fn format_expires_at(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse an expiration timestamp (RFC 3339 format).
pub fn parse_expires_at(s: &str) -> Result<DateTime<Utc>, AdapterError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AdapterError::InvalidData(format!("Invalid datetime {}: {}", s, e)))
}

/// The `Pk`/`Sk` of an item, read straight from its key attributes.
pub fn item_key(item: &Item) -> Result<(String, String), AdapterError> {
    Ok((get_string(item, keys::PK)?, get_string(item, keys::SK)?))
}

// ============================================================================
// Query expressions
// ============================================================================

/// A key condition expression with its placeholder maps.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

/// Condition selecting every session of `user_id` on GSI1.
pub fn user_sessions_condition(user_id: &str) -> KeyCondition {
    KeyCondition {
        expression: "#pk = :pk AND begins_with(#sk, :sk_prefix)".to_string(),
        names: HashMap::from([
            ("#pk".to_string(), keys::GS1_PK.to_string()),
            ("#sk".to_string(), keys::GS1_SK.to_string()),
        ]),
        values: HashMap::from([
            (
                ":pk".to_string(),
                AttributeValue::S(keys::session_gsi1_pk(user_id)),
            ),
            (
                ":sk_prefix".to_string(),
                AttributeValue::S(keys::session_gsi1_sk_prefix().to_string()),
            ),
        ]),
    }
}

/// Condition selecting every session expiring at or before `now` on GSI2.
pub fn expired_sessions_condition(now: DateTime<Utc>) -> KeyCondition {
    KeyCondition {
        expression: "#pk = :pk AND #sk <= :now".to_string(),
        names: HashMap::from([
            ("#pk".to_string(), keys::GS2_PK.to_string()),
            ("#sk".to_string(), keys::GS2_SK.to_string()),
        ]),
        values: HashMap::from([
            (
                ":pk".to_string(),
                AttributeValue::S(keys::session_gsi2_pk().to_string()),
            ),
            (":now".to_string(), AttributeValue::S(format_expires_at(now))),
        ]),
    }
}

// ============================================================================
// Update expressions
// ============================================================================

/// A `SET` update expression with its placeholder maps.
#[derive(Debug, Clone, PartialEq)]
pub struct SetExpression {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

/// Build a `SET` expression assigning every given attribute.
///
/// Returns `None` when there is nothing to set. Names and values go through
/// placeholders, so attribute names may collide with DynamoDB reserved words.
pub fn set_expression(attributes: &Attributes) -> Result<Option<SetExpression>, AdapterError> {
    if attributes.is_empty() {
        return Ok(None);
    }

    let mut assignments = Vec::with_capacity(attributes.len());
    let mut names = HashMap::new();
    let mut values = HashMap::new();

    for (index, (name, value)) in attributes.iter().enumerate() {
        check_attribute_name(name)?;
        let name_placeholder = format!("#a{index}");
        let value_placeholder = format!(":v{index}");
        assignments.push(format!("{name_placeholder} = {value_placeholder}"));
        names.insert(name_placeholder, name.clone());
        values.insert(value_placeholder, json_to_attribute_value(value));
    }

    Ok(Some(SetExpression {
        expression: format!("SET {}", assignments.join(", ")),
        names,
        values,
    }))
}

// ============================================================================
// Value conversions
// ============================================================================

/// Convert a JSON value to a DynamoDB attribute value.
pub fn json_to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(json_to_attribute_value).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_attribute_value(v)))
                .collect(),
        ),
    }
}

/// Convert a DynamoDB attribute value to a JSON value.
///
/// String and number sets decode to arrays. Binary values have no JSON
/// counterpart and are rejected.
pub fn attribute_value_to_json(value: &AttributeValue) -> Result<Value, AdapterError> {
    match value {
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
        AttributeValue::N(n) => parse_number(n).map(Value::Number),
        AttributeValue::S(s) => Ok(Value::String(s.clone())),
        AttributeValue::L(items) => items
            .iter()
            .map(attribute_value_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AttributeValue::M(map) => map
            .iter()
            .map(|(k, v)| attribute_value_to_json(v).map(|v| (k.clone(), v)))
            .collect::<Result<Attributes, _>>()
            .map(Value::Object),
        AttributeValue::Ss(strings) => Ok(Value::Array(
            strings.iter().cloned().map(Value::String).collect(),
        )),
        AttributeValue::Ns(numbers) => numbers
            .iter()
            .map(|n| parse_number(n).map(Value::Number))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Err(AdapterError::InvalidData(format!(
            "Unsupported attribute value: {:?}",
            other
        ))),
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Copy record attributes onto an item, rejecting reserved names.
fn insert_attributes(item: &mut Item, attributes: &Attributes) -> Result<(), AdapterError> {
    for (name, value) in attributes {
        check_attribute_name(name)?;
        item.insert(name.clone(), json_to_attribute_value(value));
    }
    Ok(())
}

/// Get a required string attribute.
fn get_string(item: &Item, key: &str) -> Result<String, AdapterError> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| AdapterError::InvalidData(format!("Missing or invalid field: {}", key)))
}

fn parse_number(n: &str) -> Result<Number, AdapterError> {
    if let Ok(i) = n.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = n.parse::<u64>() {
        return Ok(Number::from(u));
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| AdapterError::InvalidData(format!("Invalid number: {}", n)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_user() -> DatabaseUser {
        DatabaseUser::new("ab12")
            .with_attribute("username", json!("alice"))
            .with_attribute("age", json!(42))
            .with_extra_attribute("HashedPassword", json!("123456"))
    }

    fn sample_session() -> DatabaseSession {
        DatabaseSession::new(
            "s-1",
            "ab12",
            DateTime::parse_from_rfc3339("2024-01-15T10:30:00.250Z")
                .unwrap()
                .with_timezone(&Utc),
        )
        .with_attribute("country", json!("uy"))
    }

    fn extras() -> Vec<String> {
        vec!["HashedPassword".to_string()]
    }

    #[test]
    fn test_user_round_trip_keeps_extra_attributes() {
        let user = sample_user();
        let item = user_to_item(&user).unwrap();
        let parsed = item_to_user(&item, &extras()).unwrap();

        assert_eq!(parsed, user);
    }

    #[test]
    fn test_user_item_has_correct_keys() {
        let item = user_to_item(&sample_user()).unwrap();

        assert_eq!(item.get("Pk").unwrap().as_s().unwrap(), "USER#ab12");
        assert_eq!(item.get("Sk").unwrap().as_s().unwrap(), "USER#ab12");
        assert_eq!(item.get("username").unwrap().as_s().unwrap(), "alice");
        assert_eq!(item.get("age").unwrap().as_n().unwrap(), "42");
        assert_eq!(item.get("HashedPassword").unwrap().as_s().unwrap(), "123456");
        assert!(!item.contains_key("Gs1Pk"));
    }

    #[test]
    fn test_unconfigured_extra_attributes_read_as_attributes() {
        let item = user_to_item(&sample_user()).unwrap();
        let parsed = item_to_user(&item, &[]).unwrap();

        assert!(parsed.extra_attributes.is_empty());
        assert_eq!(
            parsed.attributes.get("HashedPassword"),
            Some(&json!("123456"))
        );
    }

    #[test]
    fn test_item_to_user_accepts_externally_written_items() {
        let mut item = HashMap::new();
        item.insert("Pk".to_string(), AttributeValue::S("USER#ab12".to_string()));
        item.insert("Sk".to_string(), AttributeValue::S("USER#ab12".to_string()));
        item.insert(
            "HashedPassword".to_string(),
            AttributeValue::S("123456".to_string()),
        );
        item.insert(
            "username".to_string(),
            AttributeValue::S("alice".to_string()),
        );

        let user = item_to_user(&item, &extras()).unwrap();

        assert_eq!(user.id, "ab12");
        assert_eq!(user.attributes.len(), 1);
        assert_eq!(user.extra_attributes.len(), 1);
    }

    #[test]
    fn test_item_to_user_rejects_session_item() {
        let item = session_to_item(&sample_session()).unwrap();
        assert!(item_to_user(&item, &[]).is_err());
    }

    #[test]
    fn test_user_with_reserved_attribute_is_rejected() {
        let user = DatabaseUser::new("ab12").with_attribute("Gs1Pk", json!("x"));
        let err = user_to_item(&user).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Invalid data: Attribute name is reserved: Gs1Pk"
        );
    }

    #[test]
    fn test_layout_attribute_names_are_reserved() {
        let layout = [
            keys::PK,
            keys::SK,
            keys::GS1_PK,
            keys::GS1_SK,
            keys::GS2_PK,
            keys::GS2_SK,
            USER_ID,
            EXPIRES_AT,
        ];

        assert!(layout.iter().all(|name| is_reserved_attribute(name)));
    }

    #[test]
    fn test_empty_ids_round_trip() {
        let user = DatabaseUser::new("").with_attribute("username", json!("nobody"));
        let parsed = item_to_user(&user_to_item(&user).unwrap(), &[]).unwrap();
        assert_eq!(parsed, user);

        let session = DatabaseSession::new("", "", sample_session().expires_at);
        let parsed = item_to_session(&session_to_item(&session).unwrap()).unwrap();
        assert_eq!(parsed, session);
    }

    #[test]
    fn test_session_round_trip() {
        let session = sample_session();
        let item = session_to_item(&session).unwrap();
        let parsed = item_to_session(&item).unwrap();

        assert_eq!(parsed, session);
    }

    #[test]
    fn test_session_item_has_correct_index_keys() {
        let item = session_to_item(&sample_session()).unwrap();

        assert_eq!(item.get("Pk").unwrap().as_s().unwrap(), "SESSION#s-1");
        assert_eq!(item.get("Sk").unwrap().as_s().unwrap(), "SESSION#s-1");
        assert_eq!(item.get("Gs1Pk").unwrap().as_s().unwrap(), "USER#ab12");
        assert_eq!(item.get("Gs1Sk").unwrap().as_s().unwrap(), "SESSION#s-1");
        assert_eq!(item.get("Gs2Pk").unwrap().as_s().unwrap(), "SESSION");
        assert_eq!(
            item.get("Gs2Sk").unwrap().as_s().unwrap(),
            "2024-01-15T10:30:00.250000000Z"
        );
        assert_eq!(item.get("UserId").unwrap().as_s().unwrap(), "ab12");
    }

    #[test]
    fn test_item_to_session_requires_user_id() {
        let mut item = session_to_item(&sample_session()).unwrap();
        item.remove("UserId");

        assert!(item_to_session(&item).is_err());
    }

    #[test]
    fn test_expires_at_ordering_is_lexicographic() {
        let earlier = DateTime::parse_from_rfc3339("2024-01-15T09:59:59.999Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2024-01-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let (a, b) = (format_expires_at(earlier), format_expires_at(later));

        assert_eq!(b, "2024-01-15T10:00:00.000000000Z");
        assert!(a < b);
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn test_expires_at_keeps_sub_millisecond_precision() {
        let at = DateTime::parse_from_rfc3339("2024-01-15T10:30:00.123456789Z")
            .unwrap()
            .with_timezone(&Utc);
        let session = DatabaseSession::new("s-1", "ab12", at);

        let item = session_to_item(&session).unwrap();
        assert_eq!(
            item.get("ExpiresAt").unwrap().as_s().unwrap(),
            "2024-01-15T10:30:00.123456789Z"
        );
        assert_eq!(item_to_session(&item).unwrap().expires_at, at);
    }

    #[test]
    fn test_expires_at_orders_within_a_millisecond() {
        let earlier = DateTime::parse_from_rfc3339("2024-01-15T10:30:00.123000001Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2024-01-15T10:30:00.123000002Z")
            .unwrap()
            .with_timezone(&Utc);

        assert!(format_expires_at(earlier) < format_expires_at(later));
    }

    #[test]
    fn test_item_key_reads_key_attributes_only() {
        let mut item = session_to_item(&sample_session()).unwrap();
        item.remove("ExpiresAt");
        item.insert(
            "avatar".to_string(),
            AttributeValue::B(aws_sdk_dynamodb::primitives::Blob::new(vec![1, 2, 3])),
        );

        assert!(item_to_session(&item).is_err());
        assert_eq!(
            item_key(&item).unwrap(),
            ("SESSION#s-1".to_string(), "SESSION#s-1".to_string())
        );
    }

    #[test]
    fn test_item_key_requires_both_keys() {
        let mut item = session_to_item(&sample_session()).unwrap();
        item.remove("Sk");

        assert!(matches!(item_key(&item), Err(AdapterError::InvalidData(_))));
    }

    #[test]
    fn test_user_sessions_condition_uses_name_placeholders() {
        let condition = user_sessions_condition("ab12");

        assert_eq!(
            condition.expression,
            "#pk = :pk AND begins_with(#sk, :sk_prefix)"
        );
        assert_eq!(condition.names.get("#pk").unwrap(), keys::GS1_PK);
        assert_eq!(condition.names.get("#sk").unwrap(), keys::GS1_SK);
        assert_eq!(condition.values.get(":pk").unwrap().as_s().unwrap(), "USER#ab12");
        assert_eq!(
            condition.values.get(":sk_prefix").unwrap().as_s().unwrap(),
            "SESSION#"
        );
        assert!(!condition.expression.contains(keys::GS1_PK));
    }

    #[test]
    fn test_expired_sessions_condition_uses_name_placeholders() {
        let now = sample_session().expires_at;
        let condition = expired_sessions_condition(now);

        assert_eq!(condition.expression, "#pk = :pk AND #sk <= :now");
        assert_eq!(condition.names.get("#pk").unwrap(), keys::GS2_PK);
        assert_eq!(condition.names.get("#sk").unwrap(), keys::GS2_SK);
        assert_eq!(condition.values.get(":pk").unwrap().as_s().unwrap(), "SESSION");
        assert_eq!(
            condition.values.get(":now").unwrap().as_s().unwrap(),
            &format_expires_at(now)
        );
    }

    #[test]
    fn test_parse_expires_at_invalid() {
        assert!(parse_expires_at("yesterday").is_err());
    }

    #[test]
    fn test_nested_values_round_trip() {
        let value = json!({
            "roles": ["admin", "editor"],
            "profile": { "verified": true, "score": 1.5, "nickname": null },
            "visits": -3
        });

        let attribute = json_to_attribute_value(&value);
        assert_eq!(attribute_value_to_json(&attribute).unwrap(), value);
    }

    #[test]
    fn test_sets_decode_to_arrays() {
        let strings = AttributeValue::Ss(vec!["a".to_string(), "b".to_string()]);
        let numbers = AttributeValue::Ns(vec!["1".to_string(), "2.5".to_string()]);

        assert_eq!(attribute_value_to_json(&strings).unwrap(), json!(["a", "b"]));
        assert_eq!(attribute_value_to_json(&numbers).unwrap(), json!([1, 2.5]));
    }

    #[test]
    fn test_binary_values_are_rejected() {
        let blob = AttributeValue::B(aws_sdk_dynamodb::primitives::Blob::new(vec![1, 2, 3]));
        assert!(attribute_value_to_json(&blob).is_err());
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        assert!(parse_number("not-a-number").is_err());
        assert_eq!(parse_number("18446744073709551615").unwrap(), Number::from(u64::MAX));
    }

    #[test]
    fn test_set_expression() {
        let mut attributes = Attributes::new();
        attributes.insert("username".to_string(), json!("bob"));

        let set = set_expression(&attributes).unwrap().unwrap();

        assert_eq!(set.expression, "SET #a0 = :v0");
        assert_eq!(set.names.get("#a0").unwrap(), "username");
        assert_eq!(set.values.get(":v0").unwrap().as_s().unwrap(), "bob");
    }

    #[test]
    fn test_set_expression_empty_and_reserved() {
        assert!(set_expression(&Attributes::new()).unwrap().is_none());

        let mut attributes = Attributes::new();
        attributes.insert("Pk".to_string(), json!("USER#other"));
        assert!(set_expression(&attributes).is_err());
    }
}
