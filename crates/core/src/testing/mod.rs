//! Adapter conformance suite.
//!
//! Runs the storage contract against any [`Adapter`] implementation. Backends
//! call [`test_adapter`] from their own tests after seeding the user returned
//! by [`database_user`] (plus any adapter-specific extra attributes).
//!
//! ```ignore
//! let user = database_user().with_extra_attribute("HashedPassword", json!("123456"));
//! adapter.set_user(&user).await?;
//! test_adapter(&adapter, &user).await?;
//! ```

mod error;

pub use error::{ConformanceError, Result};

use std::fmt::Debug;

use chrono::{DateTime, Duration, Timelike, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::adapter::{Adapter, AdapterError, Attributes, DatabaseSession, DatabaseUser};

use error::StepExt;

/// Returns a user with a unique ID and the attributes the suite expects to read back.
pub fn database_user() -> DatabaseUser {
    let id = Uuid::new_v4().simple().to_string();
    let username = format!("user_{}", &id[..8]);
    DatabaseUser::new(id).with_attribute("username", json!(username))
}

/// Runs every conformance check against `adapter`.
///
/// `database_user` must already be stored. The suite leaves it in place and
/// deletes every other record it creates.
pub async fn test_adapter<A>(adapter: &A, database_user: &DatabaseUser) -> Result<()>
where
    A: Adapter + ?Sized,
{
    check_users(adapter, database_user).await?;
    check_session_lookups(adapter, database_user).await?;
    check_session_updates(adapter, database_user).await?;
    check_delete_user_sessions(adapter, database_user).await?;
    check_delete_expired_sessions(adapter, database_user).await?;
    check_user_lifecycle(adapter).await?;
    check_reserved_attributes(adapter, database_user).await?;

    tracing::info!(user_id = %database_user.id, "Adapter conformance suite passed");
    Ok(())
}

async fn check_users<A: Adapter + ?Sized>(adapter: &A, user: &DatabaseUser) -> Result<()> {
    let step = "get_user() returns the stored user";
    let found = adapter.get_user(&user.id).await.step(step)?;
    expect_eq(step, found.as_ref(), Some(user))?;

    let step = "get_user() returns None for an unknown id";
    let found = adapter.get_user(&unique_id()).await.step(step)?;
    expect_eq(step, found, None)?;

    tracing::info!("User lookups passed");
    Ok(())
}

async fn check_session_lookups<A: Adapter + ?Sized>(
    adapter: &A,
    user: &DatabaseUser,
) -> Result<()> {
    let step = "get_session_and_user() returns (None, None) for an unknown session";
    let found = adapter
        .get_session_and_user(&unique_id())
        .await
        .step(step)?;
    expect_eq(step, found, (None, None))?;

    let step = "get_session() returns None for an unknown session";
    let found = adapter.get_session(&unique_id()).await.step(step)?;
    expect_eq(step, found, None)?;

    let session = session_for(user, Duration::hours(1)).with_attribute("country", json!("uy"));
    adapter
        .set_session(&session)
        .await
        .step("set_session() stores a session")?;

    let step = "get_session_and_user() returns the session and its user";
    let (found_session, found_user) = adapter.get_session_and_user(&session.id).await.step(step)?;
    expect_eq(step, found_session.as_ref(), Some(&session))?;
    expect_eq(
        step,
        found_user.map(|u| (u.id, u.attributes)),
        Some((user.id.clone(), user.attributes.clone())),
    )?;

    let step = "get_session() returns the stored session";
    let found = adapter.get_session(&session.id).await.step(step)?;
    expect_eq(step, found.as_ref(), Some(&session))?;

    let step = "get_user_sessions() returns the sessions of the user";
    let found = adapter.get_user_sessions(&user.id).await.step(step)?;
    expect_eq(step, found, vec![session.clone()])?;

    let step = "get_user_sessions() returns nothing for an unknown user";
    let found = adapter.get_user_sessions(&unique_id()).await.step(step)?;
    expect_eq(step, found, Vec::new())?;

    let step = "delete_session() removes the session";
    adapter.delete_session(&session.id).await.step(step)?;
    let found = adapter.get_session(&session.id).await.step(step)?;
    expect_eq(step, found, None)?;

    let step = "delete_session() ignores an unknown session";
    adapter.delete_session(&unique_id()).await.step(step)?;

    tracing::info!("Session lookups passed");
    Ok(())
}

async fn check_session_updates<A: Adapter + ?Sized>(
    adapter: &A,
    user: &DatabaseUser,
) -> Result<()> {
    let session = session_for(user, Duration::hours(1));
    adapter
        .set_session(&session)
        .await
        .step("set_session() stores a session")?;

    let step = "update_session_expiration() moves the expiration";
    let expires_at = session.expires_at + Duration::days(30);
    adapter
        .update_session_expiration(&session.id, expires_at)
        .await
        .step(step)?;
    let found = adapter.get_session(&session.id).await.step(step)?;
    expect_eq(step, found.map(|s| s.expires_at), Some(expires_at))?;

    let step = "update_session_expiration() does not create unknown sessions";
    let unknown = unique_id();
    adapter
        .update_session_expiration(&unknown, expires_at)
        .await
        .step(step)?;
    let found = adapter.get_session(&unknown).await.step(step)?;
    expect_eq(step, found, None)?;

    let step = "update_session_expiration() keeps sub-millisecond precision";
    let expires_at = with_sub_millisecond_nanos(expires_at);
    adapter
        .update_session_expiration(&session.id, expires_at)
        .await
        .step(step)?;
    let found = adapter.get_session(&session.id).await.step(step)?;
    expect_eq(step, found.map(|s| s.expires_at), Some(expires_at))?;

    adapter
        .delete_session(&session.id)
        .await
        .step("delete_session() removes the session")?;

    let step = "set_session() keeps sub-millisecond precision";
    let mut precise = session_for(user, Duration::hours(1));
    precise.expires_at = with_sub_millisecond_nanos(precise.expires_at);
    adapter.set_session(&precise).await.step(step)?;
    let found = adapter.get_session(&precise.id).await.step(step)?;
    expect_eq(step, found.as_ref(), Some(&precise))?;
    adapter.delete_session(&precise.id).await.step(step)?;

    tracing::info!("Session updates passed");
    Ok(())
}

async fn check_delete_user_sessions<A: Adapter + ?Sized>(
    adapter: &A,
    user: &DatabaseUser,
) -> Result<()> {
    let other_user = database_user();
    adapter
        .set_user(&other_user)
        .await
        .step("set_user() stores a second user")?;

    let first = session_for(user, Duration::hours(1));
    let second = session_for(user, Duration::hours(2));
    let foreign = session_for(&other_user, Duration::hours(1));
    for session in [&first, &second, &foreign] {
        adapter
            .set_session(session)
            .await
            .step("set_session() stores a session")?;
    }

    let step = "get_user_sessions() returns every session of the user";
    let found = sorted(adapter.get_user_sessions(&user.id).await.step(step)?);
    expect_eq(step, found, sorted(vec![first.clone(), second.clone()]))?;

    let step = "delete_user_sessions() removes every session of the user";
    adapter.delete_user_sessions(&user.id).await.step(step)?;
    let found = adapter.get_user_sessions(&user.id).await.step(step)?;
    expect_eq(step, found, Vec::new())?;
    for session in [&first, &second] {
        let found = adapter.get_session(&session.id).await.step(step)?;
        expect_eq(step, found, None)?;
    }

    let step = "delete_user_sessions() keeps sessions of other users";
    let found = adapter.get_user_sessions(&other_user.id).await.step(step)?;
    expect_eq(step, found, vec![foreign.clone()])?;

    adapter
        .delete_user_sessions(&other_user.id)
        .await
        .step("delete_user_sessions() cleans up")?;
    adapter
        .delete_user(&other_user.id)
        .await
        .step("delete_user() cleans up")?;

    tracing::info!("Bulk session deletion passed");
    Ok(())
}

async fn check_delete_expired_sessions<A: Adapter + ?Sized>(
    adapter: &A,
    user: &DatabaseUser,
) -> Result<()> {
    let expired = session_for(user, -Duration::hours(1));
    let live = session_for(user, Duration::hours(1));
    for session in [&expired, &live] {
        adapter
            .set_session(session)
            .await
            .step("set_session() stores a session")?;
    }

    let step = "delete_expired_sessions() removes expired sessions";
    adapter.delete_expired_sessions().await.step(step)?;
    let found = adapter.get_session(&expired.id).await.step(step)?;
    expect_eq(step, found, None)?;

    let step = "delete_expired_sessions() keeps live sessions";
    let found = adapter.get_session(&live.id).await.step(step)?;
    expect_eq(step, found.as_ref(), Some(&live))?;

    adapter
        .delete_user_sessions(&user.id)
        .await
        .step("delete_user_sessions() cleans up")?;

    tracing::info!("Expired session sweep passed");
    Ok(())
}

async fn check_user_lifecycle<A: Adapter + ?Sized>(adapter: &A) -> Result<()> {
    let user = database_user().with_attribute("age", json!(42));

    let step = "set_user() stores a user";
    adapter.set_user(&user).await.step(step)?;
    let found = adapter.get_user(&user.id).await.step(step)?;
    expect_eq(step, found.as_ref(), Some(&user))?;

    let step = "update_user() merges attributes";
    let mut changes = Attributes::new();
    changes.insert("username".to_string(), json!("renamed"));
    adapter.update_user(&user.id, &changes).await.step(step)?;
    let expected = user.clone().with_attribute("username", json!("renamed"));
    let found = adapter.get_user(&user.id).await.step(step)?;
    expect_eq(step, found.as_ref(), Some(&expected))?;

    let step = "update_user() does not create unknown users";
    let unknown = unique_id();
    adapter.update_user(&unknown, &changes).await.step(step)?;
    let found = adapter.get_user(&unknown).await.step(step)?;
    expect_eq(step, found, None)?;

    let step = "delete_user() removes the user";
    adapter.delete_user(&user.id).await.step(step)?;
    let found = adapter.get_user(&user.id).await.step(step)?;
    expect_eq(step, found, None)?;

    let step = "delete_user() ignores an unknown user";
    adapter.delete_user(&unknown).await.step(step)?;

    tracing::info!("User lifecycle passed");
    Ok(())
}

async fn check_reserved_attributes<A: Adapter + ?Sized>(
    adapter: &A,
    user: &DatabaseUser,
) -> Result<()> {
    let step = "set_user() rejects a reserved attribute name";
    let rejected = database_user().with_attribute("Gs1Pk", json!(format!("USER#{}", user.id)));
    expect_invalid_data(step, adapter.set_user(&rejected).await)?;
    let found = adapter.get_user(&rejected.id).await.step(step)?;
    expect_eq(step, found, None)?;

    let step = "update_user() rejects a reserved attribute name";
    let mut changes = Attributes::new();
    changes.insert("Pk".to_string(), json!("USER#someone-else"));
    expect_invalid_data(step, adapter.update_user(&user.id, &changes).await)?;
    let found = adapter.get_user(&user.id).await.step(step)?;
    expect_eq(step, found.as_ref(), Some(user))?;

    let step = "set_session() rejects a reserved attribute name";
    let session =
        session_for(user, Duration::hours(1)).with_attribute("UserId", json!("someone-else"));
    expect_invalid_data(step, adapter.set_session(&session).await)?;
    let found = adapter.get_session(&session.id).await.step(step)?;
    expect_eq(step, found, None)?;

    tracing::info!("Reserved attribute checks passed");
    Ok(())
}

fn unique_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn session_for(user: &DatabaseUser, expires_in: Duration) -> DatabaseSession {
    DatabaseSession::new(unique_id(), user.id.clone(), Utc::now() + expires_in)
}

/// Same second, with digits below the millisecond set.
fn with_sub_millisecond_nanos(at: DateTime<Utc>) -> DateTime<Utc> {
    at.with_nanosecond(123_456_789).unwrap_or(at)
}

fn sorted(mut sessions: Vec<DatabaseSession>) -> Vec<DatabaseSession> {
    sessions.sort_by(|a, b| a.id.cmp(&b.id));
    sessions
}

fn expect_invalid_data(step: &'static str, result: crate::adapter::Result<()>) -> Result<()> {
    match result {
        Err(AdapterError::InvalidData(_)) => Ok(()),
        Err(source) => Err(ConformanceError::Adapter { step, source }),
        Ok(()) => Err(ConformanceError::Mismatch {
            step,
            expected: "an invalid data error".to_string(),
            actual: "Ok(())".to_string(),
        }),
    }
}

fn expect_eq<T: PartialEq + Debug>(step: &'static str, actual: T, expected: T) -> Result<()> {
    if actual == expected {
        return Ok(());
    }

    Err(ConformanceError::Mismatch {
        step,
        expected: format!("{expected:?}"),
        actual: format!("{actual:?}"),
    })
}
