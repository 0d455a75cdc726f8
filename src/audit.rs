use serde_json::Value;
use uuid::Uuid;

use crate::{
    db::DbPool,
    middleware::auth::{CallerIdentity, RequestMeta},
};

/// Append an entry to the activity trail.
///
/// Fire-and-forget: a failed write is logged server-side and never
/// propagates back to fail the triggering operation.
pub async fn log_activity(
    pool: &DbPool,
    actor: Option<&CallerIdentity>,
    meta: &RequestMeta,
    action: &str,
    entity: &str,
    entity_id: Option<Uuid>,
    target: Option<&str>,
    details: Option<Value>,
) {
    let (user_id, user_name) = match actor {
        Some(caller) => (Some(caller.user_id), caller.display_name().to_string()),
        None => (None, "System".to_string()),
    };

    let details = details.map(|v| v.to_string());

    let result = sqlx::query(
        r#"
        INSERT INTO activity_logs
            (id, user_id, user_name, action, entity, entity_id, target, details, ip, user_agent)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(user_name)
    .bind(action)
    .bind(entity)
    .bind(entity_id)
    .bind(target)
    .bind(details)
    .bind(meta.ip.as_deref())
    .bind(meta.user_agent.as_deref())
    .execute(pool)
    .await;

    if let Err(err) = result {
        tracing::warn!(error = %err, action, entity, "failed to record activity");
    }
}
