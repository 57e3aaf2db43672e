use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::models::{ActivityLog, CreateActivityInput};
use crate::error::AppError;

#[derive(Clone)]
pub struct ActivityRepository {
    pool: SqlitePool,
}

impl ActivityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn log_activity(&self, request: CreateActivityInput) -> Result<ActivityLog, AppError> {
        let metadata_json = request
            .metadata
            .and_then(|m| serde_json::to_string(&m).ok());

        let activity = sqlx::query_as::<_, ActivityLog>(
            r#"
            INSERT INTO
                activity_logs (
                    id,
                    actor_user_id,
                    entity_type,
                    entity_id,
                    action,
                    description,
                    metadata,
                    ip_address,
                    user_agent,
                    created_at
                )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id,
                actor_user_id,
                entity_type,
                entity_id,
                action,
                description,
                metadata,
                ip_address,
                user_agent,
                created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.actor_user_id)
        .bind(request.entity_type)
        .bind(request.entity_id)
        .bind(request.action)
        .bind(request.description)
        .bind(metadata_json)
        .bind(request.ip_address)
        .bind(request.user_agent)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(activity)
    }

    /// History of one entity, oldest first.
    pub async fn find_for_entity(
        &self,
        entity_type: &str,
        entity_id: Uuid,
    ) -> Result<Vec<ActivityLog>, AppError> {
        let activities = sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT
                id,
                actor_user_id,
                entity_type,
                entity_id,
                action,
                description,
                metadata,
                ip_address,
                user_agent,
                created_at
            FROM activity_logs
            WHERE entity_type = ? AND entity_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }
}
