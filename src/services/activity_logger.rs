use crate::database::models::{CreateActivityInput, EntityType};
use crate::database::repositories::ActivityRepository;
use crate::error::AppError;
use crate::middleware::RequestIdExt;
use actix_web::HttpRequest;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone)]
pub struct ActivityLogger {
    repository: ActivityRepository,
}

impl ActivityLogger {
    pub fn new(repository: ActivityRepository) -> Self {
        Self { repository }
    }

    /// Extract client info from HTTP request
    fn extract_client_info(&self, req: &HttpRequest) -> (Option<String>, Option<String>) {
        let ip_address = req.connection_info().peer_addr().map(|addr| {
            // Remove port if present
            addr.rsplit_once(':')
                .map_or(addr, |(host, _)| host)
                .to_string()
        });

        let user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        (ip_address, user_agent)
    }

    #[allow(clippy::too_many_arguments)]
    async fn log_activity(
        &self,
        actor_user_id: Uuid,
        entity_type: &str,
        entity_id: Uuid,
        action: &str,
        description: String,
        metadata: Option<HashMap<String, serde_json::Value>>,
        req: &HttpRequest,
    ) -> Result<(), AppError> {
        let (ip_address, user_agent) = self.extract_client_info(req);

        let metadata = match req.correlation_id() {
            Some(id) => {
                let mut metadata = metadata.unwrap_or_default();
                metadata.insert(
                    "correlation_id".to_string(),
                    serde_json::Value::String(id),
                );
                Some(metadata)
            }
            None => metadata,
        };

        let request = CreateActivityInput {
            actor_user_id: Some(actor_user_id),
            entity_type: entity_type.to_string(),
            entity_id,
            action: action.to_string(),
            description,
            metadata,
            ip_address,
            user_agent,
        };

        self.repository.log_activity(request).await?;
        Ok(())
    }

    /// Log leave review and cancellation activity
    pub async fn log_leave_activity(
        &self,
        actor_user_id: Uuid,
        leave_request_id: Uuid,
        action: &str,
        description: String,
        metadata: Option<HashMap<String, serde_json::Value>>,
        req: &HttpRequest,
    ) -> Result<(), AppError> {
        self.log_activity(
            actor_user_id,
            EntityType::LEAVE_REQUEST,
            leave_request_id,
            action,
            description,
            metadata,
            req,
        )
        .await
    }

    /// Log manual attendance entries and deletions
    pub async fn log_attendance_activity(
        &self,
        actor_user_id: Uuid,
        attendance_id: Uuid,
        action: &str,
        description: String,
        metadata: Option<HashMap<String, serde_json::Value>>,
        req: &HttpRequest,
    ) -> Result<(), AppError> {
        self.log_activity(
            actor_user_id,
            EntityType::ATTENDANCE,
            attendance_id,
            action,
            description,
            metadata,
            req,
        )
        .await
    }

    /// Log employee management activity
    pub async fn log_employee_activity(
        &self,
        actor_user_id: Uuid,
        employee_id: Uuid,
        action: &str,
        description: String,
        metadata: Option<HashMap<String, serde_json::Value>>,
        req: &HttpRequest,
    ) -> Result<(), AppError> {
        self.log_activity(
            actor_user_id,
            EntityType::EMPLOYEE,
            employee_id,
            action,
            description,
            metadata,
            req,
        )
        .await
    }

    pub fn metadata(pairs: Vec<(&str, String)>) -> HashMap<String, serde_json::Value> {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v)))
            .collect()
    }
}
