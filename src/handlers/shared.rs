use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

/// The JSON envelope every endpoint answers with.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    // 200 with data
    pub fn success(data: T) -> HttpResponse {
        HttpResponse::Ok().json(Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        })
    }

    // 201 with data
    pub fn created(data: T) -> HttpResponse {
        HttpResponse::Created().json(Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        })
    }
}

impl ApiResponse<()> {
    pub fn success_message(message: &str) -> HttpResponse {
        HttpResponse::Ok().json(Self {
            success: true,
            data: None,
            message: Some(message.to_string()),
            error: None,
        })
    }
}

impl ApiResponse<serde_json::Value> {
    // Error body; `data` carries the conflicting record when there is one
    pub fn error(kind: &str, message: &str, data: Option<serde_json::Value>) -> Self {
        Self {
            success: false,
            data,
            message: Some(message.to_string()),
            error: Some(kind.to_string()),
        }
    }
}
