use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::database::Page;

/// Wrapper for API responses that automatically adds success envelope:
/// `{"success": true, "data": ..., "message"?: ..., "meta"?: ...}`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
    pub message: Option<String>,
    pub meta: Option<Value>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: None,
            message: None,
            meta: None,
        }
    }

    /// Create an API response with custom status code
    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self {
            status_code: Some(status_code),
            ..Self::success(data)
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<Value> {
    /// 200 with no data, only a message (deletes, logout)
    pub fn message_only(message: impl Into<String>) -> Self {
        Self::success(Value::Null).message(message)
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// List response carrying pagination meta
    pub fn paginated(page: Page<T>) -> Self {
        let meta = json!({
            "current_page": page.current_page,
            "per_page": page.per_page,
            "total": page.total,
            "last_page": page.last_page,
        });
        Self {
            meta: Some(meta),
            ..Self::success(page.items)
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        // Convert data to JSON Value for consistent envelope format
        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": "Failed to serialize response data"
                    })),
                )
                    .into_response();
            }
        };

        let mut envelope = json!({
            "success": true,
            "data": data_value
        });
        if let Some(message) = self.message {
            envelope["message"] = json!(message);
        }
        if let Some(meta) = self.meta {
            envelope["meta"] = meta;
        }

        (status, Json(envelope)).into_response()
    }
}

// Convenience type alias
pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::PageRequest;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn created_with_message() {
        let response = ApiResponse::created(json!({"id": 1}))
            .message("Lease created successfully")
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], 1);
        assert_eq!(body["message"], "Lease created successfully");
        assert!(body.get("meta").is_none());
    }

    #[tokio::test]
    async fn paginated_carries_meta() {
        let page = Page::new(vec![json!({"id": 1})], PageRequest::new(2, 1), 3);
        let body = body_json(ApiResponse::paginated(page).into_response()).await;

        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["meta"]["current_page"], 2);
        assert_eq!(body["meta"]["per_page"], 1);
        assert_eq!(body["meta"]["total"], 3);
        assert_eq!(body["meta"]["last_page"], 3);
    }

    #[tokio::test]
    async fn message_only_has_null_data() {
        let body = body_json(ApiResponse::message_only("Unit deleted successfully").into_response()).await;
        assert!(body["data"].is_null());
        assert_eq!(body["message"], "Unit deleted successfully");
    }
}
