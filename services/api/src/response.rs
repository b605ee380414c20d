//! Uniform success envelope returned by every handler

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Success envelope: `{ "status", "data", "message" }`
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: u16,
    pub data: T,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            data,
            message: message.into(),
        }
    }

    /// 200 envelope
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, data, message)
    }

    /// 201 envelope
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CREATED, data, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json, to_value};

    #[test]
    fn envelope_carries_status_data_and_message() {
        let envelope = ApiResponse::ok(json!({ "liked": true }), "Operation successful");
        let value: Value = to_value(&envelope).unwrap();

        assert_eq!(value["status"], 200);
        assert_eq!(value["data"]["liked"], true);
        assert_eq!(value["message"], "Operation successful");
    }

    #[test]
    fn created_envelope_uses_201() {
        let envelope = ApiResponse::created(json!(null), "Created");
        assert_eq!(envelope.status, 201);
    }
}
