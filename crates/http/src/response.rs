//! Success envelope shared by ATLAS handlers.

use axum::{
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Envelope<T> {
    status: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

/// `{ "status": true, "message": ..., "data": ... }` with a chosen status code.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    message: String,
    data: Option<T>,
    headers: HeaderMap,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with data
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::OK, message, Some(data))
    }

    /// 201 with data
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::CREATED, message, Some(data))
    }

    fn with_status(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status,
            message: message.into(),
            data,
            headers: HeaderMap::new(),
        }
    }

    /// Attach a response header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

impl ApiResponse<()> {
    /// 200 carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, message, None)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let envelope = Envelope {
            status: true,
            message: self.message,
            data: self.data,
        };
        (self.status, self.headers, Json(envelope)).into_response()
    }
}
