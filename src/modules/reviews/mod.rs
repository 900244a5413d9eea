pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use atlas_http::{ApiResponse, AppError, JsonBody};
use atlas_kernel::{InitCtx, Module};
use axum::{
    extract::{Path, State},
    routing::{post, put},
    Router,
};
use serde_json::json;

use crate::state::AppState;
use models::{Review, ReviewInput};

/// Reviews nested under a book. Open to anonymous callers.
pub struct ReviewsModule {
    state: AppState,
}

impl ReviewsModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for ReviewsModule {
    fn name(&self) -> &'static str {
        "reviews"
    }

    fn prefix(&self) -> &'static str {
        "/books/{book_id}/review"
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", post(create_review))
            .route("/{review_id}", put(update_review).delete(delete_review))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        });
        let review = json!({
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Review" }
            }
        });
        let input = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ReviewInput" }
                }
            }
        });
        let book_id = json!({ "name": "book_id", "in": "path", "required": true, "schema": { "type": "string" } });
        let review_id = json!({ "name": "review_id", "in": "path", "required": true, "schema": { "type": "string" } });

        Some(json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Review a book",
                        "tags": ["Reviews"],
                        "parameters": [book_id],
                        "requestBody": input,
                        "responses": {
                            "201": { "description": "Review created", "content": review },
                            "400": { "description": "Invalid book id, rating or review", "content": error },
                            "404": { "description": "Book missing or deleted", "content": error }
                        }
                    }
                },
                "/{review_id}": {
                    "put": {
                        "summary": "Update a review",
                        "tags": ["Reviews"],
                        "parameters": [book_id, review_id],
                        "requestBody": input,
                        "responses": {
                            "200": { "description": "Review updated", "content": review },
                            "400": { "description": "Invalid ids, input, or review of another book", "content": error },
                            "404": { "description": "Book or review missing or deleted", "content": error }
                        }
                    },
                    "delete": {
                        "summary": "Soft-delete a review",
                        "tags": ["Reviews"],
                        "parameters": [book_id, review_id],
                        "responses": {
                            "200": { "description": "Successfully Deleted." },
                            "400": { "description": "Invalid ids or review of another book", "content": error },
                            "404": { "description": "Book or review missing or deleted", "content": error }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Review": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "bookId": { "type": "string" },
                            "reviewedBy": { "type": "string" },
                            "reviewedAt": { "type": "string", "format": "date-time" },
                            "rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                            "review": { "type": "string" }
                        }
                    },
                    "ReviewInput": {
                        "type": "object",
                        "properties": {
                            "reviewedBy": { "type": "string", "default": "Guest" },
                            "rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                            "review": { "type": "string" }
                        }
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "reviews module stopped");
        Ok(())
    }
}

async fn create_review(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
    JsonBody(input): JsonBody<ReviewInput>,
) -> Result<ApiResponse<Review>, AppError> {
    let review = state.rules.create_review(&book_id, input).await?;
    Ok(ApiResponse::created("Success", review))
}

async fn update_review(
    State(state): State<AppState>,
    Path((book_id, review_id)): Path<(String, String)>,
    JsonBody(input): JsonBody<ReviewInput>,
) -> Result<ApiResponse<Review>, AppError> {
    let review = state
        .rules
        .update_review(&book_id, &review_id, input)
        .await?;
    Ok(ApiResponse::ok("Success", review))
}

async fn delete_review(
    State(state): State<AppState>,
    Path((book_id, review_id)): Path<(String, String)>,
) -> Result<ApiResponse<()>, AppError> {
    state.rules.delete_review(&book_id, &review_id).await?;
    Ok(ApiResponse::message("Successfully Deleted."))
}

pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(ReviewsModule::new(state))
}
