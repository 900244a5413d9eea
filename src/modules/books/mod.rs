pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use atlas_authz::Authenticated;
use atlas_http::{ApiResponse, AppError, JsonBody, QueryParams};
use atlas_kernel::{InitCtx, Module};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use serde_json::json;

use crate::state::AppState;
use models::{Book, BookDetail, BookPatch, BookSummary, CreateBook, ListBooksQuery};

/// Catalogue of books. Reads and mutations of existing books require a
/// bearer token; only the owner may change or delete a book.
pub struct BooksModule {
    state: AppState,
}

impl BooksModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    fn prefix(&self) -> &'static str {
        "/books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", post(create_book).get(list_books))
            .route(
                "/{book_id}",
                get(get_book).put(update_book).delete(delete_book),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        });
        let book_id = json!({
            "name": "book_id",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        });

        Some(json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateBook" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Book created",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "400": { "description": "Invalid input, bad date or duplicate title/ISBN", "content": error }
                        }
                    },
                    "get": {
                        "summary": "List live books ordered by title",
                        "tags": ["Books"],
                        "security": [{ "bearerAuth": [] }],
                        "parameters": [
                            { "name": "userId", "in": "query", "schema": { "type": "string" } },
                            { "name": "category", "in": "query", "schema": { "type": "string" } },
                            { "name": "subcategory", "in": "query", "schema": { "type": "string" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "Books List.",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/BookSummary" }
                                        }
                                    }
                                }
                            },
                            "400": { "description": "Malformed user id", "content": error },
                            "401": { "description": "Missing or invalid token", "content": error },
                            "404": { "description": "No matching books", "content": error }
                        }
                    }
                },
                "/{book_id}": {
                    "get": {
                        "summary": "Book with its reviews",
                        "tags": ["Books"],
                        "security": [{ "bearerAuth": [] }],
                        "parameters": [book_id],
                        "responses": {
                            "200": {
                                "description": "Book Details",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/BookDetail" }
                                    }
                                }
                            },
                            "400": { "description": "Malformed book id", "content": error },
                            "401": { "description": "Missing or invalid token", "content": error },
                            "404": { "description": "Book missing or deleted", "content": error }
                        }
                    },
                    "put": {
                        "summary": "Update title, excerpt, ISBN or release date",
                        "tags": ["Books"],
                        "security": [{ "bearerAuth": [] }],
                        "parameters": [book_id],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookPatch" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Book updated",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "400": { "description": "Invalid input or duplicate title/ISBN", "content": error },
                            "401": { "description": "Missing or invalid token", "content": error },
                            "403": { "description": "Caller does not own the book", "content": error },
                            "404": { "description": "Book missing or deleted", "content": error }
                        }
                    },
                    "delete": {
                        "summary": "Soft-delete a book and its reviews",
                        "tags": ["Books"],
                        "security": [{ "bearerAuth": [] }],
                        "parameters": [book_id],
                        "responses": {
                            "200": { "description": "Successfully Deleted." },
                            "401": { "description": "Missing or invalid token", "content": error },
                            "403": { "description": "Caller does not own the book", "content": error },
                            "404": { "description": "Book already deleted", "content": error }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "title": { "type": "string" },
                            "excerpt": { "type": "string" },
                            "ISBN": { "type": "string", "pattern": "^[0-9]{13}$" },
                            "category": { "type": "string" },
                            "subcategory": { "type": "string" },
                            "releasedAt": { "type": "string", "format": "date" },
                            "userId": { "type": "string" },
                            "reviewCount": { "type": "integer" },
                            "isDeleted": { "type": "boolean" },
                            "deletedAt": { "type": ["string", "null"], "format": "date-time" },
                            "createdAt": { "type": "string", "format": "date-time" },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        }
                    },
                    "BookSummary": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "title": { "type": "string" },
                            "excerpt": { "type": "string" },
                            "userId": { "type": "string" },
                            "category": { "type": "string" },
                            "releasedAt": { "type": "string", "format": "date" },
                            "reviewCount": { "type": "integer" }
                        }
                    },
                    "BookDetail": {
                        "allOf": [
                            { "$ref": "#/components/schemas/Book" },
                            {
                                "type": "object",
                                "properties": {
                                    "reviews": { "type": "integer" },
                                    "reviewsData": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Review" }
                                    }
                                }
                            }
                        ]
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "excerpt": { "type": "string" },
                            "ISBN": { "type": "string" },
                            "category": { "type": "string" },
                            "subcategory": { "type": "string" },
                            "releasedAt": { "type": "string", "format": "date" },
                            "userId": { "type": "string" }
                        },
                        "required": ["title", "excerpt", "ISBN", "category", "subcategory", "releasedAt", "userId"]
                    },
                    "BookPatch": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "excerpt": { "type": "string" },
                            "ISBN": { "type": "string" },
                            "releasedAt": { "type": "string", "format": "date" }
                        }
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

async fn create_book(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateBook>,
) -> Result<ApiResponse<Book>, AppError> {
    let book = state.rules.create_book(payload).await?;
    Ok(ApiResponse::created("Success", book))
}

async fn list_books(
    _caller: Authenticated,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListBooksQuery>,
) -> Result<ApiResponse<Vec<BookSummary>>, AppError> {
    let books = state.rules.list_books(query).await?;
    Ok(ApiResponse::ok("Books List.", books))
}

async fn get_book(
    _caller: Authenticated,
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> Result<ApiResponse<BookDetail>, AppError> {
    let detail = state.rules.get_book_detail(&book_id).await?;
    Ok(ApiResponse::ok("Book Details", detail))
}

async fn update_book(
    caller: Authenticated,
    State(state): State<AppState>,
    Path(book_id): Path<String>,
    JsonBody(patch): JsonBody<BookPatch>,
) -> Result<ApiResponse<Book>, AppError> {
    let book = state
        .rules
        .update_book(&book_id, patch, &caller.user_id)
        .await?;
    Ok(ApiResponse::ok("Success", book))
}

async fn delete_book(
    caller: Authenticated,
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    state.rules.delete_book(&book_id, &caller.user_id).await?;
    Ok(ApiResponse::message("Successfully Deleted."))
}

pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(state))
}
