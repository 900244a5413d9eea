pub mod models;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use atlas_authz::guard::API_KEY_HEADER;
use atlas_http::{ApiResponse, AppError, JsonBody};
use atlas_kernel::{InitCtx, Module};
use axum::{
    extract::State,
    http::{HeaderName, HeaderValue},
    routing::post,
    Router,
};
use serde_json::json;

use crate::state::AppState;
use models::{LoginRequest, LoginToken, RegisterUser, User};

/// Registration and login.
pub struct UsersModule {
    state: AppState,
}

impl UsersModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/register": {
                    "post": {
                        "summary": "Register a user",
                        "tags": ["Users"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/RegisterUser" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "User created",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/User" }
                                    }
                                }
                            },
                            "400": {
                                "description": "Invalid input or phone/email already registered",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/login": {
                    "post": {
                        "summary": "Log in and receive a bearer token",
                        "tags": ["Users"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/LoginRequest" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Token issued; also returned in the x-api-key header",
                                "headers": {
                                    "x-api-key": { "schema": { "type": "string" } }
                                },
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": { "token": { "type": "string" } }
                                        }
                                    }
                                }
                            },
                            "400": {
                                "description": "Missing email or password",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            },
                            "404": {
                                "description": "No user with these credentials",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Address": {
                        "type": "object",
                        "properties": {
                            "street": { "type": "string" },
                            "city": { "type": "string" },
                            "pincode": { "type": "string", "pattern": "^[1-9][0-9]{5}$" }
                        },
                        "required": ["street", "city", "pincode"]
                    },
                    "User": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "title": { "type": "string", "enum": ["Mr", "Mrs", "Miss"] },
                            "name": { "type": "string" },
                            "phone": { "type": "string" },
                            "email": { "type": "string" },
                            "address": { "$ref": "#/components/schemas/Address" },
                            "createdAt": { "type": "string", "format": "date-time" },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "title", "name", "phone", "email", "createdAt", "updatedAt"]
                    },
                    "RegisterUser": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "enum": ["Mr", "Mrs", "Miss"] },
                            "name": { "type": "string" },
                            "phone": { "type": "string", "pattern": "^[0-9]{10}$" },
                            "email": { "type": "string" },
                            "password": { "type": "string", "minLength": 6, "maxLength": 15 },
                            "address": { "$ref": "#/components/schemas/Address" }
                        },
                        "required": ["title", "name", "phone", "email", "password"]
                    },
                    "LoginRequest": {
                        "type": "object",
                        "properties": {
                            "email": { "type": "string" },
                            "password": { "type": "string" }
                        },
                        "required": ["email", "password"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module stopped");
        Ok(())
    }
}

async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterUser>,
) -> Result<ApiResponse<User>, AppError> {
    let user = state.rules.create_user(payload).await?;
    Ok(ApiResponse::created("Success", user))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<ApiResponse<LoginToken>, AppError> {
    let login = state.rules.authenticate_user(request).await?;
    let api_key =
        HeaderValue::from_str(&login.token).context("issued token is not a valid header value")?;

    Ok(ApiResponse::ok("Success", login).header(HeaderName::from_static(API_KEY_HEADER), api_key))
}

pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(UsersModule::new(state))
}
