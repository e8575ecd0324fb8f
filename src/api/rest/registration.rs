//! Registration, login and group endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{error_response, registration_error, session_error, ApiError};
use crate::api::state::AppState;
use crate::registration::{GroupLoad, RegistrationRequest, SessionToken, UserRecord};

/// Body for POST /api/login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Response for POST /api/login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    pub token: SessionToken,
    pub user: UserRecord,
}

/// Response for GET /api/groups
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupsResponse {
    pub groups: Vec<GroupLoad>,
    pub total_users: usize,
    pub total_capacity: usize,
}

/// POST /api/register - Create an account in the first group with room
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegistrationRequest>,
) -> Response {
    let store = Arc::clone(&state.registrations);

    // bcrypt is CPU bound
    match tokio::task::spawn_blocking(move || store.register(request)).await {
        Ok(Ok(user)) => (StatusCode::CREATED, Json(user)).into_response(),
        Ok(Err(e)) => {
            info!(error = %e, "registration refused");
            registration_error(e)
        }
        Err(e) => {
            warn!(error = %e, "registration task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, ApiError::internal(e.to_string()))
        }
    }
}

/// POST /api/login - Verify credentials and issue a session token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Response {
    let store = Arc::clone(&state.registrations);
    let user = match tokio::task::spawn_blocking(move || {
        store.authenticate(&request.email, &request.password)
    })
    .await
    {
        Ok(Ok(user)) => user,
        Ok(Err(e)) => return registration_error(e),
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::internal(e.to_string()),
            )
        }
    };

    match state.sessions.issue(&user) {
        Ok(token) => (StatusCode::OK, Json(LoginResponse { token, user })).into_response(),
        Err(e) => session_error(e),
    }
}

/// GET /api/me - Profile for the bearer of the session token
pub async fn me(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let claims = match state.sessions.validate_authorization(header) {
        Ok(claims) => claims,
        Err(e) => return session_error(e),
    };

    match state.registrations.get(&claims.sub) {
        Some(user) => (StatusCode::OK, Json(user)).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            ApiError::not_found(format!("User '{}' not found", claims.sub)),
        ),
    }
}

/// GET /api/groups - Per-group load
pub async fn groups(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = &state.registrations;
    Json(GroupsResponse {
        groups: store.distribution(),
        total_users: store.user_count(),
        total_capacity: store.allocator().total_capacity(),
    })
}
