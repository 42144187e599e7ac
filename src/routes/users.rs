use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::operations::users::{
    delete_user, find_by_email, get_user, insert_user, list_users, update_user, NewUser, UserPatch,
    UserRecord,
};
use crate::response::json_error;
use crate::state::AppState;

const ROLES: [&str; 3] = ["student", "teacher", "admin"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(fetch).put(update).delete(remove))
}

#[derive(Serialize)]
struct UserListResponse {
    success: bool,
    total: i64,
    users: Vec<UserRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    role: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    if let Some(ref role) = query.role {
        if !ROLES.contains(&role.as_str()) {
            return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "Unknown role")
                .into_response();
        }
    }

    let Some(proxy) = state.db_proxy() else {
        return json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Service unavailable",
        )
        .into_response();
    };

    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let offset = query.offset.unwrap_or(0).max(0);

    match list_users(proxy.as_ref(), query.role.as_deref(), limit, offset).await {
        Ok((users, total)) => Json(UserListResponse {
            success: true,
            total,
            users,
        })
        .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "list users failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error",
            )
            .into_response()
        }
    }
}

#[derive(Serialize)]
struct UserResponse {
    success: bool,
    user: UserRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserPayload {
    email: String,
    username: String,
    #[serde(default)]
    role: Option<String>,
}

async fn create(State(state): State<AppState>, Json(payload): Json<CreateUserPayload>) -> Response {
    let role = payload.role.as_deref().unwrap_or("student").to_string();
    if !ROLES.contains(&role.as_str()) {
        return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "Unknown role")
            .into_response();
    }
    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "Invalid email")
            .into_response();
    }
    if payload.username.trim().is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Username is required",
        )
        .into_response();
    }

    let Some(proxy) = state.db_proxy() else {
        return json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Service unavailable",
        )
        .into_response();
    };

    match find_by_email(proxy.as_ref(), &payload.email).await {
        Ok(Some(_)) => {
            return json_error(
                StatusCode::CONFLICT,
                "CONFLICT",
                "User with this email already exists",
            )
            .into_response();
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(error = %err, "email lookup failed");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error",
            )
            .into_response();
        }
    }

    let new_user = NewUser {
        email: payload.email,
        username: payload.username,
        role,
    };

    match insert_user(proxy.as_ref(), &new_user).await {
        Ok(user) => (
            StatusCode::CREATED,
            Json(UserResponse {
                success: true,
                user,
                message: Some("User created successfully".to_string()),
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "insert user failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error",
            )
            .into_response()
        }
    }
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Service unavailable",
        )
        .into_response();
    };

    match get_user(proxy.as_ref(), &id).await {
        Ok(Some(user)) => Json(UserResponse {
            success: true,
            user,
            message: None,
        })
        .into_response(),
        Ok(None) => {
            json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "User not found").into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "get user failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error",
            )
            .into_response()
        }
    }
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<UserPatch>,
) -> Response {
    if patch.is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Nothing to update",
        )
        .into_response();
    }
    if let Some(ref email) = patch.email {
        if email.trim().is_empty() || !email.contains('@') {
            return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "Invalid email")
                .into_response();
        }
    }

    let Some(proxy) = state.db_proxy() else {
        return json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Service unavailable",
        )
        .into_response();
    };

    match update_user(proxy.as_ref(), &id, &patch).await {
        Ok(Some(user)) => Json(UserResponse {
            success: true,
            user,
            message: Some("User updated successfully".to_string()),
        })
        .into_response(),
        Ok(None) => {
            json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "User not found").into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "update user failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error",
            )
            .into_response()
        }
    }
}

#[derive(Serialize)]
struct SuccessMessageResponse {
    success: bool,
    message: String,
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Service unavailable",
        )
        .into_response();
    };

    match delete_user(proxy.as_ref(), &id).await {
        Ok(true) => Json(SuccessMessageResponse {
            success: true,
            message: "User deleted successfully".to_string(),
        })
        .into_response(),
        Ok(false) => {
            json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "User not found").into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "delete user failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error",
            )
            .into_response()
        }
    }
}
