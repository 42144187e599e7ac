use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::db::operations::users::{
    get_or_create_profile, get_user, update_profile, ProfilePatch, ProfileRecord,
};
use crate::response::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:user_id/profile", get(profile).put(update))
}

#[derive(Serialize)]
struct StudentProfileResponse {
    success: bool,
    profile: ProfileRecord,
    email: String,
    username: String,
}

async fn profile(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    let user = match get_user(proxy.as_ref(), &user_id).await {
        Ok(Some(user)) if user.role == "student" => user,
        Ok(_) => return AppError::not_found("Student not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "get student failed");
            return AppError::internal(err.to_string()).into_response();
        }
    };

    match get_or_create_profile(proxy.as_ref(), &user).await {
        Ok(profile) => Json(StudentProfileResponse {
            success: true,
            profile,
            email: user.email,
            username: user.username,
        })
        .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "student profile failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}

#[derive(Serialize)]
struct ProfileUpdatedResponse {
    success: bool,
    message: String,
    profile: ProfileRecord,
}

async fn update(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(mut patch): Json<ProfilePatch>,
) -> Response {
    // Department, position and office belong to teacher profiles only.
    patch.department = None;
    patch.position = None;
    patch.office = None;

    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    let user = match get_user(proxy.as_ref(), &user_id).await {
        Ok(Some(user)) if user.role == "student" => user,
        Ok(_) => return AppError::not_found("Student not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "get student failed");
            return AppError::internal(err.to_string()).into_response();
        }
    };

    // The profile may not exist yet for accounts that were never read.
    if let Err(err) = get_or_create_profile(proxy.as_ref(), &user).await {
        tracing::warn!(error = %err, "student profile init failed");
        return AppError::internal(err.to_string()).into_response();
    }

    match update_profile(proxy.as_ref(), &user_id, &patch).await {
        Ok(Some(profile)) => Json(ProfileUpdatedResponse {
            success: true,
            message: "Profile updated successfully".to_string(),
            profile,
        })
        .into_response(),
        Ok(None) => AppError::not_found("Profile not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "update student profile failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}
