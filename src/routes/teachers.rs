use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::db::operations::courses::list_by_teacher;
use crate::db::operations::users::{
    get_or_create_profile, get_user, update_profile, ProfilePatch, ProfileRecord,
};
use crate::response::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:user_id/profile", get(profile).put(update))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TeacherCourseSummary {
    course_id: String,
    course_name: String,
    course_code: String,
    status: String,
}

#[derive(Serialize)]
struct TeacherProfileResponse {
    success: bool,
    profile: ProfileRecord,
    courses: Vec<TeacherCourseSummary>,
    email: String,
    username: String,
}

async fn profile(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    let user = match get_user(proxy.as_ref(), &user_id).await {
        Ok(Some(user)) if user.role == "teacher" => user,
        Ok(_) => return AppError::not_found("Teacher not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "get teacher failed");
            return AppError::internal(err.to_string()).into_response();
        }
    };

    let profile = match get_or_create_profile(proxy.as_ref(), &user).await {
        Ok(profile) => profile,
        Err(err) => {
            tracing::warn!(error = %err, "teacher profile failed");
            return AppError::internal(err.to_string()).into_response();
        }
    };

    let courses = match list_by_teacher(proxy.as_ref(), &user_id).await {
        Ok(courses) => courses
            .into_iter()
            .map(|course| TeacherCourseSummary {
                course_id: course.id,
                course_name: course.course_name,
                course_code: course.course_code,
                status: course.enrollment_status,
            })
            .collect(),
        Err(err) => {
            tracing::warn!(error = %err, "teacher courses failed");
            return AppError::internal(err.to_string()).into_response();
        }
    };

    Json(TeacherProfileResponse {
        success: true,
        profile,
        courses,
        email: user.email,
        username: user.username,
    })
    .into_response()
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
    Json(patch): Json<ProfilePatch>,
) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    let user = match get_user(proxy.as_ref(), &user_id).await {
        Ok(Some(user)) if user.role == "teacher" => user,
        Ok(_) => return AppError::not_found("Teacher not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "get teacher failed");
            return AppError::internal(err.to_string()).into_response();
        }
    };

    if let Err(err) = get_or_create_profile(proxy.as_ref(), &user).await {
        tracing::warn!(error = %err, "teacher profile init failed");
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
            tracing::warn!(error = %err, "update teacher profile failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}
