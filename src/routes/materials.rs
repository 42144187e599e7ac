use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::operations::courses::{get_course, get_module};
use crate::db::operations::materials::{
    delete_material, fetch_and_touch, get_material, insert_material, list_for_course,
    MaterialRecord, NewMaterial,
};
use crate::db::operations::users::get_user;
use crate::response::{json_error, AppError};
use crate::state::AppState;

const MATERIAL_KINDS: [&str; 3] = ["document", "video", "link"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/course/:course_id", get(for_course))
        .route("/:id", get(fetch).delete(remove))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMaterialPayload {
    title: String,
    kind: String,
    course_id: String,
    #[serde(default)]
    module_id: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    duration: Option<String>,
    uploaded_by: String,
}

#[derive(Serialize)]
struct MaterialResponse {
    success: bool,
    material: MaterialRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateMaterialPayload>,
) -> Response {
    if !MATERIAL_KINDS.contains(&payload.kind.as_str()) {
        return json_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Invalid material kind. Must be document, video, or link",
        )
        .into_response();
    }
    if payload.kind == "link" && payload.url.as_deref().unwrap_or("").trim().is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "URL is required for link materials",
        )
        .into_response();
    }
    if payload.title.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "Title is required")
            .into_response();
    }

    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    match get_course(proxy.as_ref(), &payload.course_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return AppError::not_found("Course not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "get course failed");
            return AppError::internal(err.to_string()).into_response();
        }
    }

    if let Some(ref module_id) = payload.module_id {
        match get_module(proxy.as_ref(), &payload.course_id, module_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return AppError::not_found("Module not found or doesn't belong to this course")
                    .into_response();
            }
            Err(err) => {
                tracing::warn!(error = %err, "get module failed");
                return AppError::internal(err.to_string()).into_response();
            }
        }
    }

    match get_user(proxy.as_ref(), &payload.uploaded_by).await {
        Ok(Some(_)) => {}
        Ok(None) => return AppError::not_found("Uploader not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "uploader lookup failed");
            return AppError::internal(err.to_string()).into_response();
        }
    }

    let material = NewMaterial {
        course_id: payload.course_id,
        module_id: payload.module_id,
        title: payload.title,
        kind: payload.kind,
        description: payload.description,
        url: payload.url,
        format: payload.format,
        size: payload.size,
        duration: payload.duration,
        uploaded_by: payload.uploaded_by,
    };

    match insert_material(proxy.as_ref(), &material).await {
        Ok(material) => (
            StatusCode::CREATED,
            Json(MaterialResponse {
                success: true,
                material,
                message: Some("Material registered successfully".to_string()),
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "insert material failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}

#[derive(Serialize)]
struct MaterialListResponse {
    success: bool,
    materials: Vec<MaterialRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForCourseQuery {
    module_id: Option<String>,
}

async fn for_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Query(query): Query<ForCourseQuery>,
) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    match get_course(proxy.as_ref(), &course_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return AppError::not_found("Course not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "get course failed");
            return AppError::internal(err.to_string()).into_response();
        }
    }

    match list_for_course(proxy.as_ref(), &course_id, query.module_id.as_deref()).await {
        Ok(materials) => Json(MaterialListResponse {
            success: true,
            materials,
        })
        .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "list materials failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    // Every fetch counts as an access, like the original's student reads.
    match fetch_and_touch(proxy.as_ref(), &id).await {
        Ok(Some(material)) => Json(MaterialResponse {
            success: true,
            material,
            message: None,
        })
        .into_response(),
        Ok(None) => AppError::not_found("Material not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "get material failed");
            AppError::internal(err.to_string()).into_response()
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
        return AppError::unavailable("Service unavailable").into_response();
    };

    match get_material(proxy.as_ref(), &id).await {
        Ok(Some(_)) => {}
        Ok(None) => return AppError::not_found("Material not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "get material failed");
            return AppError::internal(err.to_string()).into_response();
        }
    }

    match delete_material(proxy.as_ref(), &id).await {
        Ok(true) => Json(SuccessMessageResponse {
            success: true,
            message: "Material deleted successfully".to_string(),
        })
        .into_response(),
        Ok(false) => AppError::not_found("Material not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "delete material failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}
