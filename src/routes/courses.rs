use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::operations::courses::{
    delete_lesson, find_by_code, get_course, get_lesson, get_module, insert_course, insert_lesson,
    insert_module, list_by_teacher, list_courses, list_lessons, list_modules, update_course,
    CoursePatch, CourseRecord, LessonRecord, ModuleRecord, NewCourse, NewLesson,
};
use crate::db::operations::materials::list_for_course as list_course_materials;
use crate::db::operations::materials::MaterialRecord;
use crate::db::operations::users::get_user;
use crate::response::{json_error, AppError};
use crate::state::AppState;

const DIFFICULTIES: [&str; 3] = ["beginner", "intermediate", "advanced"];
const ENROLLMENT_STATUSES: [&str; 2] = ["Open", "Closed"];
const LESSON_MATERIAL_KINDS: [&str; 4] = ["video", "pdf", "file", "link"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(catalog))
        .route("/teacher/:teacher_id", get(by_teacher))
        .route("/:id", get(detail).put(update))
        .route("/:id/modules", post(create_module).get(modules))
        .route("/:id/modules/:module_id/lessons", post(create_lesson))
        .route(
            "/:id/modules/:module_id/lessons/:lesson_id",
            delete(remove_lesson),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCoursePayload {
    course_name: String,
    course_code: String,
    description: String,
    category: String,
    duration_weeks: i32,
    price: f64,
    max_students: i32,
    #[serde(default)]
    difficulty: Option<String>,
    instructor_name: String,
    teacher_id: String,
}

#[derive(Serialize)]
struct CourseResponse {
    success: bool,
    course: CourseRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateCoursePayload>,
) -> Response {
    let difficulty = payload
        .difficulty
        .as_deref()
        .unwrap_or("beginner")
        .to_string();
    if !DIFFICULTIES.contains(&difficulty.as_str()) {
        return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "Unknown difficulty")
            .into_response();
    }
    if payload.course_name.trim().is_empty() || payload.course_code.trim().is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Course name and code are required",
        )
        .into_response();
    }
    if payload.duration_weeks <= 0 || payload.max_students <= 0 || payload.price < 0.0 {
        return json_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Duration, capacity and price must be positive",
        )
        .into_response();
    }

    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    match get_user(proxy.as_ref(), &payload.teacher_id).await {
        Ok(Some(user)) if user.role == "teacher" => {}
        Ok(_) => return AppError::not_found("Teacher not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "teacher lookup failed");
            return AppError::internal(err.to_string()).into_response();
        }
    }

    match find_by_code(proxy.as_ref(), &payload.course_code).await {
        Ok(Some(_)) => {
            return AppError::conflict("Course with this code already exists").into_response();
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(error = %err, "course code lookup failed");
            return AppError::internal(err.to_string()).into_response();
        }
    }

    let new_course = NewCourse {
        course_name: payload.course_name,
        course_code: payload.course_code,
        description: payload.description,
        category: payload.category,
        duration_weeks: payload.duration_weeks,
        price: payload.price,
        max_students: payload.max_students,
        difficulty,
        instructor_name: payload.instructor_name,
        teacher_id: payload.teacher_id,
    };

    match insert_course(proxy.as_ref(), &new_course).await {
        Ok(course) => (
            StatusCode::CREATED,
            Json(CourseResponse {
                success: true,
                course,
                message: Some("Course created successfully".to_string()),
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "insert course failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}

#[derive(Serialize)]
struct CourseListResponse {
    success: bool,
    courses: Vec<CourseRecord>,
}

#[derive(Deserialize)]
struct CatalogQuery {
    status: Option<String>,
}

async fn catalog(State(state): State<AppState>, Query(query): Query<CatalogQuery>) -> Response {
    if let Some(ref status) = query.status {
        if !ENROLLMENT_STATUSES.contains(&status.as_str()) {
            return json_error(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Unknown enrollment status",
            )
            .into_response();
        }
    }

    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    match list_courses(proxy.as_ref(), query.status.as_deref()).await {
        Ok(courses) => Json(CourseListResponse {
            success: true,
            courses,
        })
        .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "list courses failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}

async fn by_teacher(State(state): State<AppState>, Path(teacher_id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    match list_by_teacher(proxy.as_ref(), &teacher_id).await {
        Ok(courses) => Json(CourseListResponse {
            success: true,
            courses,
        })
        .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "list teacher courses failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModuleWithLessons {
    #[serde(flatten)]
    module: ModuleRecord,
    lessons: Vec<LessonRecord>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CourseDetail {
    #[serde(flatten)]
    course: CourseRecord,
    modules: Vec<ModuleWithLessons>,
    materials: Vec<MaterialRecord>,
}

#[derive(Serialize)]
struct CourseDetailResponse {
    success: bool,
    course: CourseDetail,
}

async fn detail(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    let course = match get_course(proxy.as_ref(), &id).await {
        Ok(Some(course)) => course,
        Ok(None) => return AppError::not_found("Course not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "get course failed");
            return AppError::internal(err.to_string()).into_response();
        }
    };

    let modules = match assemble_modules(proxy.as_ref(), &id).await {
        Ok(modules) => modules,
        Err(err) => {
            tracing::warn!(error = %err, "course modules failed");
            return AppError::internal(err.to_string()).into_response();
        }
    };

    let materials = match list_course_materials(proxy.as_ref(), &id, None).await {
        Ok(materials) => materials,
        Err(err) => {
            tracing::warn!(error = %err, "course materials failed");
            return AppError::internal(err.to_string()).into_response();
        }
    };

    Json(CourseDetailResponse {
        success: true,
        course: CourseDetail {
            course,
            modules,
            materials,
        },
    })
    .into_response()
}

async fn assemble_modules(
    proxy: &crate::db::DatabaseProxy,
    course_id: &str,
) -> Result<Vec<ModuleWithLessons>, sqlx::Error> {
    let mut out = Vec::new();
    for module in list_modules(proxy, course_id).await? {
        let lessons = list_lessons(proxy, &module.id).await?;
        out.push(ModuleWithLessons { module, lessons });
    }
    Ok(out)
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<CoursePatch>,
) -> Response {
    if let Some(ref difficulty) = patch.difficulty {
        if !DIFFICULTIES.contains(&difficulty.as_str()) {
            return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "Unknown difficulty")
                .into_response();
        }
    }
    if let Some(ref status) = patch.enrollment_status {
        if !ENROLLMENT_STATUSES.contains(&status.as_str()) {
            return json_error(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Unknown enrollment status",
            )
            .into_response();
        }
    }

    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    if let Some(ref code) = patch.course_code {
        match find_by_code(proxy.as_ref(), code).await {
            Ok(Some(other)) if other.id != id => {
                return AppError::conflict("Course with this code already exists").into_response();
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "course code lookup failed");
                return AppError::internal(err.to_string()).into_response();
            }
        }
    }

    match update_course(proxy.as_ref(), &id, &patch).await {
        Ok(Some(course)) => Json(CourseResponse {
            success: true,
            course,
            message: Some("Course updated successfully".to_string()),
        })
        .into_response(),
        Ok(None) => AppError::not_found("Course not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "update course failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateModulePayload {
    title: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Serialize)]
struct ModuleResponse {
    success: bool,
    message: String,
    module: ModuleWithLessons,
}

async fn create_module(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CreateModulePayload>,
) -> Response {
    if payload.title.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "Title is required")
            .into_response();
    }

    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    match get_course(proxy.as_ref(), &id).await {
        Ok(Some(_)) => {}
        Ok(None) => return AppError::not_found("Course not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "get course failed");
            return AppError::internal(err.to_string()).into_response();
        }
    }

    match insert_module(proxy.as_ref(), &id, &payload.title, payload.description.as_deref()).await
    {
        Ok(module) => (
            StatusCode::CREATED,
            Json(ModuleResponse {
                success: true,
                message: "Module created successfully".to_string(),
                module: ModuleWithLessons {
                    module,
                    lessons: Vec::new(),
                },
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "insert module failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}

#[derive(Serialize)]
struct ModuleListResponse {
    success: bool,
    modules: Vec<ModuleWithLessons>,
}

async fn modules(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    match get_course(proxy.as_ref(), &id).await {
        Ok(Some(_)) => {}
        Ok(None) => return AppError::not_found("Course not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "get course failed");
            return AppError::internal(err.to_string()).into_response();
        }
    }

    match assemble_modules(proxy.as_ref(), &id).await {
        Ok(modules) => Json(ModuleListResponse {
            success: true,
            modules,
        })
        .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "course modules failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateLessonPayload {
    title: String,
    duration: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    material_kind: Option<String>,
    #[serde(default)]
    material_url: Option<String>,
}

#[derive(Serialize)]
struct LessonResponse {
    success: bool,
    message: String,
    lesson: LessonRecord,
}

async fn create_lesson(
    State(state): State<AppState>,
    Path((id, module_id)): Path<(String, String)>,
    Json(payload): Json<CreateLessonPayload>,
) -> Response {
    if payload.title.trim().is_empty() || payload.duration.trim().is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Title and duration are required",
        )
        .into_response();
    }
    if let Some(ref kind) = payload.material_kind {
        if !LESSON_MATERIAL_KINDS.contains(&kind.as_str()) {
            return json_error(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Unknown material kind",
            )
            .into_response();
        }
        if kind == "link" && payload.material_url.as_deref().unwrap_or("").trim().is_empty() {
            return json_error(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "URL is required for link materials",
            )
            .into_response();
        }
    }

    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    match get_module(proxy.as_ref(), &id, &module_id).await {
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

    // URLs only make sense on link lessons, matching the original behavior.
    let material_url = if payload.material_kind.as_deref() == Some("link") {
        payload.material_url
    } else {
        None
    };

    let lesson = NewLesson {
        title: payload.title,
        description: payload.description,
        duration: payload.duration,
        material_kind: payload.material_kind,
        material_url,
    };

    match insert_lesson(proxy.as_ref(), &module_id, &lesson).await {
        Ok(lesson) => (
            StatusCode::CREATED,
            Json(LessonResponse {
                success: true,
                message: "Lesson created successfully".to_string(),
                lesson,
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "insert lesson failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}

#[derive(Serialize)]
struct SuccessMessageResponse {
    success: bool,
    message: String,
}

async fn remove_lesson(
    State(state): State<AppState>,
    Path((id, module_id, lesson_id)): Path<(String, String, String)>,
) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    match get_module(proxy.as_ref(), &id, &module_id).await {
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

    match get_lesson(proxy.as_ref(), &module_id, &lesson_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return AppError::not_found("Lesson not found or doesn't belong to this module")
                .into_response();
        }
        Err(err) => {
            tracing::warn!(error = %err, "get lesson failed");
            return AppError::internal(err.to_string()).into_response();
        }
    }

    match delete_lesson(proxy.as_ref(), &lesson_id).await {
        Ok(true) => Json(SuccessMessageResponse {
            success: true,
            message: "Lesson deleted successfully".to_string(),
        })
        .into_response(),
        Ok(false) => AppError::not_found("Lesson not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "delete lesson failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}
