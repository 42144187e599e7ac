mod attendance;
mod courses;
mod health;
mod materials;
mod notifications;
mod students;
mod teachers;
mod users;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::services::ServeDir;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let uploads_dir = state.upload_store().root().to_path_buf();

    Router::new()
        .nest("/api/users", users::router())
        .nest("/api/students", students::router())
        .nest("/api/teachers", teachers::router())
        .nest("/api/courses", courses::router())
        .nest("/api/materials", materials::router())
        .nest("/api/notifications", notifications::router())
        .nest("/api/attendance", attendance::router())
        .nest("/health", health::router())
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Route not found").into_response()
}
