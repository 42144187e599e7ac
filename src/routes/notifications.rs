use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::operations::notifications::{
    delete_notification, list_for_user, mark_all_read, mark_read, unread_count, NewNotification,
    NotificationRecord,
};
use crate::response::{json_error, AppError};
use crate::services::notification::{is_valid_kind, notify, NotificationError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/user/:user_id", get(list))
        .route("/user/:user_id/read-all", put(read_all))
        .route("/:id/read", put(read_one))
        .route("/:id", delete(remove))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateNotificationPayload {
    recipient_id: String,
    title: String,
    message: String,
    kind: String,
    #[serde(default)]
    sender_id: Option<String>,
    #[serde(default)]
    course_id: Option<String>,
}

#[derive(Serialize)]
struct NotificationResponse {
    success: bool,
    notification: NotificationRecord,
}

async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateNotificationPayload>,
) -> Response {
    if !is_valid_kind(&payload.kind) {
        return json_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Unknown notification kind",
        )
        .into_response();
    }
    if payload.title.trim().is_empty() || payload.message.trim().is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Title and message are required",
        )
        .into_response();
    }

    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    let input = NewNotification {
        recipient_id: payload.recipient_id,
        sender_id: payload.sender_id,
        course_id: payload.course_id,
        kind: payload.kind,
        title: payload.title,
        message: payload.message,
    };

    match notify(proxy.as_ref(), state.email_service().as_ref(), input).await {
        Ok(notification) => (
            StatusCode::CREATED,
            Json(NotificationResponse {
                success: true,
                notification,
            }),
        )
            .into_response(),
        Err(NotificationError::UnknownRecipient) => {
            AppError::not_found("Recipient not found").into_response()
        }
        Err(NotificationError::Db(err)) => {
            tracing::warn!(error = %err, "create notification failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationListResponse {
    success: bool,
    notifications: Vec<NotificationRecord>,
    unread_count: i64,
}

async fn list(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    let notifications = match list_for_user(proxy.as_ref(), &user_id).await {
        Ok(notifications) => notifications,
        Err(err) => {
            tracing::warn!(error = %err, "list notifications failed");
            return AppError::internal(err.to_string()).into_response();
        }
    };

    let unread = match unread_count(proxy.as_ref(), &user_id).await {
        Ok(unread) => unread,
        Err(err) => {
            tracing::warn!(error = %err, "unread count failed");
            return AppError::internal(err.to_string()).into_response();
        }
    };

    Json(NotificationListResponse {
        success: true,
        notifications,
        unread_count: unread,
    })
    .into_response()
}

#[derive(Serialize)]
struct SuccessMessageResponse {
    success: bool,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AffectedResponse {
    success: bool,
    affected: u64,
}

async fn read_one(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    match mark_read(proxy.as_ref(), &id).await {
        Ok(true) => Json(SuccessMessageResponse {
            success: true,
            message: "Notification marked as read".to_string(),
        })
        .into_response(),
        Ok(false) => AppError::not_found("Notification not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "mark notification read failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}

async fn read_all(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    match mark_all_read(proxy.as_ref(), &user_id).await {
        Ok(affected) => Json(AffectedResponse {
            success: true,
            affected,
        })
        .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "mark all read failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    match delete_notification(proxy.as_ref(), &id).await {
        Ok(true) => Json(SuccessMessageResponse {
            success: true,
            message: "Notification deleted successfully".to_string(),
        })
        .into_response(),
        Ok(false) => AppError::not_found("Notification not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "delete notification failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}
