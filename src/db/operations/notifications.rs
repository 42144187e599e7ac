use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::db::operations::{format_naive_iso, new_id};
use crate::db::DatabaseProxy;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    pub recipient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: String,
    pub sender_id: Option<String>,
    pub course_id: Option<String>,
    pub kind: String,
    pub title: String,
    pub message: String,
}

fn map_notification(row: &PgRow) -> NotificationRecord {
    NotificationRecord {
        id: row.get("id"),
        recipient_id: row.get("recipient_id"),
        sender_id: row.get("sender_id"),
        course_id: row.get("course_id"),
        kind: row.get("kind"),
        title: row.get("title"),
        message: row.get("message"),
        read: row.get("read"),
        created_at: format_naive_iso(row.get::<NaiveDateTime, _>("created_at")),
    }
}

pub async fn insert_notification(
    proxy: &DatabaseProxy,
    notification: &NewNotification,
) -> Result<NotificationRecord, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO "notifications" (
            "id", "recipient_id", "sender_id", "course_id", "kind", "title", "message"
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(&notification.recipient_id)
    .bind(&notification.sender_id)
    .bind(&notification.course_id)
    .bind(&notification.kind)
    .bind(&notification.title)
    .bind(&notification.message)
    .fetch_one(proxy.pool())
    .await?;
    Ok(map_notification(&row))
}

pub async fn list_for_user(
    proxy: &DatabaseProxy,
    recipient_id: &str,
) -> Result<Vec<NotificationRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM "notifications"
        WHERE "recipient_id" = $1
        ORDER BY "created_at" DESC
        "#,
    )
    .bind(recipient_id)
    .fetch_all(proxy.pool())
    .await?;
    Ok(rows.iter().map(map_notification).collect())
}

pub async fn unread_count(proxy: &DatabaseProxy, recipient_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM "notifications" WHERE "recipient_id" = $1 AND "read" = FALSE"#,
    )
    .bind(recipient_id)
    .fetch_one(proxy.pool())
    .await
}

pub async fn mark_read(proxy: &DatabaseProxy, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"UPDATE "notifications" SET "read" = TRUE WHERE "id" = $1"#)
        .bind(id)
        .execute(proxy.pool())
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_all_read(
    proxy: &DatabaseProxy,
    recipient_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE "notifications" SET "read" = TRUE WHERE "recipient_id" = $1 AND "read" = FALSE"#,
    )
    .bind(recipient_id)
    .execute(proxy.pool())
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_notification(proxy: &DatabaseProxy, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM "notifications" WHERE "id" = $1"#)
        .bind(id)
        .execute(proxy.pool())
        .await?;
    Ok(result.rows_affected() > 0)
}
