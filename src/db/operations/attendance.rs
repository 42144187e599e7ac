use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::db::operations::{format_naive_iso, new_id};
use crate::db::DatabaseProxy;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    pub id: String,
    pub course_id: String,
    pub student_id: String,
    pub date: NaiveDate,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub recorded_by: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub course_id: String,
    pub student_id: String,
    pub date: NaiveDate,
    pub status: String,
    pub time: Option<String>,
    pub note: Option<String>,
    pub recorded_by: String,
}

fn map_entry(row: &PgRow) -> AttendanceEntry {
    AttendanceEntry {
        id: row.get("id"),
        course_id: row.get("course_id"),
        student_id: row.get("student_id"),
        date: row.get("date"),
        status: row.get("status"),
        time: row.get("time"),
        note: row.get("note"),
        recorded_by: row.get("recorded_by"),
        created_at: format_naive_iso(row.get::<NaiveDateTime, _>("created_at")),
        student_name: row.try_get("student_name").ok(),
        course_name: row.try_get("course_name").ok(),
    }
}

/// One record per (course, student, day); recording the same day again
/// replaces status, time and note, like the original backend.
pub async fn upsert_record(
    proxy: &DatabaseProxy,
    record: &NewAttendance,
) -> Result<AttendanceEntry, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO "attendance" (
            "id", "course_id", "student_id", "date", "status", "time", "note", "recorded_by"
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT ("course_id", "student_id", "date") DO UPDATE SET
            "status" = EXCLUDED."status",
            "time" = EXCLUDED."time",
            "note" = EXCLUDED."note"
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(&record.course_id)
    .bind(&record.student_id)
    .bind(record.date)
    .bind(&record.status)
    .bind(&record.time)
    .bind(&record.note)
    .bind(&record.recorded_by)
    .fetch_one(proxy.pool())
    .await?;
    Ok(map_entry(&row))
}

pub async fn list_for_course(
    proxy: &DatabaseProxy,
    course_id: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<AttendanceEntry>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT a.*, u."username" AS "student_name"
        FROM "attendance" a
        JOIN "users" u ON u."id" = a."student_id"
        WHERE a."course_id" = $1
          AND ($2::DATE IS NULL OR a."date" >= $2)
          AND ($3::DATE IS NULL OR a."date" <= $3)
        ORDER BY a."date" DESC
        "#,
    )
    .bind(course_id)
    .bind(start)
    .bind(end)
    .fetch_all(proxy.pool())
    .await?;
    Ok(rows.iter().map(map_entry).collect())
}

pub async fn list_for_student(
    proxy: &DatabaseProxy,
    student_id: &str,
    course_id: Option<&str>,
) -> Result<Vec<AttendanceEntry>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT a.*, c."course_name" AS "course_name"
        FROM "attendance" a
        JOIN "courses" c ON c."id" = a."course_id"
        WHERE a."student_id" = $1
          AND ($2::TEXT IS NULL OR a."course_id" = $2)
        ORDER BY a."date" DESC
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_all(proxy.pool())
    .await?;
    Ok(rows.iter().map(map_entry).collect())
}

/// Checks the student exists and has the student role before attendance is
/// recorded against them.
pub async fn student_exists(proxy: &DatabaseProxy, student_id: &str) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM "users" WHERE "id" = $1 AND "role" = 'student'"#,
    )
    .bind(student_id)
    .fetch_one(proxy.pool())
    .await?;
    Ok(count > 0)
}
