use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::db::operations::{format_naive_iso, new_id};
use crate::db::DatabaseProxy;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRecord {
    pub id: String,
    pub course_id: String,
    pub module_id: Option<String>,
    pub title: String,
    pub kind: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub format: Option<String>,
    pub size: Option<String>,
    pub duration: Option<String>,
    pub uploaded_by: String,
    pub access_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub course_id: String,
    pub module_id: Option<String>,
    pub title: String,
    pub kind: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub format: Option<String>,
    pub size: Option<String>,
    pub duration: Option<String>,
    pub uploaded_by: String,
}

fn map_material(row: &PgRow) -> MaterialRecord {
    MaterialRecord {
        id: row.get("id"),
        course_id: row.get("course_id"),
        module_id: row.get("module_id"),
        title: row.get("title"),
        kind: row.get("kind"),
        description: row.get("description"),
        url: row.get("url"),
        format: row.get("format"),
        size: row.get("size"),
        duration: row.get("duration"),
        uploaded_by: row.get("uploaded_by"),
        access_count: row.get("access_count"),
        created_at: format_naive_iso(row.get::<NaiveDateTime, _>("created_at")),
        updated_at: format_naive_iso(row.get::<NaiveDateTime, _>("updated_at")),
    }
}

pub async fn insert_material(
    proxy: &DatabaseProxy,
    material: &NewMaterial,
) -> Result<MaterialRecord, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO "materials" (
            "id", "course_id", "module_id", "title", "kind", "description",
            "url", "format", "size", "duration", "uploaded_by"
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(&material.course_id)
    .bind(&material.module_id)
    .bind(&material.title)
    .bind(&material.kind)
    .bind(&material.description)
    .bind(&material.url)
    .bind(&material.format)
    .bind(&material.size)
    .bind(&material.duration)
    .bind(&material.uploaded_by)
    .fetch_one(proxy.pool())
    .await?;
    Ok(map_material(&row))
}

pub async fn list_for_course(
    proxy: &DatabaseProxy,
    course_id: &str,
    module_id: Option<&str>,
) -> Result<Vec<MaterialRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM "materials"
        WHERE "course_id" = $1 AND ($2::TEXT IS NULL OR "module_id" = $2)
        ORDER BY "created_at" DESC
        "#,
    )
    .bind(course_id)
    .bind(module_id)
    .fetch_all(proxy.pool())
    .await?;
    Ok(rows.iter().map(map_material).collect())
}

pub async fn get_material(
    proxy: &DatabaseProxy,
    id: &str,
) -> Result<Option<MaterialRecord>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "materials" WHERE "id" = $1 LIMIT 1"#)
        .bind(id)
        .fetch_optional(proxy.pool())
        .await?;
    Ok(row.as_ref().map(map_material))
}

/// Fetches a material and bumps its access counter in one round trip.
pub async fn fetch_and_touch(
    proxy: &DatabaseProxy,
    id: &str,
) -> Result<Option<MaterialRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        UPDATE "materials"
        SET "access_count" = "access_count" + 1
        WHERE "id" = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(proxy.pool())
    .await?;
    Ok(row.as_ref().map(map_material))
}

pub async fn delete_material(proxy: &DatabaseProxy, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM "materials" WHERE "id" = $1"#)
        .bind(id)
        .execute(proxy.pool())
        .await?;
    Ok(result.rows_affected() > 0)
}
