use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::db::operations::{format_naive_iso, new_id};
use crate::db::DatabaseProxy;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub email: Option<String>,
    pub username: Option<String>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.username.is_none() && self.is_active.is_none()
    }
}

fn map_user(row: &PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        role: row.get("role"),
        is_active: row.get("is_active"),
        created_at: format_naive_iso(row.get::<NaiveDateTime, _>("created_at")),
        updated_at: format_naive_iso(row.get::<NaiveDateTime, _>("updated_at")),
    }
}

pub async fn find_by_email(
    proxy: &DatabaseProxy,
    email: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "users" WHERE "email" = $1 LIMIT 1"#)
        .bind(email)
        .fetch_optional(proxy.pool())
        .await?;
    Ok(row.as_ref().map(map_user))
}

pub async fn insert_user(proxy: &DatabaseProxy, user: &NewUser) -> Result<UserRecord, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO "users" ("id", "email", "username", "role")
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(&user.email)
    .bind(&user.username)
    .bind(&user.role)
    .fetch_one(proxy.pool())
    .await?;
    Ok(map_user(&row))
}

pub async fn list_users(
    proxy: &DatabaseProxy,
    role: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<UserRecord>, i64), sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM "users"
        WHERE ($1::TEXT IS NULL OR "role" = $1)
        ORDER BY "created_at"
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(role)
    .bind(limit)
    .bind(offset)
    .fetch_all(proxy.pool())
    .await?;

    let total: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM "users" WHERE ($1::TEXT IS NULL OR "role" = $1)"#,
    )
    .bind(role)
    .fetch_one(proxy.pool())
    .await?;

    Ok((rows.iter().map(map_user).collect(), total))
}

pub async fn get_user(proxy: &DatabaseProxy, id: &str) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "users" WHERE "id" = $1 LIMIT 1"#)
        .bind(id)
        .fetch_optional(proxy.pool())
        .await?;
    Ok(row.as_ref().map(map_user))
}

pub async fn update_user(
    proxy: &DatabaseProxy,
    id: &str,
    patch: &UserPatch,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        UPDATE "users" SET
            "email" = COALESCE($2, "email"),
            "username" = COALESCE($3, "username"),
            "is_active" = COALESCE($4, "is_active"),
            "updated_at" = NOW()
        WHERE "id" = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&patch.email)
    .bind(&patch.username)
    .bind(patch.is_active)
    .fetch_optional(proxy.pool())
    .await?;
    Ok(row.as_ref().map(map_user))
}

pub async fn delete_user(proxy: &DatabaseProxy, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM "users" WHERE "id" = $1"#)
        .bind(id)
        .execute(proxy.pool())
        .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: String,
    pub user_id: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrolled_since: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub office: Option<String>,
}

fn map_profile(row: &PgRow) -> ProfileRecord {
    ProfileRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        full_name: row.get("full_name"),
        bio: row.get("bio"),
        profile_picture: row.get("profile_picture"),
        phone: row.get("phone"),
        address: row.get("address"),
        department: row.get("department"),
        position: row.get("position"),
        office: row.get("office"),
        student_no: row.get("student_no"),
        enrolled_since: row
            .get::<Option<NaiveDateTime>, _>("enrolled_since")
            .map(format_naive_iso),
    }
}

/// First read creates the profile, like the original backend does. Students
/// get a derived student number and an enrollment timestamp.
pub async fn get_or_create_profile(
    proxy: &DatabaseProxy,
    user: &UserRecord,
) -> Result<ProfileRecord, sqlx::Error> {
    if let Some(existing) = sqlx::query(r#"SELECT * FROM "profiles" WHERE "user_id" = $1 LIMIT 1"#)
        .bind(&user.id)
        .fetch_optional(proxy.pool())
        .await?
    {
        return Ok(map_profile(&existing));
    }

    let student_no = if user.role == "student" {
        let tail: String = user
            .id
            .chars()
            .rev()
            .take(6)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        Some(format!("ST-{tail}"))
    } else {
        None
    };

    let row = sqlx::query(
        r#"
        INSERT INTO "profiles" ("id", "user_id", "full_name", "student_no", "enrolled_since")
        VALUES ($1, $2, $3, $4, CASE WHEN $4 IS NULL THEN NULL ELSE NOW() END)
        ON CONFLICT ("user_id") DO UPDATE SET "user_id" = EXCLUDED."user_id"
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(&user.id)
    .bind(&user.username)
    .bind(&student_no)
    .fetch_one(proxy.pool())
    .await?;
    Ok(map_profile(&row))
}

pub async fn update_profile(
    proxy: &DatabaseProxy,
    user_id: &str,
    patch: &ProfilePatch,
) -> Result<Option<ProfileRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        UPDATE "profiles" SET
            "full_name" = COALESCE($2, "full_name"),
            "bio" = COALESCE($3, "bio"),
            "phone" = COALESCE($4, "phone"),
            "address" = COALESCE($5, "address"),
            "department" = COALESCE($6, "department"),
            "position" = COALESCE($7, "position"),
            "office" = COALESCE($8, "office"),
            "updated_at" = NOW()
        WHERE "user_id" = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&patch.full_name)
    .bind(&patch.bio)
    .bind(&patch.phone)
    .bind(&patch.address)
    .bind(&patch.department)
    .bind(&patch.position)
    .bind(&patch.office)
    .fetch_optional(proxy.pool())
    .await?;
    Ok(row.as_ref().map(map_profile))
}
