use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::db::operations::{format_naive_iso, new_id};
use crate::db::DatabaseProxy;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    pub id: String,
    pub course_name: String,
    pub course_code: String,
    pub description: String,
    pub category: String,
    pub duration_weeks: i32,
    pub price: f64,
    pub max_students: i32,
    pub difficulty: String,
    pub instructor_name: String,
    pub teacher_id: String,
    pub thumbnail: Option<String>,
    pub enrollment_status: String,
    pub has_modules: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub course_name: String,
    pub course_code: String,
    pub description: String,
    pub category: String,
    pub duration_weeks: i32,
    pub price: f64,
    pub max_students: i32,
    pub difficulty: String,
    pub instructor_name: String,
    pub teacher_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePatch {
    pub course_name: Option<String>,
    pub course_code: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub duration_weeks: Option<i32>,
    pub price: Option<f64>,
    pub max_students: Option<i32>,
    pub difficulty: Option<String>,
    pub instructor_name: Option<String>,
    pub enrollment_status: Option<String>,
}

fn map_course(row: &PgRow) -> CourseRecord {
    CourseRecord {
        id: row.get("id"),
        course_name: row.get("course_name"),
        course_code: row.get("course_code"),
        description: row.get("description"),
        category: row.get("category"),
        duration_weeks: row.get("duration_weeks"),
        price: row.get("price"),
        max_students: row.get("max_students"),
        difficulty: row.get("difficulty"),
        instructor_name: row.get("instructor_name"),
        teacher_id: row.get("teacher_id"),
        thumbnail: row.get("thumbnail"),
        enrollment_status: row.get("enrollment_status"),
        has_modules: row.get("has_modules"),
        created_at: format_naive_iso(row.get::<NaiveDateTime, _>("created_at")),
        updated_at: format_naive_iso(row.get::<NaiveDateTime, _>("updated_at")),
    }
}

pub async fn find_by_code(
    proxy: &DatabaseProxy,
    code: &str,
) -> Result<Option<CourseRecord>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "courses" WHERE "course_code" = $1 LIMIT 1"#)
        .bind(code)
        .fetch_optional(proxy.pool())
        .await?;
    Ok(row.as_ref().map(map_course))
}

pub async fn insert_course(
    proxy: &DatabaseProxy,
    course: &NewCourse,
) -> Result<CourseRecord, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO "courses" (
            "id", "course_name", "course_code", "description", "category",
            "duration_weeks", "price", "max_students", "difficulty",
            "instructor_name", "teacher_id"
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(&course.course_name)
    .bind(&course.course_code)
    .bind(&course.description)
    .bind(&course.category)
    .bind(course.duration_weeks)
    .bind(course.price)
    .bind(course.max_students)
    .bind(&course.difficulty)
    .bind(&course.instructor_name)
    .bind(&course.teacher_id)
    .fetch_one(proxy.pool())
    .await?;
    Ok(map_course(&row))
}

pub async fn list_courses(
    proxy: &DatabaseProxy,
    status: Option<&str>,
) -> Result<Vec<CourseRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM "courses"
        WHERE ($1::TEXT IS NULL OR "enrollment_status" = $1)
        ORDER BY "created_at" DESC
        "#,
    )
    .bind(status)
    .fetch_all(proxy.pool())
    .await?;
    Ok(rows.iter().map(map_course).collect())
}

pub async fn list_by_teacher(
    proxy: &DatabaseProxy,
    teacher_id: &str,
) -> Result<Vec<CourseRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT * FROM "courses" WHERE "teacher_id" = $1 ORDER BY "created_at" DESC"#,
    )
    .bind(teacher_id)
    .fetch_all(proxy.pool())
    .await?;
    Ok(rows.iter().map(map_course).collect())
}

pub async fn get_course(
    proxy: &DatabaseProxy,
    id: &str,
) -> Result<Option<CourseRecord>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "courses" WHERE "id" = $1 LIMIT 1"#)
        .bind(id)
        .fetch_optional(proxy.pool())
        .await?;
    Ok(row.as_ref().map(map_course))
}

pub async fn update_course(
    proxy: &DatabaseProxy,
    id: &str,
    patch: &CoursePatch,
) -> Result<Option<CourseRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        UPDATE "courses" SET
            "course_name" = COALESCE($2, "course_name"),
            "course_code" = COALESCE($3, "course_code"),
            "description" = COALESCE($4, "description"),
            "category" = COALESCE($5, "category"),
            "duration_weeks" = COALESCE($6, "duration_weeks"),
            "price" = COALESCE($7, "price"),
            "max_students" = COALESCE($8, "max_students"),
            "difficulty" = COALESCE($9, "difficulty"),
            "instructor_name" = COALESCE($10, "instructor_name"),
            "enrollment_status" = COALESCE($11, "enrollment_status"),
            "updated_at" = NOW()
        WHERE "id" = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&patch.course_name)
    .bind(&patch.course_code)
    .bind(&patch.description)
    .bind(&patch.category)
    .bind(patch.duration_weeks)
    .bind(patch.price)
    .bind(patch.max_students)
    .bind(&patch.difficulty)
    .bind(&patch.instructor_name)
    .bind(&patch.enrollment_status)
    .fetch_optional(proxy.pool())
    .await?;
    Ok(row.as_ref().map(map_course))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
    pub created_at: String,
}

fn map_module(row: &PgRow) -> ModuleRecord {
    ModuleRecord {
        id: row.get("id"),
        course_id: row.get("course_id"),
        title: row.get("title"),
        description: row.get("description"),
        position: row.get("position"),
        created_at: format_naive_iso(row.get::<NaiveDateTime, _>("created_at")),
    }
}

/// Appends the module at the end of the course and flips the course's
/// has_modules flag.
pub async fn insert_module(
    proxy: &DatabaseProxy,
    course_id: &str,
    title: &str,
    description: Option<&str>,
) -> Result<ModuleRecord, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO "modules" ("id", "course_id", "title", "description", "position")
        VALUES (
            $1, $2, $3, $4,
            (SELECT COALESCE(MAX("position"), 0) + 1 FROM "modules" WHERE "course_id" = $2)
        )
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(course_id)
    .bind(title)
    .bind(description)
    .fetch_one(proxy.pool())
    .await?;

    sqlx::query(r#"UPDATE "courses" SET "has_modules" = TRUE WHERE "id" = $1"#)
        .bind(course_id)
        .execute(proxy.pool())
        .await?;

    Ok(map_module(&row))
}

pub async fn list_modules(
    proxy: &DatabaseProxy,
    course_id: &str,
) -> Result<Vec<ModuleRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT * FROM "modules" WHERE "course_id" = $1 ORDER BY "position""#,
    )
    .bind(course_id)
    .fetch_all(proxy.pool())
    .await?;
    Ok(rows.iter().map(map_module).collect())
}

pub async fn get_module(
    proxy: &DatabaseProxy,
    course_id: &str,
    module_id: &str,
) -> Result<Option<ModuleRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT * FROM "modules" WHERE "id" = $1 AND "course_id" = $2 LIMIT 1"#,
    )
    .bind(module_id)
    .bind(course_id)
    .fetch_optional(proxy.pool())
    .await?;
    Ok(row.as_ref().map(map_module))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRecord {
    pub id: String,
    pub module_id: String,
    pub title: String,
    pub description: Option<String>,
    pub duration: String,
    pub material_kind: Option<String>,
    pub material_url: Option<String>,
    pub position: i32,
    pub created_at: String,
}

fn map_lesson(row: &PgRow) -> LessonRecord {
    LessonRecord {
        id: row.get("id"),
        module_id: row.get("module_id"),
        title: row.get("title"),
        description: row.get("description"),
        duration: row.get("duration"),
        material_kind: row.get("material_kind"),
        material_url: row.get("material_url"),
        position: row.get("position"),
        created_at: format_naive_iso(row.get::<NaiveDateTime, _>("created_at")),
    }
}

#[derive(Debug, Clone)]
pub struct NewLesson {
    pub title: String,
    pub description: Option<String>,
    pub duration: String,
    pub material_kind: Option<String>,
    pub material_url: Option<String>,
}

pub async fn insert_lesson(
    proxy: &DatabaseProxy,
    module_id: &str,
    lesson: &NewLesson,
) -> Result<LessonRecord, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO "lessons" (
            "id", "module_id", "title", "description", "duration",
            "material_kind", "material_url", "position"
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7,
            (SELECT COALESCE(MAX("position"), 0) + 1 FROM "lessons" WHERE "module_id" = $2)
        )
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(module_id)
    .bind(&lesson.title)
    .bind(&lesson.description)
    .bind(&lesson.duration)
    .bind(&lesson.material_kind)
    .bind(&lesson.material_url)
    .fetch_one(proxy.pool())
    .await?;
    Ok(map_lesson(&row))
}

pub async fn list_lessons(
    proxy: &DatabaseProxy,
    module_id: &str,
) -> Result<Vec<LessonRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT * FROM "lessons" WHERE "module_id" = $1 ORDER BY "position""#,
    )
    .bind(module_id)
    .fetch_all(proxy.pool())
    .await?;
    Ok(rows.iter().map(map_lesson).collect())
}

pub async fn get_lesson(
    proxy: &DatabaseProxy,
    module_id: &str,
    lesson_id: &str,
) -> Result<Option<LessonRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT * FROM "lessons" WHERE "id" = $1 AND "module_id" = $2 LIMIT 1"#,
    )
    .bind(lesson_id)
    .bind(module_id)
    .fetch_optional(proxy.pool())
    .await?;
    Ok(row.as_ref().map(map_lesson))
}

pub async fn delete_lesson(proxy: &DatabaseProxy, lesson_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM "lessons" WHERE "id" = $1"#)
        .bind(lesson_id)
        .execute(proxy.pool())
        .await?;
    Ok(result.rows_affected() > 0)
}
