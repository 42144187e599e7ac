use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::operations::attendance::{
    list_for_course, list_for_student, student_exists, upsert_record, AttendanceEntry,
    NewAttendance,
};
use crate::db::operations::courses::get_course;
use crate::db::operations::users::get_user;
use crate::response::{json_error, AppError};
use crate::state::AppState;

const STATUSES: [&str; 4] = ["Present", "Absent", "Late", "Excused"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/record", post(record))
        .route("/bulk-record", post(bulk_record))
        .route("/course/:course_id", get(for_course))
        .route("/student/:student_id", get(for_student))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordPayload {
    course_id: String,
    student_id: String,
    date: NaiveDate,
    status: String,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    note: Option<String>,
    recorded_by: String,
}

#[derive(Serialize)]
struct RecordResponse {
    success: bool,
    message: String,
    record: AttendanceEntry,
}

async fn record(State(state): State<AppState>, Json(payload): Json<RecordPayload>) -> Response {
    if !STATUSES.contains(&payload.status.as_str()) {
        return json_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Status must be Present, Absent, Late or Excused",
        )
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

    match student_exists(proxy.as_ref(), &payload.student_id).await {
        Ok(true) => {}
        Ok(false) => return AppError::not_found("Student not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "student lookup failed");
            return AppError::internal(err.to_string()).into_response();
        }
    }

    match get_user(proxy.as_ref(), &payload.recorded_by).await {
        Ok(Some(_)) => {}
        Ok(None) => return AppError::not_found("Recording user not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "recorder lookup failed");
            return AppError::internal(err.to_string()).into_response();
        }
    }

    let record = NewAttendance {
        course_id: payload.course_id,
        student_id: payload.student_id,
        date: payload.date,
        status: payload.status,
        time: payload.time,
        note: payload.note,
        recorded_by: payload.recorded_by,
    };

    match upsert_record(proxy.as_ref(), &record).await {
        Ok(record) => Json(RecordResponse {
            success: true,
            message: "Attendance recorded successfully".to_string(),
            record,
        })
        .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "record attendance failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkEntry {
    student_id: String,
    status: String,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkRecordPayload {
    course_id: String,
    date: NaiveDate,
    records: Vec<BulkEntry>,
    recorded_by: String,
}

#[derive(Serialize)]
struct BulkRecordResponse {
    success: bool,
    message: String,
    recorded: usize,
    skipped: usize,
}

async fn bulk_record(
    State(state): State<AppState>,
    Json(payload): Json<BulkRecordPayload>,
) -> Response {
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

    match get_user(proxy.as_ref(), &payload.recorded_by).await {
        Ok(Some(_)) => {}
        Ok(None) => return AppError::not_found("Recording user not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "recorder lookup failed");
            return AppError::internal(err.to_string()).into_response();
        }
    }

    let mut recorded = 0usize;
    let mut skipped = 0usize;

    // Entries with an unknown student or a bad status are skipped, not
    // rejected, matching the original bulk behavior.
    for entry in &payload.records {
        if !STATUSES.contains(&entry.status.as_str()) {
            skipped += 1;
            continue;
        }

        match student_exists(proxy.as_ref(), &entry.student_id).await {
            Ok(true) => {}
            Ok(false) => {
                skipped += 1;
                continue;
            }
            Err(err) => {
                tracing::warn!(error = %err, "student lookup failed");
                return AppError::internal(err.to_string()).into_response();
            }
        }

        let record = NewAttendance {
            course_id: payload.course_id.clone(),
            student_id: entry.student_id.clone(),
            date: payload.date,
            status: entry.status.clone(),
            time: entry.time.clone(),
            note: entry.note.clone(),
            recorded_by: payload.recorded_by.clone(),
        };

        match upsert_record(proxy.as_ref(), &record).await {
            Ok(_) => recorded += 1,
            Err(err) => {
                tracing::warn!(error = %err, "bulk record failed");
                return AppError::internal(err.to_string()).into_response();
            }
        }
    }

    Json(BulkRecordResponse {
        success: true,
        message: "Attendance recorded successfully for all students".to_string(),
        recorded,
        skipped,
    })
    .into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseRangeQuery {
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CourseAttendanceResponse {
    success: bool,
    attendance_records: Vec<AttendanceEntry>,
}

async fn for_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Query(query): Query<CourseRangeQuery>,
) -> Response {
    let start = match parse_query_date(query.start_date.as_deref()) {
        Ok(value) => value,
        Err(response) => return response,
    };
    let end = match parse_query_date(query.end_date.as_deref()) {
        Ok(value) => value,
        Err(response) => return response,
    };

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

    match list_for_course(proxy.as_ref(), &course_id, start, end).await {
        Ok(records) => Json(CourseAttendanceResponse {
            success: true,
            attendance_records: records,
        })
        .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "course attendance failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentQuery {
    course_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub excused: usize,
    pub attendance_rate: f64,
}

/// Per-status counts plus the share of days marked Present, rounded to two
/// decimals.
pub fn summarize(records: &[AttendanceEntry]) -> AttendanceStats {
    let total = records.len();
    let count = |status: &str| records.iter().filter(|r| r.status == status).count();

    let present = count("Present");
    let attendance_rate = if total > 0 {
        ((present as f64 / total as f64) * 10_000.0).round() / 100.0
    } else {
        0.0
    };

    AttendanceStats {
        total,
        present,
        absent: count("Absent"),
        late: count("Late"),
        excused: count("Excused"),
        attendance_rate,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StudentAttendanceResponse {
    success: bool,
    attendance_records: Vec<AttendanceEntry>,
    statistics: AttendanceStats,
}

async fn for_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Query(query): Query<StudentQuery>,
) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return AppError::unavailable("Service unavailable").into_response();
    };

    match student_exists(proxy.as_ref(), &student_id).await {
        Ok(true) => {}
        Ok(false) => return AppError::not_found("Student not found").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "student lookup failed");
            return AppError::internal(err.to_string()).into_response();
        }
    }

    match list_for_student(proxy.as_ref(), &student_id, query.course_id.as_deref()).await {
        Ok(records) => {
            let statistics = summarize(&records);
            Json(StudentAttendanceResponse {
                success: true,
                attendance_records: records,
                statistics,
            })
            .into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "student attendance failed");
            AppError::internal(err.to_string()).into_response()
        }
    }
}

fn parse_query_date(raw: Option<&str>) -> Result<Option<NaiveDate>, Response> {
    match raw {
        None => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                json_error(
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    "Invalid date format. Use ISO format (YYYY-MM-DD)",
                )
                .into_response()
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(status: &str) -> AttendanceEntry {
        AttendanceEntry {
            id: "a".into(),
            course_id: "c".into(),
            student_id: "s".into(),
            date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            status: status.into(),
            time: None,
            note: None,
            recorded_by: "t".into(),
            created_at: "2024-09-02T08:00:00.000Z".into(),
            student_name: None,
            course_name: None,
        }
    }

    #[test]
    fn summarize_empty_is_zero() {
        let stats = summarize(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.attendance_rate, 0.0);
    }

    #[test]
    fn summarize_counts_statuses() {
        let records = vec![
            entry("Present"),
            entry("Present"),
            entry("Absent"),
            entry("Late"),
        ];
        let stats = summarize(&records);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.present, 2);
        assert_eq!(stats.absent, 1);
        assert_eq!(stats.late, 1);
        assert_eq!(stats.excused, 0);
        assert_eq!(stats.attendance_rate, 50.0);
    }

    proptest! {
        #[test]
        fn summarize_invariants(statuses in proptest::collection::vec(0usize..4, 0..200)) {
            let records: Vec<AttendanceEntry> = statuses
                .iter()
                .map(|i| entry(STATUSES[*i]))
                .collect();

            let stats = summarize(&records);

            prop_assert_eq!(
                stats.present + stats.absent + stats.late + stats.excused,
                stats.total
            );
            prop_assert!(stats.attendance_rate >= 0.0);
            prop_assert!(stats.attendance_rate <= 100.0);
        }
    }
}
