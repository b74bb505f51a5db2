use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::header::HeaderName;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::stats::MarkStats;
use crate::store::{DeletedStudent, Student};

use super::error::ApiError;
use super::state::AppState;
use super::validation::{json_object, parse_new_student, parse_student_id, parse_student_patch};

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/students", get(list_students).post(create_student))
        .route("/students/{id}", put(update_student).delete(delete_student))
        .route("/stats", get(stats))
        .fallback(unknown_route)
        .method_not_allowed_fallback(unknown_route)
        .layer(SetRequestIdLayer::new(
            request_id.clone(),
            MakeRequestUuid::default(),
        ))
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn unknown_route() -> ApiError {
    ApiError::NotFound
}

async fn list_students(State(state): State<AppState>) -> Json<Vec<Student>> {
    let students = state.store.get_all().await;
    debug!(students = students.len(), "students listed");
    Json(students)
}

async fn create_student(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Student>, ApiError> {
    let body = json_object(payload).inspect_err(|err| reject("create", err))?;
    let new = parse_new_student(&body).inspect_err(|err| reject("create", err))?;

    let created = state.store.insert(new).await?;
    info!(id = created.id, course = %created.course, mark = created.mark.get(), "student created");
    Ok(Json(created))
}

async fn update_student(
    State(state): State<AppState>,
    raw_id: Result<Path<String>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Student>, ApiError> {
    let id = student_id(raw_id).inspect_err(|err| reject("update", err))?;
    let body = json_object(payload).inspect_err(|err| reject("update", err))?;

    if state.store.get_by_id(id).await.is_none() {
        warn!(id, "update of unknown student");
        return Err(ApiError::StudentNotFound);
    }
    let patch = parse_student_patch(&body).inspect_err(|err| reject("update", err))?;

    let updated = state
        .store
        .update(id, patch)
        .await?
        .ok_or(ApiError::StudentNotFound)?;
    info!(id, mark = updated.mark.get(), "student updated");
    Ok(Json(updated))
}

async fn delete_student(
    State(state): State<AppState>,
    raw_id: Result<Path<String>, PathRejection>,
) -> Result<Json<DeletedStudent>, ApiError> {
    let id = student_id(raw_id).inspect_err(|err| reject("delete", err))?;

    let deleted = state.store.delete(id).await?.ok_or_else(|| {
        warn!(id, "delete of unknown student");
        ApiError::StudentNotFound
    })?;
    info!(id, "student deleted");
    Ok(Json(deleted))
}

async fn stats(State(state): State<AppState>) -> Json<MarkStats> {
    let students = state.store.get_all().await;
    let stats = MarkStats::from_students(&students);
    debug!(count = stats.count, "stats requested");
    Json(stats)
}

/// Ids that fail to decode match no student, same as non-numeric ones.
fn student_id(raw_id: Result<Path<String>, PathRejection>) -> Result<u64, ApiError> {
    let Path(raw_id) = raw_id.map_err(|_| ApiError::NotFound)?;
    parse_student_id(&raw_id)
}

fn reject(operation: &'static str, err: &ApiError) {
    warn!(operation, error = %err, "request rejected");
}
