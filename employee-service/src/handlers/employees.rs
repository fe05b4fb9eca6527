use crate::dtos::employees::{ID_REQUIRED, MISSING_FIELDS};
use crate::dtos::{
    CreateEmployeeRequest, CreateEmployeeResponse, DeleteEmployeeParams, MessageResponse,
    UpdateEmployeeRequest, UpdateEmployeeResponse,
};
use crate::models::Employee;
use crate::services::metrics::record_operation;
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

const CONFLICT_MESSAGE: &str = "Employee with this ID already exists";
const NOT_FOUND_MESSAGE: &str = "Employee not found";

fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!(NOT_FOUND_MESSAGE))
}

/// Answers a CORS pre-flight probe without touching storage.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn add_employee(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateEmployeeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let employee = payload
        .into_employee()
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!(MISSING_FIELDS)))?;

    // The unique index on `id` still catches a concurrent create that slips
    // past this check; insert maps that to the same conflict.
    if state.store.find_by_id(&employee.id).await?.is_some() {
        tracing::info!(employee_id = %employee.id, "Employee id already exists");
        record_operation("create", "conflict");
        return Err(AppError::Conflict(anyhow::anyhow!(CONFLICT_MESSAGE)));
    }

    let inserted_id = state.store.insert(&employee).await.map_err(|e| {
        tracing::error!(employee_id = %employee.id, "Failed to insert employee: {}", e);
        AppError::from(e)
    })?;

    tracing::info!(
        employee_id = %employee.id,
        inserted_id = %inserted_id,
        "Employee added"
    );
    record_operation("create", "created");

    Ok((
        StatusCode::CREATED,
        Json(CreateEmployeeResponse {
            message: "Employee added successfully".to_string(),
            employee,
            inserted_id,
        }),
    ))
}

pub async fn get_employees(State(state): State<AppState>) -> Result<Json<Vec<Employee>>, AppError> {
    let employees = state.store.list().await.map_err(|e| {
        tracing::error!("Failed to list employees: {}", e);
        AppError::from(e)
    })?;

    tracing::debug!(count = employees.len(), "Listed employees");
    record_operation("list", "ok");

    Ok(Json(employees))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    params: Result<Query<DeleteEmployeeParams>, QueryRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Query(params) = params
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid query: {}", e.body_text())))?;

    let id = params
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("ID parameter missing")))?;

    let deleted = state.store.delete_by_id(&id).await.map_err(|e| {
        tracing::error!(employee_id = %id, "Failed to delete employee: {}", e);
        AppError::from(e)
    })?;

    if deleted == 0 {
        record_operation("delete", "not_found");
        return Err(not_found());
    }

    tracing::info!(employee_id = %id, "Employee deleted");
    record_operation("delete", "deleted");

    Ok(Json(MessageResponse::new("Employee deleted successfully")))
}

pub async fn update_employee(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UpdateEmployeeRequest>,
) -> Result<Json<UpdateEmployeeResponse>, AppError> {
    let (id, update) = payload.into_parts();
    let id = id.ok_or_else(|| AppError::BadRequest(anyhow::anyhow!(ID_REQUIRED)))?;

    if state.store.find_by_id(&id).await?.is_none() {
        record_operation("update", "not_found");
        return Err(not_found());
    }

    let modified = state.store.update_fields(&id, &update).await.map_err(|e| {
        tracing::error!(employee_id = %id, "Failed to update employee: {}", e);
        AppError::from(e)
    })?;

    if modified == 0 {
        record_operation("update", "unchanged");
        return Ok(Json(UpdateEmployeeResponse::Unchanged(MessageResponse::new(
            "No changes made",
        ))));
    }

    // Deleted between the write and this read.
    let updated = state.store.find_by_id(&id).await?.ok_or_else(not_found)?;

    tracing::info!(employee_id = %id, "Employee updated");
    record_operation("update", "updated");

    Ok(Json(UpdateEmployeeResponse::Updated(updated)))
}
