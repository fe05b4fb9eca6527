use crate::models::{Employee, EmployeeUpdate};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const MISSING_FIELDS: &str = "Missing required fields";
pub const ID_REQUIRED: &str = "ID is required";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEmployeeRequest {
    #[validate(required(message = "Missing required fields"))]
    pub name: Option<String>,
    #[validate(required(message = "Missing required fields"))]
    pub id: Option<String>,
    #[validate(required(message = "Missing required fields"))]
    pub position: Option<String>,
}

impl CreateEmployeeRequest {
    /// `None` unless all three fields were supplied.
    pub fn into_employee(self) -> Option<Employee> {
        Some(Employee {
            name: self.name?,
            id: self.id?,
            position: self.position?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEmployeeResponse {
    pub message: String,
    pub employee: Employee,
    pub inserted_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteEmployeeParams {
    pub id: Option<String>,
}

/// Only `name` and `position` are updatable; any other key in the body is
/// ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEmployeeRequest {
    #[validate(required(message = "ID is required"))]
    pub id: Option<String>,
    pub name: Option<String>,
    pub position: Option<String>,
}

impl UpdateEmployeeRequest {
    pub fn into_parts(self) -> (Option<String>, EmployeeUpdate) {
        (
            self.id,
            EmployeeUpdate {
                name: self.name,
                position: self.position,
            },
        )
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Either the refreshed record or a notice that nothing changed.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UpdateEmployeeResponse {
    Updated(Employee),
    Unchanged(MessageResponse),
}
