pub mod employees;

pub use employees::{
    CreateEmployeeRequest, CreateEmployeeResponse, DeleteEmployeeParams, MessageResponse,
    UpdateEmployeeRequest, UpdateEmployeeResponse,
};
