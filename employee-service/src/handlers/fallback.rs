use service_core::error::AppError;

/// Any path that matches no route.
pub async fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Resource not found"))
}

/// A known path requested with a method it does not serve.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
