use employee_service::config::{EmployeeConfig, SERVICE_NAME};
use employee_service::services::init_metrics;
use employee_service::startup::Application;
use service_core::observability::{init_tracing, shutdown_tracing};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = EmployeeConfig::load().await.map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    // Instrumentation is decided here once; handlers never look at APM settings.
    init_tracing(
        SERVICE_NAME,
        &config.common.log_level,
        config.log_format(),
        config.apm.as_ref(),
    );

    // Initialize metrics recorder (must be before any metrics are recorded)
    init_metrics();

    tracing::info!(
        port = config.common.port,
        debug = config.debug,
        "Starting employee service"
    );

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start employee service: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    let result = app.run_until_stopped().await;
    if let Err(e) = &result {
        tracing::error!("HTTP server error: {}", e);
    }

    shutdown_tracing();
    result
}
