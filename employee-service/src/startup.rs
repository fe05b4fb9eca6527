//! Application assembly and lifecycle management.
//!
//! Builds the router (employee routes, health probes, metrics), installs the
//! CORS/tracing/metrics middleware and owns the listener.

use crate::config::EmployeeConfig;
use crate::handlers;
use crate::services::{EmployeeStore, MongoDb, MongoEmployeeStore};
use axum::{
    body::Body,
    http::{header, Method},
    middleware::from_fn,
    routing::{delete, get, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EmployeeStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn EmployeeStore>) -> Self {
        Self { store }
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build the HTTP router. When `route_prefix` is set every route except
/// `/metrics` is nested under it. Unknown paths and unsupported methods get
/// the same JSON error body as handler failures.
pub fn build_router(state: AppState, route_prefix: Option<&str>) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route(
            "/add-employee",
            post(handlers::add_employee).options(handlers::preflight),
        )
        .route(
            "/employees",
            get(handlers::get_employees).options(handlers::preflight),
        )
        .route(
            "/delete-employee",
            delete(handlers::delete_employee).options(handlers::preflight),
        )
        .route(
            "/update-employee",
            put(handlers::update_employee).options(handlers::preflight),
        )
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .with_state(state);

    let app = match route_prefix {
        Some(prefix) => Router::new().nest(prefix, api),
        None => api,
    };

    app.route("/metrics", get(handlers::metrics_endpoint))
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .fallback(handlers::not_found)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(from_fn(request_id_middleware))
        .layer(cors_layer())
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    store: Arc<dyn EmployeeStore>,
}

impl Application {
    /// Connect to MongoDB (with retries), ensure indexes and bind the listener.
    pub async fn build(config: EmployeeConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb).await?;

        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let store: Arc<dyn EmployeeStore> = Arc::new(MongoEmployeeStore::new(db));
        Self::build_with_store(config, store).await
    }

    /// Bind the listener around an already constructed store.
    pub async fn build_with_store(
        config: EmployeeConfig,
        store: Arc<dyn EmployeeStore>,
    ) -> Result<Self, AppError> {
        let router = build_router(AppState::new(store.clone()), config.route_prefix.as_deref());

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port = port,
            route_prefix = config.route_prefix.as_deref().unwrap_or(""),
            debug = config.debug,
            "Employee service listening"
        );

        Ok(Self {
            port,
            listener,
            router,
            store,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM, then drain in-flight requests.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` completes, drain in-flight requests, then close
    /// the store.
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let result = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await;

        self.store.close().await;
        result
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
