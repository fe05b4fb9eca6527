use opentelemetry::KeyValue;
use opentelemetry::trace::TraceError;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use secrecy::{ExposeSecret, Secret};
use tonic::metadata::{AsciiMetadataValue, MetadataMap};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Flattened JSON lines with file/line, for log shippers.
    Json,
    /// Multi-line human readable output for local development.
    Pretty,
}

/// Application performance monitoring settings.
///
/// Resolved once at startup; `None` at the call site means instrumentation is
/// disabled and no exporter is created.
#[derive(Debug, Clone)]
pub struct ApmConfig {
    /// OTLP/gRPC endpoint of the APM server.
    pub server_url: String,
    /// Sent as a bearer `authorization` header on every export.
    pub secret_token: Option<Secret<String>>,
    /// Reported as `deployment.environment`.
    pub environment: String,
}

fn build_tracer(service_name: &str, apm: &ApmConfig) -> Result<sdktrace::Tracer, TraceError> {
    let mut metadata = MetadataMap::new();
    if let Some(token) = &apm.secret_token {
        match format!("Bearer {}", token.expose_secret()).parse::<AsciiMetadataValue>() {
            Ok(value) => {
                metadata.insert("authorization", value);
            }
            Err(e) => eprintln!("Ignoring APM secret token, not a valid header value: {}", e),
        }
    }

    let otlp_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(apm.server_url.clone())
        .with_metadata(metadata);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp_exporter)
        .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
            KeyValue::new("deployment.environment", apm.environment.clone()),
        ])))
        .install_batch(runtime::Tokio)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `log_level`. When `apm` is set, spans are
/// additionally exported over OTLP; a failure to build the exporter is
/// reported and the service keeps running with local logs only.
pub fn init_tracing(
    service_name: &str,
    log_level: &str,
    format: LogFormat,
    apm: Option<&ApmConfig>,
) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let telemetry = apm.and_then(|apm| match build_tracer(service_name, apm) {
        Ok(tracer) => Some(tracing_opentelemetry::layer().with_tracer(tracer)),
        Err(e) => {
            eprintln!(
                "Failed to initialize OTLP tracer for service '{}' at endpoint '{}': {}",
                service_name, apm.server_url, e
            );
            None
        }
    });
    let apm_active = telemetry.is_some();

    let json_layer = (format == LogFormat::Json).then(|| {
        fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .json()
            .flatten_event(true)
    });
    let pretty_layer = (format == LogFormat::Pretty).then(|| fmt::layer().pretty());

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(telemetry)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
    {
        eprintln!("Tracing subscriber already installed: {}", e);
        return;
    }

    if apm_active {
        tracing::info!(service = %service_name, "APM enabled");
    } else {
        tracing::info!(service = %service_name, "APM disabled");
    }
}

/// Flush pending spans. Call once after the server has stopped.
pub fn shutdown_tracing() {
    opentelemetry::global::shutdown_tracer_provider();
}
