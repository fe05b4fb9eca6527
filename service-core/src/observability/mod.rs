pub mod logging;

pub use logging::{ApmConfig, LogFormat, init_tracing, shutdown_tracing};
