#![allow(dead_code)]

use employee_service::config::{EmployeeConfig, MongoConfig};
use employee_service::services::{EmployeeStore, InMemoryEmployeeStore};
use employee_service::startup::Application;
use secrecy::Secret;
use serde_json::Value;
use service_core::config::Config as CoreConfig;
use service_core::retry::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;

pub fn test_config(mongodb_uri: &str, database: &str) -> EmployeeConfig {
    EmployeeConfig {
        common: CoreConfig {
            port: 0, // Random port for testing
            log_level: "error".to_string(),
            log_json: true,
        },
        mongodb: MongoConfig {
            uri: Secret::new(mongodb_uri.to_string()),
            database: database.to_string(),
            connect_retry: RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::from_millis(10),
            },
        },
        apm: None,
        route_prefix: None,
        debug: false,
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<InMemoryEmployeeStore>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_prefix(None).await
    }

    pub async fn spawn_with_prefix(route_prefix: Option<&str>) -> Self {
        let mut config = test_config("mongodb://localhost:27017", "unused");
        config.route_prefix = route_prefix.map(str::to_string);
        let prefix = config.route_prefix.clone().unwrap_or_default();

        let store = Arc::new(InMemoryEmployeeStore::new());
        let dyn_store: Arc<dyn EmployeeStore> = store.clone();

        let app = Application::build_with_store(config, dyn_store)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("http://127.0.0.1:{}{}/health", port, prefix);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address: format!("http://127.0.0.1:{}{}", port, prefix),
            port,
            store,
            client,
        }
    }

    pub async fn add_employee(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}/add-employee", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn list_employees(&self) -> Vec<Value> {
        let response = self
            .client
            .get(format!("{}/employees", self.address))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.expect("Failed to parse JSON")
    }

    pub async fn delete_employee(&self, query: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}/delete-employee{}", self.address, query))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn update_employee(&self, body: &Value) -> reqwest::Response {
        self.client
            .put(format!("{}/update-employee", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
