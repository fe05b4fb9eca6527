use crate::config::MongoConfig;
use mongodb::{
    bson::{doc, Document},
    options::{ClientOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::retry::retry_with_backoff;
use std::time::Duration;

pub const EMPLOYEES_COLLECTION: &str = "employees";

const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    /// Connect and verify the server answers a ping, retrying with
    /// exponential backoff per `config.connect_retry`.
    pub async fn connect(config: &MongoConfig) -> Result<Self, AppError> {
        let redacted_uri = config.redacted_uri();
        tracing::info!(uri = %redacted_uri, database = %config.database, "Connecting to MongoDB");

        let db = retry_with_backoff(&config.connect_retry, "mongodb_connect", || {
            Self::try_connect(config.uri.expose_secret(), &config.database)
        })
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", redacted_uri, e);
            AppError::from(e)
        })?;

        tracing::info!(database = %config.database, "Successfully connected to MongoDB database");
        Ok(db)
    }

    async fn try_connect(uri: &str, database: &str) -> Result<Self, mongodb::error::Error> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some("employee-service".to_string());
        options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);

        let client = MongoClient::with_options(options)?;
        let db = Self {
            db: client.database(database),
            client,
        };
        db.ping().await?;
        Ok(db)
    }

    async fn ping(&self) -> Result<(), mongodb::error::Error> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    /// Unique index on the business key; it makes concurrent creates with the
    /// same `id` fail with a duplicate-key error instead of both inserting.
    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for employee-service");

        let employee_id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .name("employee_id_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.employees()
            .create_index(employee_id_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create unique id index on employees collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created unique index on employees.id");

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.ping().await.map_err(|e| {
            tracing::error!("MongoDB health check failed: {}", e);
            AppError::from(e)
        })
    }

    /// Close pooled connections once no more requests will be served.
    pub async fn shutdown(&self) {
        self.client.clone().shutdown().await;
        tracing::info!("MongoDB client shut down");
    }

    pub fn employees(&self) -> Collection<Document> {
        self.db.collection(EMPLOYEES_COLLECTION)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
