use crate::models::{Employee, EmployeeUpdate};
use crate::services::database::MongoDb;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{self, doc, Bson, Document},
    error::{ErrorKind, WriteError, WriteFailure},
    options::FindOptions,
    Collection,
};
use service_core::error::AppError;
use std::sync::Mutex;
use thiserror::Error;

/// MongoDB server code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Employee with id '{0}' already exists")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Malformed employee document: {0}")]
    Malformed(#[from] bson::de::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => {
                AppError::Conflict(anyhow::anyhow!("Employee with this ID already exists"))
            }
            StoreError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            StoreError::Malformed(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            StoreError::Unavailable(msg) => AppError::DatabaseError(anyhow::anyhow!(msg)),
        }
    }
}

/// Persistence operations the HTTP handlers rely on. Each method is a single
/// storage round trip.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Employee>, StoreError>;

    /// Insert a new record, returning the storage-assigned identifier as an
    /// opaque string. Fails with [`StoreError::Duplicate`] if `id` is taken.
    async fn insert(&self, employee: &Employee) -> Result<String, StoreError>;

    /// All records in storage-native order.
    async fn list(&self) -> Result<Vec<Employee>, StoreError>;

    /// Returns the number of records removed (0 or 1).
    async fn delete_by_id(&self, id: &str) -> Result<u64, StoreError>;

    /// Returns the number of records whose stored values actually changed.
    async fn update_fields(&self, id: &str, update: &EmployeeUpdate) -> Result<u64, StoreError>;

    /// Release storage resources once the server has stopped.
    async fn close(&self) {}
}

/// [`EmployeeStore`] backed by the `employees` collection.
#[derive(Clone)]
pub struct MongoEmployeeStore {
    db: MongoDb,
    employees: Collection<Document>,
}

impl MongoEmployeeStore {
    pub fn new(db: MongoDb) -> Self {
        Self {
            employees: db.employees(),
            db,
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError {
            code: DUPLICATE_KEY_CODE,
            ..
        }))
    )
}

fn inserted_id_to_string(id: Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s,
        other => other.to_string(),
    }
}

#[async_trait]
impl EmployeeStore for MongoEmployeeStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.db
            .health_check()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Employee>, StoreError> {
        match self.employees.find_one(doc! { "id": id }, None).await? {
            Some(document) => Ok(Some(Employee::from_wire(document)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, employee: &Employee) -> Result<String, StoreError> {
        match self.employees.insert_one(employee.to_wire(), None).await {
            Ok(result) => Ok(inserted_id_to_string(result.inserted_id)),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate(employee.id.clone())),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<Employee>, StoreError> {
        let options = FindOptions::builder()
            .projection(doc! { "_id": 0 })
            .build();
        let cursor = self.employees.find(doc! {}, options).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        documents
            .into_iter()
            .map(|document| Employee::from_wire(document).map_err(StoreError::from))
            .collect()
    }

    async fn delete_by_id(&self, id: &str) -> Result<u64, StoreError> {
        let result = self.employees.delete_one(doc! { "id": id }, None).await?;
        Ok(result.deleted_count)
    }

    async fn update_fields(&self, id: &str, update: &EmployeeUpdate) -> Result<u64, StoreError> {
        if update.is_empty() {
            return Ok(0);
        }

        let result = self
            .employees
            .update_one(
                doc! { "id": id },
                doc! { "$set": update.to_set_document() },
                None,
            )
            .await?;
        Ok(result.modified_count)
    }

    async fn close(&self) {
        self.db.shutdown().await;
    }
}

/// In-process [`EmployeeStore`] with the same observable semantics as the
/// MongoDB store: insertion-ordered listing, unique `id`, and a modified
/// count of zero when an update writes identical values.
#[derive(Default)]
pub struct InMemoryEmployeeStore {
    employees: Mutex<Vec<(String, Employee)>>,
    next_object_id: Mutex<u64>,
}

impl InMemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_employees(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Vec<(String, Employee)>>, StoreError> {
        self.employees
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("In-memory store mutex poisoned: {}", e)))
    }

    fn next_object_id(&self) -> Result<String, StoreError> {
        let mut counter = self
            .next_object_id
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("In-memory store mutex poisoned: {}", e)))?;
        *counter += 1;
        Ok(format!("{:024x}", *counter))
    }
}

#[async_trait]
impl EmployeeStore for InMemoryEmployeeStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.lock_employees().map(|_| ())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Employee>, StoreError> {
        Ok(self
            .lock_employees()?
            .iter()
            .find(|(_, e)| e.id == id)
            .map(|(_, e)| e.clone()))
    }

    async fn insert(&self, employee: &Employee) -> Result<String, StoreError> {
        let object_id = self.next_object_id()?;
        let mut employees = self.lock_employees()?;
        if employees.iter().any(|(_, e)| e.id == employee.id) {
            return Err(StoreError::Duplicate(employee.id.clone()));
        }
        employees.push((object_id.clone(), employee.clone()));
        Ok(object_id)
    }

    async fn list(&self) -> Result<Vec<Employee>, StoreError> {
        Ok(self
            .lock_employees()?
            .iter()
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn delete_by_id(&self, id: &str) -> Result<u64, StoreError> {
        let mut employees = self.lock_employees()?;
        match employees.iter().position(|(_, e)| e.id == id) {
            Some(index) => {
                employees.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn update_fields(&self, id: &str, update: &EmployeeUpdate) -> Result<u64, StoreError> {
        let mut employees = self.lock_employees()?;
        let modified = employees
            .iter_mut()
            .find(|(_, e)| e.id == id)
            .is_some_and(|(_, e)| update.apply(e));
        Ok(u64::from(modified))
    }
}
