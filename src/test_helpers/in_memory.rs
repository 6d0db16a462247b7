//! # In-Memory Strategy
//!
//! A `StorageStrategy` backed by a `BTreeMap`. Operations can be made to fail
//! on demand and the health probe can be scripted to report any status, error
//! out, or stall, which is enough to drive the breaker and factory through
//! every path without real backends.

use crate::storage::{
    FileRef, HealthRecord, HealthStatus, StorageError, StorageResult, StorageStrategy,
    UploadRequest,
};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum HealthScript {
    Status(HealthStatus),
    Error(String),
}

#[derive(Debug, Clone)]
struct StoredFile {
    content: Vec<u8>,
    content_type: Option<String>,
}

#[derive(Debug)]
pub struct InMemoryStrategy {
    id: String,
    files: RwLock<BTreeMap<String, StoredFile>>,
    directories: RwLock<BTreeSet<String>>,
    failing: AtomicBool,
    health: Mutex<HealthScript>,
    health_delay: Mutex<Option<Duration>>,
    operations: AtomicUsize,
    probes: AtomicUsize,
}

impl InMemoryStrategy {
    /// Healthy, empty strategy
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            files: RwLock::new(BTreeMap::new()),
            directories: RwLock::new(BTreeSet::new()),
            failing: AtomicBool::new(false),
            health: Mutex::new(HealthScript::Status(HealthStatus::Healthy)),
            health_delay: Mutex::new(None),
            operations: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Make every storage operation fail with a retryable backend error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_health(&self, status: HealthStatus) {
        *self.health.lock() = HealthScript::Status(status);
    }

    /// Make the health probe return an error
    pub fn fail_health_probe(&self, message: impl Into<String>) {
        *self.health.lock() = HealthScript::Error(message.into());
    }

    /// Delay every health probe
    pub fn set_health_delay(&self, delay: Duration) {
        *self.health_delay.lock() = Some(delay);
    }

    /// Storage operations invoked so far, failed ones included
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.read().contains_key(path)
    }

    fn begin(&self) -> StorageResult<()> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::backend(&self.id, "injected failure"));
        }
        Ok(())
    }

    fn file_ref(&self, path: &str, file: &StoredFile) -> FileRef {
        FileRef {
            path: path.to_string(),
            size: file.content.len() as u64,
            content_type: file.content_type.clone(),
            strategy_id: self.id.clone(),
        }
    }

    fn validate_path(path: &str) -> StorageResult<()> {
        if path.trim().is_empty() {
            return Err(StorageError::InvalidInput("path must not be empty".to_string()));
        }
        Ok(())
    }

    fn read(&self, path: &str) -> StorageResult<StoredFile> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::not_found(path))
    }
}

#[async_trait]
impl StorageStrategy for InMemoryStrategy {
    async fn upload(&self, request: UploadRequest) -> StorageResult<FileRef> {
        self.begin()?;
        Self::validate_path(&request.path)?;

        let file = StoredFile {
            content: request.content,
            content_type: request.content_type,
        };
        let file_ref = self.file_ref(&request.path, &file);
        self.files.write().insert(request.path, file);
        Ok(file_ref)
    }

    async fn download(&self, file: &FileRef) -> StorageResult<Vec<u8>> {
        self.begin()?;
        Ok(self.read(&file.path)?.content)
    }

    async fn delete(&self, file: &FileRef) -> StorageResult<()> {
        self.begin()?;
        self.files
            .write()
            .remove(&file.path)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(&file.path))
    }

    async fn exists(&self, file: &FileRef) -> StorageResult<bool> {
        self.begin()?;
        Ok(self.contains(&file.path))
    }

    async fn list(&self, prefix: Option<&str>) -> StorageResult<Vec<FileRef>> {
        self.begin()?;
        let files = self.files.read();
        Ok(files
            .iter()
            .filter(|(path, _)| prefix.map_or(true, |p| path.starts_with(p)))
            .map(|(path, file)| self.file_ref(path, file))
            .collect())
    }

    async fn copy_file(&self, source: &FileRef, destination: &str) -> StorageResult<()> {
        self.begin()?;
        Self::validate_path(destination)?;
        let file = self.read(&source.path)?;
        self.files.write().insert(destination.to_string(), file);
        Ok(())
    }

    async fn move_file(&self, source: &FileRef, destination: &str) -> StorageResult<()> {
        self.begin()?;
        Self::validate_path(destination)?;
        let mut files = self.files.write();
        let file = files
            .remove(&source.path)
            .ok_or_else(|| StorageError::not_found(&source.path))?;
        files.insert(destination.to_string(), file);
        Ok(())
    }

    async fn create_directory(&self, path: &str) -> StorageResult<()> {
        self.begin()?;
        Self::validate_path(path)?;
        self.directories.write().insert(path.trim_end_matches('/').to_string());
        Ok(())
    }

    async fn get_health(&self) -> StorageResult<HealthRecord> {
        self.probes.fetch_add(1, Ordering::SeqCst);

        let delay = *self.health_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let script = self.health.lock().clone();
        match script {
            HealthScript::Status(status) => {
                let total = 1024 * 1024;
                let used = self.files.read().values().map(|f| f.content.len() as u64).sum::<u64>();
                Ok(HealthRecord {
                    total_capacity: total,
                    available_capacity: total.saturating_sub(used),
                    ..HealthRecord::with_status(status, 1)
                })
            }
            HealthScript::Error(message) => Err(StorageError::HealthProbe {
                strategy_id: self.id.clone(),
                message,
            }),
        }
    }
}
