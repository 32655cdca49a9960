//! Scripted in-memory collaborators for tests and offline runs.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::error::ClientError;
use super::traits::{AnalysisClient, DocumentClient, Encryptor, UploadClient};
use crate::models::{AnalysisReport, DocumentId, DocumentRecord};
use crate::pipeline::import::{FileHandle, UploadMetadata};
use crate::share::ShareRequest;

/// One scripted answer of the analysis endpoint.
#[derive(Debug, Clone)]
pub enum MockAnalysis {
    Ready(AnalysisReport),
    NotReady,
    /// Non-404 HTTP failure with this status.
    Fail(u16),
    /// The collaborator blows up instead of answering.
    Panic,
}

impl MockAnalysis {
    fn into_result(self) -> Result<AnalysisReport, ClientError> {
        match self {
            Self::Ready(report) => Ok(report),
            Self::NotReady => Err(ClientError::NotReady),
            Self::Fail(status) => Err(ClientError::Status {
                status,
                body: "scripted failure".into(),
            }),
            Self::Panic => panic!("scripted analysis panic"),
        }
    }
}

/// In-memory backend. Uploads get ids `doc-1`, `doc-2`, ... in call order.
///
/// Analysis answers are scripted per file name (or per id); the last
/// scripted answer repeats, and unscripted documents stay "not ready".
#[derive(Default)]
pub struct MockClient {
    next_id: AtomicU32,
    upload_delay: Mutex<HashMap<String, Duration>>,
    failing_uploads: Mutex<HashSet<String>>,
    names_by_id: Mutex<HashMap<DocumentId, String>>,
    scripts_by_name: Mutex<HashMap<String, VecDeque<MockAnalysis>>>,
    scripts_by_id: Mutex<HashMap<DocumentId, VecDeque<MockAnalysis>>>,
    analysis_calls: Mutex<HashMap<DocumentId, u32>>,
    listing: Mutex<Vec<DocumentRecord>>,
    deleted: Mutex<Vec<DocumentId>>,
    fail_deletes: AtomicBool,
    shared: Mutex<Vec<ShareRequest>>,
    files: Mutex<HashMap<DocumentId, Vec<u8>>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_upload(&self, file_name: &str) {
        lock(&self.failing_uploads).insert(file_name.to_string());
    }

    pub fn delay_upload(&self, file_name: &str, delay: Duration) {
        lock(&self.upload_delay).insert(file_name.to_string(), delay);
    }

    pub fn script_analysis(&self, file_name: &str, answers: Vec<MockAnalysis>) {
        lock(&self.scripts_by_name).insert(file_name.to_string(), answers.into());
    }

    pub fn script_analysis_for_id(&self, id: &DocumentId, answers: Vec<MockAnalysis>) {
        lock(&self.scripts_by_id).insert(id.clone(), answers.into());
    }

    pub fn set_listing(&self, records: Vec<DocumentRecord>) {
        *lock(&self.listing) = records;
    }

    pub fn store_file(&self, id: &DocumentId, bytes: Vec<u8>) {
        lock(&self.files).insert(id.clone(), bytes);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn analysis_calls(&self, id: &DocumentId) -> u32 {
        lock(&self.analysis_calls).get(id).copied().unwrap_or(0)
    }

    pub fn total_analysis_calls(&self) -> u32 {
        lock(&self.analysis_calls).values().sum()
    }

    pub fn uploads(&self) -> u32 {
        self.next_id.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<DocumentId> {
        lock(&self.deleted).clone()
    }

    pub fn shared(&self) -> Vec<ShareRequest> {
        lock(&self.shared).clone()
    }

    fn next_answer(&self, id: &DocumentId) -> MockAnalysis {
        let mut by_id = lock(&self.scripts_by_id);
        if let Some(queue) = by_id.get_mut(id) {
            return pop_repeating_last(queue);
        }
        drop(by_id);

        let name = lock(&self.names_by_id).get(id).cloned();
        let mut by_name = lock(&self.scripts_by_name);
        name.and_then(|n| by_name.get_mut(&n).map(pop_repeating_last))
            .unwrap_or(MockAnalysis::NotReady)
    }
}

fn pop_repeating_last(queue: &mut VecDeque<MockAnalysis>) -> MockAnalysis {
    if queue.len() > 1 {
        queue.pop_front().unwrap_or(MockAnalysis::NotReady)
    } else {
        queue.front().cloned().unwrap_or(MockAnalysis::NotReady)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl UploadClient for MockClient {
    async fn upload(
        &self,
        file: &FileHandle,
        metadata: &UploadMetadata,
    ) -> Result<DocumentRecord, ClientError> {
        let delay = lock(&self.upload_delay).get(file.name()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if lock(&self.failing_uploads).contains(file.name()) {
            return Err(ClientError::Status {
                status: 500,
                body: "upload rejected".into(),
            });
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = DocumentRecord::confirmed(
            format!("doc-{n}"),
            file.name(),
            file.size_bytes(),
            metadata.classification.clone(),
            Utc::now(),
        );
        lock(&self.names_by_id).insert(record.id().clone(), file.name().to_string());
        Ok(record)
    }
}

#[async_trait]
impl AnalysisClient for MockClient {
    async fn analysis(&self, id: &DocumentId) -> Result<AnalysisReport, ClientError> {
        *lock(&self.analysis_calls).entry(id.clone()).or_insert(0) += 1;
        self.next_answer(id).into_result()
    }
}

#[async_trait]
impl DocumentClient for MockClient {
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ClientError> {
        Ok(lock(&self.listing).clone())
    }

    async fn delete_document(&self, id: &DocumentId) -> Result<(), ClientError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 500,
                body: "delete rejected".into(),
            });
        }
        lock(&self.deleted).push(id.clone());
        Ok(())
    }

    async fn download_document(&self, id: &DocumentId) -> Result<Vec<u8>, ClientError> {
        lock(&self.files)
            .get(id)
            .cloned()
            .ok_or_else(|| ClientError::Status {
                status: 404,
                body: format!("no file for {id}"),
            })
    }

    async fn share_document(&self, request: &ShareRequest) -> Result<(), ClientError> {
        lock(&self.shared).push(request.clone());
        Ok(())
    }
}

/// Marks plaintext instead of encrypting it. Offline use only.
pub struct MockEncryptor;

#[async_trait]
impl Encryptor for MockEncryptor {
    async fn encrypt(&self, public_key_pem: &str, plaintext: &str) -> Result<String, ClientError> {
        if !public_key_pem.starts_with("-----BEGIN PUBLIC KEY-----") {
            return Err(ClientError::Encryption("public key is not a PEM block".into()));
        }
        Ok(format!("enc({plaintext})"))
    }
}
