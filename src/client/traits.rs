use std::sync::Arc;

use async_trait::async_trait;

use super::error::ClientError;
use crate::models::{AnalysisReport, DocumentId, DocumentRecord};
use crate::pipeline::import::{FileHandle, UploadMetadata};
use crate::share::ShareRequest;

/// Sends a file plus its classification; returns the server-confirmed record.
#[async_trait]
pub trait UploadClient: Send + Sync {
    async fn upload(
        &self,
        file: &FileHandle,
        metadata: &UploadMetadata,
    ) -> Result<DocumentRecord, ClientError>;
}

/// Analysis status of one document. `ClientError::NotReady` means "ask
/// again later"; any other error is final.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn analysis(&self, id: &DocumentId) -> Result<AnalysisReport, ClientError>;
}

#[async_trait]
pub trait DocumentClient: Send + Sync {
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ClientError>;

    async fn delete_document(&self, id: &DocumentId) -> Result<(), ClientError>;

    async fn download_document(&self, id: &DocumentId) -> Result<Vec<u8>, ClientError>;

    async fn share_document(&self, request: &ShareRequest) -> Result<(), ClientError>;
}

/// Public-key encryption of short secrets before they leave the process.
/// The key is a PEM `PUBLIC KEY` block (see `auth::normalize_public_key`).
#[async_trait]
pub trait Encryptor: Send + Sync {
    async fn encrypt(&self, public_key_pem: &str, plaintext: &str) -> Result<String, ClientError>;
}

/// The collaborators a dashboard needs, as shared trait objects.
#[derive(Clone)]
pub struct Collaborators {
    pub uploads: Arc<dyn UploadClient>,
    pub analysis: Arc<dyn AnalysisClient>,
    pub documents: Arc<dyn DocumentClient>,
}

impl Collaborators {
    /// Use one client for every role.
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: UploadClient + AnalysisClient + DocumentClient + 'static,
    {
        Self {
            uploads: client.clone(),
            analysis: client.clone(),
            documents: client,
        }
    }
}
