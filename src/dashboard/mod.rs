//! Page-level owner of the document feed.
//!
//! `Dashboard` wraps the upload reconciler with the feed's view state
//! (search criteria, statistics) and the per-document actions.

pub mod collection;
pub mod filter;
pub mod reconciler;
pub mod stats;

pub use collection::{DocumentCollection, Transition};
pub use filter::{filter_documents, filter_documents_now};
pub use reconciler::{ReconcileEvent, UploadReconciler};
pub use stats::{DashboardStats, SensitivityBand, AT_RISK_THRESHOLD};

use std::path::Path;

use chrono::{DateTime, TimeZone};
use thiserror::Error;

use crate::client::{ClientError, Collaborators};
use crate::models::{DocumentFilter, DocumentId, DocumentRecord};
use crate::notifications::NotificationCenter;
use crate::pipeline::analysis::PollPolicy;
use crate::pipeline::import::{FileHandle, UploadMetadata};
use crate::share::{ShareError, ShareRequest};

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Unknown document: {0}")]
    UnknownDocument(DocumentId),

    #[error("Document {0} has not been uploaded yet")]
    NotUploaded(DocumentId),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Share(#[from] ShareError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Dashboard {
    reconciler: UploadReconciler,
    filter: DocumentFilter,
}

impl Dashboard {
    pub fn new(
        collaborators: Collaborators,
        policy: PollPolicy,
        notifications: NotificationCenter,
    ) -> Self {
        Self {
            reconciler: UploadReconciler::new(collaborators, policy, notifications),
            filter: DocumentFilter::default(),
        }
    }

    pub fn reconciler(&self) -> &UploadReconciler {
        &self.reconciler
    }

    pub fn reconciler_mut(&mut self) -> &mut UploadReconciler {
        &mut self.reconciler
    }

    pub fn records(&self) -> &[DocumentRecord] {
        self.reconciler.collection().records()
    }

    pub fn submit_batch(
        &mut self,
        files: Vec<FileHandle>,
        metadata: &UploadMetadata,
    ) -> Vec<DocumentId> {
        self.reconciler.submit_batch(files, metadata)
    }

    pub async fn settle(&mut self) {
        self.reconciler.settle().await;
    }

    pub async fn refresh(&mut self) -> Result<usize, DashboardError> {
        self.reconciler.refresh().await
    }

    pub async fn delete(&mut self, id: &DocumentId) -> Result<DocumentRecord, DashboardError> {
        let removed = self.reconciler.delete(id).await;
        match &removed {
            Ok(record) => {
                self.reconciler
                    .notifications()
                    .success("Document deleted", Some(record.name()));
            }
            Err(e) => {
                self.reconciler
                    .notifications()
                    .error("Delete failed", Some(&e.to_string()));
            }
        }
        removed
    }

    pub fn filter(&self) -> &DocumentFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: DocumentFilter) {
        self.filter = filter;
    }

    /// Records passing the current criteria, evaluated at `now`.
    pub fn visible_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<&DocumentRecord> {
        filter_documents(self.records(), &self.filter, now)
    }

    pub fn visible(&self) -> Vec<&DocumentRecord> {
        filter_documents_now(self.records(), &self.filter)
    }

    /// Statistics over the whole feed, ignoring the criteria.
    pub fn stats(&self) -> DashboardStats {
        DashboardStats::from_records(self.records())
    }

    pub async fn share(&self, request: &ShareRequest) -> Result<(), DashboardError> {
        if self.reconciler.collection().get(&request.document_id).is_none() {
            return Err(DashboardError::UnknownDocument(request.document_id.clone()));
        }
        request.validate()?;
        self.reconciler
            .collaborators()
            .documents
            .share_document(request)
            .await?;
        tracing::info!(
            doc_id = %request.document_id,
            recipients = request.user_ids.len(),
            permission = request.permission.as_str(),
            "Document shared"
        );
        self.reconciler.notifications().success(
            "Document shared",
            Some(&format!("Shared with {} user(s)", request.user_ids.len())),
        );
        Ok(())
    }

    /// Fetch the original file and write it to `dest`. Returns the byte count.
    pub async fn download(&self, id: &DocumentId, dest: &Path) -> Result<u64, DashboardError> {
        if self.reconciler.collection().get(id).is_none() {
            return Err(DashboardError::UnknownDocument(id.clone()));
        }
        if id.is_provisional() {
            return Err(DashboardError::NotUploaded(id.clone()));
        }
        let bytes = self
            .reconciler
            .collaborators()
            .documents
            .download_document(id)
            .await?;
        tokio::fs::write(dest, &bytes).await?;
        tracing::info!(doc_id = %id, path = %dest.display(), bytes = bytes.len(), "Document downloaded");
        Ok(bytes.len() as u64)
    }

    pub fn shutdown(&mut self) {
        self.reconciler.shutdown();
    }
}
