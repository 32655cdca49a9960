//! Optimistic uploads reconciled with the backend.
//!
//! `submit_batch` shows a provisional record per file right away, then
//! background tasks upload and poll. Tasks never touch the collection: each
//! sends exactly one `ReconcileEvent` back, and the owner applies events on
//! its own task (`pump`, `step`, `settle`).

use std::collections::HashMap;
use std::future::Future;

use chrono::Utc;
use tokio::sync::mpsc;

use super::collection::{DocumentCollection, Transition};
use super::DashboardError;
use crate::client::Collaborators;
use crate::models::{AnalysisReport, DocumentId, DocumentRecord, DocumentStatus};
use crate::notifications::NotificationCenter;
use crate::pipeline::analysis::{cancel_pair, poll_analysis, PollCancelHandle, PollOutcome, PollPolicy};
use crate::pipeline::import::{FileHandle, UploadMetadata};

/// Message from a background task to the owner.
#[derive(Debug)]
pub enum ReconcileEvent {
    Uploaded {
        provisional: DocumentId,
        record: DocumentRecord,
    },
    UploadFailed {
        provisional: DocumentId,
        error: String,
    },
    AnalysisCompleted {
        id: DocumentId,
        generation: u64,
        report: AnalysisReport,
    },
    AnalysisFailed {
        id: DocumentId,
        generation: u64,
        error: String,
    },
    PollTimedOut {
        id: DocumentId,
        generation: u64,
        attempts: u32,
    },
    PollCancelled {
        id: DocumentId,
        generation: u64,
    },
}

/// Running poll for one document. `generation` tells a poll apart from an
/// earlier one for the same id that is still winding down.
struct PollSlot {
    generation: u64,
    handle: PollCancelHandle,
}

pub struct UploadReconciler {
    collection: DocumentCollection,
    collaborators: Collaborators,
    policy: PollPolicy,
    notifications: NotificationCenter,
    events_tx: mpsc::UnboundedSender<ReconcileEvent>,
    events_rx: mpsc::UnboundedReceiver<ReconcileEvent>,
    polls: HashMap<DocumentId, PollSlot>,
    next_generation: u64,
    /// Spawned tasks whose event has not been applied yet.
    in_flight: usize,
    shut_down: bool,
}

impl UploadReconciler {
    pub fn new(
        collaborators: Collaborators,
        policy: PollPolicy,
        notifications: NotificationCenter,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            collection: DocumentCollection::new(),
            collaborators,
            policy,
            notifications,
            events_tx,
            events_rx,
            polls: HashMap::new(),
            next_generation: 0,
            in_flight: 0,
            shut_down: false,
        }
    }

    pub fn collection(&self) -> &DocumentCollection {
        &self.collection
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Number of background tasks still expected to report.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_polling(&self, id: &DocumentId) -> bool {
        self.polls.contains_key(id)
    }

    /// Insert one provisional `Analyzing` record per file at the head of the
    /// feed and start uploading. Returns the provisional ids in file order.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit_batch(
        &mut self,
        files: Vec<FileHandle>,
        metadata: &UploadMetadata,
    ) -> Vec<DocumentId> {
        let mut ids = Vec::with_capacity(files.len());
        for file in files {
            let record = DocumentRecord::provisional(
                file.name(),
                file.size_bytes(),
                metadata.classification.clone(),
                Utc::now(),
            );
            let provisional = record.id().clone();
            tracing::debug!(doc_id = %provisional, name = %file.name(), "Provisional record inserted");
            self.collection.insert_head(record);
            self.spawn_upload(provisional.clone(), file, metadata.clone());
            ids.push(provisional);
        }
        ids
    }

    fn spawn_upload(&mut self, provisional: DocumentId, file: FileHandle, metadata: UploadMetadata) {
        let uploads = self.collaborators.uploads.clone();
        let task_id = provisional.clone();
        let task = async move {
            match uploads.upload(&file, &metadata).await {
                Ok(record) => ReconcileEvent::Uploaded {
                    provisional: task_id,
                    record,
                },
                Err(e) => ReconcileEvent::UploadFailed {
                    provisional: task_id,
                    error: e.to_string(),
                },
            }
        };
        self.spawn_reporting(
            task,
            ReconcileEvent::UploadFailed {
                provisional,
                error: "upload task aborted".into(),
            },
        );
    }

    fn start_poll(&mut self, id: DocumentId) {
        if self.shut_down || self.polls.contains_key(&id) {
            return;
        }
        let (handle, mut cancel) = cancel_pair();
        self.next_generation += 1;
        let generation = self.next_generation;
        self.polls.insert(
            id.clone(),
            PollSlot {
                generation,
                handle,
            },
        );

        let analysis = self.collaborators.analysis.clone();
        let policy = self.policy.clone();
        let task_id = id.clone();
        let task = async move {
            match poll_analysis(analysis.as_ref(), &task_id, &policy, &mut cancel).await {
                PollOutcome::Completed(report) => ReconcileEvent::AnalysisCompleted {
                    id: task_id,
                    generation,
                    report,
                },
                PollOutcome::Failed(e) => ReconcileEvent::AnalysisFailed {
                    id: task_id,
                    generation,
                    error: e.to_string(),
                },
                PollOutcome::TimedOut { attempts } => ReconcileEvent::PollTimedOut {
                    id: task_id,
                    generation,
                    attempts,
                },
                PollOutcome::Cancelled => ReconcileEvent::PollCancelled {
                    id: task_id,
                    generation,
                },
            }
        };
        tracing::debug!(doc_id = %id, generation, "Analysis polling started");
        self.spawn_reporting(
            task,
            ReconcileEvent::AnalysisFailed {
                id,
                generation,
                error: "analysis task aborted".into(),
            },
        );
    }

    /// Run `task` and forward its event. A panicking task reports
    /// `on_abort` instead, so every spawn yields exactly one event.
    fn spawn_reporting<F>(&mut self, task: F, on_abort: ReconcileEvent)
    where
        F: Future<Output = ReconcileEvent> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let event = match tokio::spawn(task).await {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!(error = %e, "Background task aborted");
                    on_abort
                }
            };
            // The owner may be gone; nothing left to update then.
            let _ = tx.send(event);
        });
    }

    /// Apply every event already received without waiting. Returns how many
    /// were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next event and apply it. Returns false when no task is
    /// left to report.
    pub async fn step(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        match self.events_rx.recv().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    /// Apply events until every spawned task has reported.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    fn apply(&mut self, event: ReconcileEvent) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match event {
            ReconcileEvent::Uploaded { provisional, record } => {
                let id = record.id().clone();
                let analyzing = record.status() == DocumentStatus::Analyzing;
                if !self.collection.replace(&provisional, record) {
                    tracing::warn!(doc_id = %id, provisional = %provisional, "Upload confirmed for a removed record, not polling");
                    return;
                }
                tracing::info!(doc_id = %id, provisional = %provisional, "Upload confirmed");
                if analyzing {
                    self.start_poll(id);
                }
            }
            ReconcileEvent::UploadFailed { provisional, error } => {
                tracing::warn!(doc_id = %provisional, error = %error, "Upload failed");
                if self.collection.fail(&provisional) == Transition::Applied {
                    let name = self.record_name(&provisional);
                    self.notifications.error("Upload failed", Some(&format!("{name}: {error}")));
                }
            }
            ReconcileEvent::AnalysisCompleted {
                id,
                generation,
                report,
            } => {
                self.release_poll(&id, generation);
                let score = report.sensitivity_score;
                match self.collection.complete(&id, report) {
                    Transition::Applied => {
                        tracing::info!(doc_id = %id, score, "Analysis completed");
                        let name = self.record_name(&id);
                        self.notifications.success(
                            "Analysis completed",
                            Some(&format!("{name}: sensitivity {score}")),
                        );
                    }
                    other => tracing::debug!(doc_id = %id, ?other, "Analysis result not applied"),
                }
            }
            ReconcileEvent::AnalysisFailed {
                id,
                generation,
                error,
            } => {
                self.release_poll(&id, generation);
                if self.collection.fail(&id) == Transition::Applied {
                    tracing::warn!(doc_id = %id, error = %error, "Analysis failed");
                    let name = self.record_name(&id);
                    self.notifications.error("Analysis failed", Some(&format!("{name}: {error}")));
                }
            }
            ReconcileEvent::PollTimedOut {
                id,
                generation,
                attempts,
            } => {
                self.release_poll(&id, generation);
                if self.collection.fail(&id) == Transition::Applied {
                    let name = self.record_name(&id);
                    self.notifications.warning(
                        "Analysis timed out",
                        Some(&format!("{name}: no result after {attempts} checks")),
                    );
                }
            }
            ReconcileEvent::PollCancelled { id, generation } => {
                self.release_poll(&id, generation);
                tracing::debug!(doc_id = %id, generation, "Analysis polling cancelled");
            }
        }
    }

    /// Forget the poll for `id` if it is still the one that reported.
    fn release_poll(&mut self, id: &DocumentId, generation: u64) {
        match self.polls.get(id) {
            Some(slot) if slot.generation == generation => {
                self.polls.remove(id);
            }
            Some(slot) => {
                tracing::debug!(
                    doc_id = %id,
                    generation,
                    current = slot.generation,
                    "Stale poll event, newer poll kept"
                );
            }
            None => {}
        }
    }

    fn record_name(&self, id: &DocumentId) -> String {
        self.collection
            .get(id)
            .map(|r| r.name().to_string())
            .unwrap_or_else(|| id.to_string())
    }

    /// Remove a record. Provisional records go away locally; server records
    /// are deleted through the backend first and kept if that fails.
    pub async fn delete(&mut self, id: &DocumentId) -> Result<DocumentRecord, DashboardError> {
        if self.collection.get(id).is_none() {
            return Err(DashboardError::UnknownDocument(id.clone()));
        }
        if !id.is_provisional() {
            self.collaborators.documents.delete_document(id).await?;
        }
        if let Some(slot) = self.polls.remove(id) {
            slot.handle.cancel();
        }
        let removed = self
            .collection
            .remove(id)
            .ok_or_else(|| DashboardError::UnknownDocument(id.clone()))?;
        tracing::info!(doc_id = %id, "Document removed");
        Ok(removed)
    }

    /// Reload server records, keeping uploads in flight at the head. Records
    /// still analysing get a poll; polls for vanished records stop.
    pub async fn refresh(&mut self) -> Result<usize, DashboardError> {
        let records = self.collaborators.documents.list_documents().await?;
        let count = records.len();
        self.collection.replace_confirmed(records);

        let collection = &self.collection;
        self.polls.retain(|id, _| collection.get(id).is_some());
        for id in self.collection.pending_analysis() {
            self.start_poll(id);
        }
        tracing::info!(count, polling = self.polls.len(), "Document list refreshed");
        Ok(count)
    }

    /// Cancel every poll. Records keep their current status and no new
    /// polls start afterwards.
    pub fn shutdown(&mut self) {
        self.shut_down = true;
        for (_, slot) in self.polls.drain() {
            slot.handle.cancel();
        }
    }
}

impl Drop for UploadReconciler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::client::mock::{MockAnalysis, MockClient};
    use crate::models::{Classification, Department, DocumentType, SecurityLevel};

    fn metadata() -> UploadMetadata {
        UploadMetadata::new(Classification {
            document_type: DocumentType::Contract,
            security_level: SecurityLevel::Confidential,
            department: Department::Finance,
            notes: None,
        })
        .unwrap()
    }

    fn file(name: &str, size: usize) -> FileHandle {
        FileHandle::from_bytes(name, "application/pdf", vec![0; size])
    }

    fn report(score: u32) -> AnalysisReport {
        AnalysisReport::new(score, vec![]).unwrap()
    }

    fn reconciler(client: &Arc<MockClient>) -> UploadReconciler {
        UploadReconciler::new(
            Collaborators::from_client(client.clone()),
            PollPolicy::fixed(Duration::from_millis(3000), Duration::from_millis(300_000)),
            NotificationCenter::new(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn single_file_end_to_end() {
        let client = Arc::new(MockClient::new());
        client.script_analysis(
            "a.pdf",
            vec![MockAnalysis::NotReady, MockAnalysis::NotReady, MockAnalysis::Ready(report(42))],
        );
        let mut reconciler = reconciler(&client);

        let ids = reconciler.submit_batch(vec![file("a.pdf", 10)], &metadata());

        // Visible before any upload completes.
        let first = &reconciler.collection().records()[0];
        assert_eq!(first.id(), &ids[0]);
        assert_eq!(first.status(), DocumentStatus::Analyzing);
        assert_eq!(first.size_bytes(), 10);

        reconciler.settle().await;

        let records = reconciler.collection().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), &DocumentId::server("doc-1"));
        assert_eq!(records[0].status(), DocumentStatus::Completed);
        assert_eq!(records[0].sensitivity_score(), Some(42));
        assert_eq!(records[0].findings(), Some(&[][..]));
        assert_eq!(client.analysis_calls(&DocumentId::server("doc-1")), 3);
        assert!(!reconciler.is_polling(&DocumentId::server("doc-1")));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(client.analysis_calls(&DocumentId::server("doc-1")), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_is_inserted_at_head_and_replaced_in_place() {
        let client = Arc::new(MockClient::new());
        client.delay_upload("b.pdf", Duration::from_millis(500));
        let mut reconciler = reconciler(&client);

        let ids = reconciler.submit_batch(vec![file("a.pdf", 1), file("b.pdf", 2)], &metadata());
        let names: Vec<&str> = reconciler.collection().iter().map(|r| r.name()).collect();
        assert_eq!(names, ["b.pdf", "a.pdf"]);

        // a.pdf confirms first; b.pdf is still provisional at the head.
        assert!(reconciler.step().await);
        let records = reconciler.collection().records();
        assert_eq!(records[0].id(), &ids[1]);
        assert_eq!(records[1].id(), &DocumentId::server("doc-1"));
        assert!(reconciler.collection().get(&ids[0]).is_none());

        assert!(reconciler.step().await);
        let records = reconciler.collection().records();
        assert_eq!(records[0].id(), &DocumentId::server("doc-2"));
        assert_eq!(records[0].name(), "b.pdf");
        assert!(records.iter().all(|r| !r.id().is_provisional()));
    }

    #[tokio::test(start_paused = true)]
    async fn upload_failure_marks_error_without_retry() {
        let client = Arc::new(MockClient::new());
        client.fail_upload("bad.pdf");
        let mut reconciler = reconciler(&client);

        let ids = reconciler.submit_batch(vec![file("bad.pdf", 3)], &metadata());
        reconciler.settle().await;

        let record = reconciler.collection().get(&ids[0]).unwrap();
        assert_eq!(record.status(), DocumentStatus::Error);
        assert!(record.sensitivity_score().is_none());
        assert_eq!(client.uploads(), 0);
        assert_eq!(client.total_analysis_calls(), 0);
        assert_eq!(reconciler.notifications().current()[0].title, "Upload failed");
    }

    #[tokio::test(start_paused = true)]
    async fn analysis_error_marks_error() {
        let client = Arc::new(MockClient::new());
        client.script_analysis("a.pdf", vec![MockAnalysis::Fail(500)]);
        let mut reconciler = reconciler(&client);

        reconciler.submit_batch(vec![file("a.pdf", 1)], &metadata());
        reconciler.settle().await;

        let record = &reconciler.collection().records()[0];
        assert_eq!(record.status(), DocumentStatus::Error);
        assert_eq!(client.analysis_calls(record.id()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_stops_polling_and_marks_error() {
        let client = Arc::new(MockClient::new());
        let mut reconciler = reconciler(&client);
        let started = Instant::now();

        reconciler.submit_batch(vec![file("slow.pdf", 1)], &metadata());
        reconciler.settle().await;

        let id = DocumentId::server("doc-1");
        assert!(started.elapsed() >= Duration::from_millis(300_000));
        assert_eq!(reconciler.collection().get(&id).unwrap().status(), DocumentStatus::Error);
        assert_eq!(reconciler.notifications().current()[0].title, "Analysis timed out");
        let calls = client.analysis_calls(&id);
        assert_eq!(calls, 99);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(client.analysis_calls(&id), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_collaborator_marks_error() {
        let client = Arc::new(MockClient::new());
        client.script_analysis("a.pdf", vec![MockAnalysis::Panic]);
        let mut reconciler = reconciler(&client);

        reconciler.submit_batch(vec![file("a.pdf", 1)], &metadata());
        reconciler.settle().await;

        assert_eq!(reconciler.collection().records()[0].status(), DocumentStatus::Error);
        assert_eq!(reconciler.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_are_independent() {
        let client = Arc::new(MockClient::new());
        client.script_analysis("a.pdf", vec![MockAnalysis::Ready(report(10))]);
        client.script_analysis("b.pdf", vec![MockAnalysis::Fail(502)]);
        client.script_analysis(
            "c.pdf",
            vec![MockAnalysis::NotReady, MockAnalysis::Ready(report(90))],
        );
        let mut reconciler = reconciler(&client);

        reconciler.submit_batch(
            vec![file("a.pdf", 1), file("b.pdf", 1), file("c.pdf", 1)],
            &metadata(),
        );
        reconciler.settle().await;

        let status_of = |name: &str| {
            reconciler
                .collection()
                .iter()
                .find(|r| r.name() == name)
                .map(|r| (r.status(), r.sensitivity_score()))
                .unwrap()
        };
        assert_eq!(status_of("a.pdf"), (DocumentStatus::Completed, Some(10)));
        assert_eq!(status_of("b.pdf"), (DocumentStatus::Error, None));
        assert_eq!(status_of("c.pdf"), (DocumentStatus::Completed, Some(90)));
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_provisional_is_local_and_upload_result_is_dropped() {
        let client = Arc::new(MockClient::new());
        client.delay_upload("a.pdf", Duration::from_millis(100));
        let mut reconciler = reconciler(&client);

        let ids = reconciler.submit_batch(vec![file("a.pdf", 1)], &metadata());
        reconciler.delete(&ids[0]).await.unwrap();
        assert!(reconciler.collection().is_empty());

        reconciler.settle().await;
        assert!(reconciler.collection().is_empty());
        assert!(client.deleted().is_empty());
        assert!(!reconciler.is_polling(&DocumentId::server("doc-1")));
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_server_record_cancels_its_poll() {
        let client = Arc::new(MockClient::new());
        let mut reconciler = reconciler(&client);

        reconciler.submit_batch(vec![file("a.pdf", 1)], &metadata());
        assert!(reconciler.step().await);
        let id = DocumentId::server("doc-1");
        assert!(reconciler.is_polling(&id));

        tokio::time::sleep(Duration::from_millis(7000)).await;
        reconciler.delete(&id).await.unwrap();
        reconciler.settle().await;

        assert_eq!(client.deleted(), vec![id.clone()]);
        assert!(reconciler.collection().is_empty());
        assert_eq!(client.analysis_calls(&id), 2);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(client.analysis_calls(&id), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_delete_keeps_record_and_poll() {
        let client = Arc::new(MockClient::new());
        client.fail_deletes(true);
        let mut reconciler = reconciler(&client);

        reconciler.submit_batch(vec![file("a.pdf", 1)], &metadata());
        assert!(reconciler.step().await);
        let id = DocumentId::server("doc-1");

        let err = reconciler.delete(&id).await.unwrap_err();
        assert!(matches!(err, DashboardError::Client(_)));
        assert!(reconciler.collection().get(&id).is_some());
        assert!(reconciler.is_polling(&id));

        assert!(matches!(
            reconciler.delete(&DocumentId::server("ghost")).await,
            Err(DashboardError::UnknownDocument(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_replaces_server_records_and_polls_pending() {
        let client = Arc::new(MockClient::new());
        let pending = DocumentRecord::confirmed(
            "doc-40",
            "old.pdf",
            5,
            metadata().classification,
            Utc::now(),
        );
        client.set_listing(vec![pending]);
        client.script_analysis_for_id(
            &DocumentId::server("doc-40"),
            vec![MockAnalysis::Ready(report(65))],
        );
        client.delay_upload("new.pdf", Duration::from_secs(1));
        let mut reconciler = reconciler(&client);

        let ids = reconciler.submit_batch(vec![file("new.pdf", 1)], &metadata());
        assert_eq!(reconciler.refresh().await.unwrap(), 1);

        let records = reconciler.collection().records();
        assert_eq!(records[0].id(), &ids[0]);
        assert_eq!(records[1].id(), &DocumentId::server("doc-40"));
        assert!(reconciler.is_polling(&DocumentId::server("doc-40")));

        reconciler.settle().await;
        let old = reconciler.collection().get(&DocumentId::server("doc-40")).unwrap();
        assert_eq!(old.sensitivity_score(), Some(65));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_keeps_completed_record_over_stale_server_copy() {
        let client = Arc::new(MockClient::new());
        client.script_analysis("a.pdf", vec![MockAnalysis::Ready(report(42))]);
        let mut reconciler = reconciler(&client);

        reconciler.submit_batch(vec![file("a.pdf", 1)], &metadata());
        reconciler.settle().await;
        let id = DocumentId::server("doc-1");
        assert_eq!(client.analysis_calls(&id), 1);

        // The server has not caught up with the analysis yet.
        client.set_listing(vec![DocumentRecord::confirmed(
            "doc-1",
            "a.pdf",
            1,
            metadata().classification,
            Utc::now(),
        )]);
        reconciler.refresh().await.unwrap();

        let record = reconciler.collection().get(&id).unwrap();
        assert_eq!(record.status(), DocumentStatus::Completed);
        assert_eq!(record.sensitivity_score(), Some(42));
        assert!(!reconciler.is_polling(&id));
        assert_eq!(reconciler.in_flight(), 0);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(client.analysis_calls(&id), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_cancel_event_keeps_newer_poll() {
        let client = Arc::new(MockClient::new());
        let id = DocumentId::server("doc-40");
        let listed = || {
            vec![DocumentRecord::confirmed(
                "doc-40",
                "old.pdf",
                5,
                metadata().classification,
                Utc::now(),
            )]
        };
        client.script_analysis_for_id(&id, vec![MockAnalysis::Ready(report(30))]);
        let mut reconciler = reconciler(&client);

        client.set_listing(listed());
        reconciler.refresh().await.unwrap();
        // Vanishes, which cancels the first poll, then comes back before
        // the cancellation has been applied.
        client.set_listing(vec![]);
        reconciler.refresh().await.unwrap();
        client.set_listing(listed());
        reconciler.refresh().await.unwrap();
        assert_eq!(reconciler.in_flight(), 2);

        // First event is the cancelled poll reporting back.
        assert!(reconciler.step().await);
        assert!(reconciler.is_polling(&id));
        assert_eq!(reconciler.in_flight(), 1);

        reconciler.settle().await;
        let record = reconciler.collection().get(&id).unwrap();
        assert_eq!(record.status(), DocumentStatus::Completed);
        assert_eq!(record.sensitivity_score(), Some(30));
        assert!(!reconciler.is_polling(&id));
        assert_eq!(client.analysis_calls(&id), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_polls_and_keeps_status() {
        let client = Arc::new(MockClient::new());
        let mut reconciler = reconciler(&client);

        reconciler.submit_batch(vec![file("a.pdf", 1), file("b.pdf", 1)], &metadata());
        assert!(reconciler.step().await);
        assert!(reconciler.step().await);

        reconciler.shutdown();
        reconciler.settle().await;

        assert!(reconciler
            .collection()
            .iter()
            .all(|r| r.status() == DocumentStatus::Analyzing));
        assert_eq!(client.total_analysis_calls(), 0);
    }
}
