use std::collections::HashMap;

use crate::models::{AnalysisReport, DocumentId, DocumentRecord, DocumentStatus};

/// Result of applying a status change to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// Record is already terminal; nothing changed.
    Ignored,
    /// No record with that id (deleted meanwhile).
    Missing,
}

/// Ordered document feed, most recent first.
#[derive(Debug, Clone, Default)]
pub struct DocumentCollection {
    records: Vec<DocumentRecord>,
}

impl DocumentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentRecord> {
        self.records.iter()
    }

    pub fn position(&self, id: &DocumentId) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    pub fn get(&self, id: &DocumentId) -> Option<&DocumentRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn insert_head(&mut self, record: DocumentRecord) {
        self.records.insert(0, record);
    }

    /// Swap the record `id` for `record`, keeping its position. Returns
    /// false when `id` is gone.
    pub fn replace(&mut self, id: &DocumentId, record: DocumentRecord) -> bool {
        match self.position(id) {
            Some(index) => {
                self.records[index] = record;
                true
            }
            None => false,
        }
    }

    pub fn complete(&mut self, id: &DocumentId, report: AnalysisReport) -> Transition {
        self.transition(id, |record| record.complete(report))
    }

    pub fn fail(&mut self, id: &DocumentId) -> Transition {
        self.transition(id, DocumentRecord::fail)
    }

    fn transition(
        &mut self,
        id: &DocumentId,
        apply: impl FnOnce(&mut DocumentRecord) -> bool,
    ) -> Transition {
        match self.records.iter_mut().find(|r| r.id() == id) {
            None => Transition::Missing,
            Some(record) => {
                if apply(record) {
                    Transition::Applied
                } else {
                    Transition::Ignored
                }
            }
        }
    }

    pub fn remove(&mut self, id: &DocumentId) -> Option<DocumentRecord> {
        let index = self.position(id)?;
        Some(self.records.remove(index))
    }

    /// Replace every server-backed record with `server`, keeping provisional
    /// ones (uploads still in flight) at the head in their current order.
    ///
    /// A record that is already terminal here keeps its local copy when the
    /// server reports a different status: terminal records never move.
    pub fn replace_confirmed(&mut self, server: Vec<DocumentRecord>) {
        let mut merged = Vec::with_capacity(server.len());
        let mut terminal = HashMap::new();
        for record in self.records.drain(..) {
            if record.id().is_provisional() {
                merged.push(record);
            } else if record.status().is_terminal() {
                terminal.insert(record.id().clone(), record);
            }
        }
        for record in server.into_iter().filter(|r| !r.id().is_provisional()) {
            match terminal.remove(record.id()) {
                Some(local) if local.status() != record.status() => {
                    tracing::debug!(
                        doc_id = %local.id(),
                        local = local.status().as_str(),
                        server = record.status().as_str(),
                        "Keeping terminal record over server copy"
                    );
                    merged.push(local);
                }
                _ => merged.push(record),
            }
        }
        self.records = merged;
    }

    /// Server ids of records still waiting for analysis.
    pub fn pending_analysis(&self) -> Vec<DocumentId> {
        self.records
            .iter()
            .filter(|r| r.status() == DocumentStatus::Analyzing && !r.id().is_provisional())
            .map(|r| r.id().clone())
            .collect()
    }

    pub fn all_terminal(&self) -> bool {
        self.records.iter().all(|r| r.status().is_terminal())
    }
}
