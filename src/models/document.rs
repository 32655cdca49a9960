use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Department, DocumentStatus, DocumentType, SecurityLevel};
use super::ModelError;

/// Reserved prefix of locally generated ids. Server ids never carry it.
pub const PROVISIONAL_PREFIX: &str = "tmp-";

/// Identity of a document record.
///
/// Provisional ids exist only between `submit_batch` and the upload
/// response; the server id replaces them in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentId {
    Provisional(Uuid),
    Server(String),
}

impl DocumentId {
    pub fn provisional() -> Self {
        Self::Provisional(Uuid::new_v4())
    }

    pub fn server(id: impl Into<String>) -> Self {
        Self::Server(id.into())
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, Self::Provisional(_))
    }

    /// Parse the rendered form back. Anything without the reserved prefix
    /// (or with a prefix but no valid uuid) is a server id.
    pub fn parse(raw: &str) -> Self {
        raw.strip_prefix(PROVISIONAL_PREFIX)
            .and_then(|rest| Uuid::parse_str(rest).ok())
            .map(Self::Provisional)
            .unwrap_or_else(|| Self::Server(raw.to_string()))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provisional(uuid) => write!(f, "{PROVISIONAL_PREFIX}{uuid}"),
            Self::Server(id) => f.write_str(id),
        }
    }
}

impl Serialize for DocumentId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Classification chosen by the user at upload time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub document_type: DocumentType,
    pub security_level: SecurityLevel,
    pub department: Department,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A flagged passage reported by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub page: u32,
    pub paragraph: u32,
}

pub const MAX_SENSITIVITY_SCORE: u8 = 100;

/// Analysis result for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub sensitivity_score: u8,
    #[serde(default)]
    pub findings: Vec<Finding>,
}

impl AnalysisReport {
    pub fn new(sensitivity_score: u32, findings: Vec<Finding>) -> Result<Self, ModelError> {
        if sensitivity_score > u32::from(MAX_SENSITIVITY_SCORE) {
            return Err(ModelError::ScoreOutOfRange(sensitivity_score));
        }
        Ok(Self {
            sensitivity_score: sensitivity_score as u8,
            findings,
        })
    }
}

/// One entry of the document feed.
///
/// `sensitivity_score` and `findings` are only ever set together with
/// `status = Completed`; fields are private so the state machine cannot be
/// bypassed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    id: DocumentId,
    name: String,
    size_bytes: u64,
    uploaded_at: DateTime<Utc>,
    status: DocumentStatus,
    #[serde(flatten)]
    classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sensitivity_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    findings: Option<Vec<Finding>>,
}

impl DocumentRecord {
    /// Optimistic record shown while the upload is in flight.
    pub fn provisional(
        name: impl Into<String>,
        size_bytes: u64,
        classification: Classification,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DocumentId::provisional(),
            name: name.into(),
            size_bytes,
            uploaded_at,
            status: DocumentStatus::Analyzing,
            classification,
            sensitivity_score: None,
            findings: None,
        }
    }

    /// Record as confirmed by the server; analysis still pending.
    pub fn confirmed(
        id: impl Into<String>,
        name: impl Into<String>,
        size_bytes: u64,
        classification: Classification,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DocumentId::server(id),
            name: name.into(),
            size_bytes,
            uploaded_at,
            status: DocumentStatus::Analyzing,
            classification,
            sensitivity_score: None,
            findings: None,
        }
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn sensitivity_score(&self) -> Option<u8> {
        self.sensitivity_score
    }

    pub fn findings(&self) -> Option<&[Finding]> {
        self.findings.as_deref()
    }

    /// `Analyzing -> Completed`. Returns false (and changes nothing) when
    /// the record is already terminal.
    pub fn complete(&mut self, report: AnalysisReport) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = DocumentStatus::Completed;
        self.sensitivity_score = Some(report.sensitivity_score);
        self.findings = Some(report.findings);
        true
    }

    /// `Analyzing -> Error`. Returns false when already terminal.
    pub fn fail(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = DocumentStatus::Error;
        true
    }

    /// Server payloads may arrive already analysed. Drop score and findings
    /// that contradict the status, and reject a score outside 0..=100.
    pub fn normalized(mut self) -> Result<Self, ModelError> {
        if self.status != DocumentStatus::Completed {
            self.sensitivity_score = None;
            self.findings = None;
            return Ok(self);
        }
        if let Some(score) = self.sensitivity_score {
            if score > MAX_SENSITIVITY_SCORE {
                return Err(ModelError::ScoreOutOfRange(u32::from(score)));
            }
        }
        if self.findings.is_none() {
            self.findings = Some(Vec::new());
        }
        Ok(self)
    }
}
