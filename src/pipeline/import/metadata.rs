use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::ImportError;
use crate::models::{Classification, Department, DocumentType, SecurityLevel};

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// True when the text contains something shaped like an HTML tag.
pub fn contains_html(text: &str) -> bool {
    HTML_TAG.is_match(text)
}

/// Classification entered in the upload dialog, applied to every file of
/// the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadMetadata {
    pub classification: Classification,
}

impl UploadMetadata {
    pub fn new(classification: Classification) -> Result<Self, ImportError> {
        let notes = classification
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        if notes.is_some_and(contains_html) {
            return Err(ImportError::HtmlInNotes);
        }
        let notes = notes.map(str::to_string);
        Ok(Self {
            classification: Classification {
                notes,
                ..classification
            },
        })
    }

    /// Build from the raw codes of the dialog's select boxes.
    pub fn parse(
        document_type: &str,
        security_level: &str,
        department: &str,
        notes: Option<&str>,
    ) -> Result<Self, ImportError> {
        Self::new(Classification {
            document_type: DocumentType::from_str(document_type)?,
            security_level: SecurityLevel::from_str(security_level)?,
            department: Department::from_str(department)?,
            notes: notes.map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes() {
        let meta = UploadMetadata::parse("contract", "top_secret", "hr", Some("  Q3 renewal ")).unwrap();
        assert_eq!(meta.classification.document_type, DocumentType::Contract);
        assert_eq!(meta.classification.security_level, SecurityLevel::TopSecret);
        assert_eq!(meta.classification.department, Department::HumanResources);
        assert_eq!(meta.classification.notes.as_deref(), Some("Q3 renewal"));
    }

    #[test]
    fn blank_notes_become_none() {
        let meta = UploadMetadata::parse("report", "public", "sales", Some("   ")).unwrap();
        assert!(meta.classification.notes.is_none());
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(matches!(
            UploadMetadata::parse("", "public", "sales", None),
            Err(ImportError::InvalidClassification(_))
        ));
    }

    #[test]
    fn html_in_notes_rejected() {
        assert!(matches!(
            UploadMetadata::parse("report", "public", "sales", Some("<script>x</script>")),
            Err(ImportError::HtmlInNotes)
        ));
    }

    #[test]
    fn html_detection() {
        assert!(contains_html("hello <b>world</b>"));
        assert!(contains_html("<img src=x>"));
        assert!(!contains_html("score < 40"));
        assert!(!contains_html("plain text"));
    }
}
