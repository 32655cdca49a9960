//! Candidate file filtering for the upload dialog.
//!
//! Filters are applied in a fixed order: selection mode, accepted types,
//! per-file size, then the aggregate size of what is left. Rejections are
//! silent; `validate_with_report` exposes the counts for logging.

use serde::{Deserialize, Serialize};

use super::format::FileHandle;

const MIB: u64 = 1024 * 1024;

/// One entry of an `accept` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcceptPattern {
    /// `.pdf`, compared against the last extension of the name.
    Extension(String),
    /// `image/*`; holds the major type (`image`).
    MimeWildcard(String),
    /// `application/pdf`
    Mime(String),
}

impl AcceptPattern {
    /// Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let pattern = raw.trim().to_lowercase();
        if pattern.is_empty() {
            return None;
        }
        if pattern.starts_with('.') {
            Some(Self::Extension(pattern))
        } else if let Some(major) = pattern.strip_suffix("/*") {
            Some(Self::MimeWildcard(major.to_string()))
        } else {
            Some(Self::Mime(pattern))
        }
    }

    pub fn matches(&self, file: &FileHandle) -> bool {
        match self {
            Self::Extension(ext) => file.extension().as_deref() == Some(ext.as_str()),
            Self::MimeWildcard(major) => file
                .mime_type()
                .to_lowercase()
                .split('/')
                .next()
                .is_some_and(|m| !m.is_empty() && m == major),
            Self::Mime(mime) => file.mime_type().eq_ignore_ascii_case(mime),
        }
    }
}

/// Acceptance rules of a file picker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptRules {
    pub allow_multiple: bool,
    pub accept_patterns: Vec<AcceptPattern>,
    pub max_file_size_bytes: Option<u64>,
    pub max_total_size_bytes: Option<u64>,
}

impl AcceptRules {
    /// Preset of the document upload dialog (PDF, DOC and DOCX).
    pub fn documents() -> Self {
        Self {
            allow_multiple: true,
            accept_patterns: Self::parse_accept(
                ".pdf,.doc,.docx,application/pdf,application/msword,\
                 application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            ),
            max_file_size_bytes: Some(50 * MIB),
            max_total_size_bytes: Some(200 * MIB),
        }
    }

    /// Parse an HTML-style `accept` attribute (`".pdf, image/*"`).
    pub fn parse_accept(accept: &str) -> Vec<AcceptPattern> {
        accept.split(',').filter_map(AcceptPattern::parse).collect()
    }

    pub fn with_accept(mut self, accept: &str) -> Self {
        self.accept_patterns = Self::parse_accept(accept);
        self
    }

    fn accepts_type(&self, file: &FileHandle) -> bool {
        self.accept_patterns.is_empty() || self.accept_patterns.iter().any(|p| p.matches(file))
    }
}

/// What `validate` dropped, per reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub submitted: usize,
    pub dropped_extra: usize,
    pub dropped_type: usize,
    pub dropped_size: usize,
    /// Files discarded because the batch exceeded the aggregate cap.
    pub dropped_total: usize,
    pub accepted: usize,
}

impl ValidationReport {
    pub fn dropped(&self) -> usize {
        self.submitted - self.accepted
    }
}

/// Narrow a batch of candidates to the acceptable files.
pub fn validate(candidates: &[FileHandle], rules: &AcceptRules) -> Vec<FileHandle> {
    validate_with_report(candidates, rules).0
}

pub fn validate_with_report(
    candidates: &[FileHandle],
    rules: &AcceptRules,
) -> (Vec<FileHandle>, ValidationReport) {
    let mut report = ValidationReport {
        submitted: candidates.len(),
        ..Default::default()
    };

    let selected = if !rules.allow_multiple && candidates.len() > 1 {
        report.dropped_extra = candidates.len() - 1;
        &candidates[..1]
    } else {
        candidates
    };

    let mut survivors = Vec::with_capacity(selected.len());
    for file in selected {
        if !rules.accepts_type(file) {
            report.dropped_type += 1;
        } else if rules
            .max_file_size_bytes
            .is_some_and(|max| file.size_bytes() > max)
        {
            report.dropped_size += 1;
        } else {
            survivors.push(file.clone());
        }
    }

    if let Some(max_total) = rules.max_total_size_bytes {
        let total: u64 = survivors.iter().map(FileHandle::size_bytes).sum();
        if total > max_total {
            report.dropped_total = survivors.len();
            survivors.clear();
        }
    }

    report.accepted = survivors.len();
    (survivors, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str, size: usize) -> FileHandle {
        FileHandle::from_bytes(name, mime, vec![0u8; size])
    }

    fn names(files: &[FileHandle]) -> Vec<&str> {
        files.iter().map(FileHandle::name).collect()
    }

    #[test]
    fn single_mode_keeps_only_first() {
        let rules = AcceptRules::default();
        let batch = vec![file("a.pdf", "", 1), file("b.pdf", "", 1), file("c.pdf", "", 1)];
        let result = validate(&batch, &rules);
        assert_eq!(names(&result), vec!["a.pdf"]);
    }

    #[test]
    fn single_mode_drops_others_even_if_first_is_rejected() {
        let rules = AcceptRules::default().with_accept(".pdf");
        let batch = vec![file("a.txt", "text/plain", 1), file("b.pdf", "", 1)];
        assert!(validate(&batch, &rules).is_empty());
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let rules = AcceptRules {
            allow_multiple: true,
            ..Default::default()
        }
        .with_accept(".pdf");
        let batch = vec![file("report.PDF", "", 1), file("report.docx", "", 1)];
        assert_eq!(names(&validate(&batch, &rules)), vec!["report.PDF"]);
    }

    #[test]
    fn docx_accepted_when_listed() {
        let rules = AcceptRules {
            allow_multiple: true,
            ..Default::default()
        }
        .with_accept(".pdf, .DOCX");
        let batch = vec![file("report.pdf", "", 1), file("report.docx", "", 1)];
        assert_eq!(validate(&batch, &rules).len(), 2);
    }

    #[test]
    fn mime_wildcard_matches_major_type() {
        let rules = AcceptRules {
            allow_multiple: true,
            ..Default::default()
        }
        .with_accept("image/*");
        let batch = vec![
            file("scan.png", "image/png", 1),
            file("scan.jpg", "IMAGE/JPEG", 1),
            file("doc.pdf", "application/pdf", 1),
            file("unknown", "", 1),
        ];
        assert_eq!(names(&validate(&batch, &rules)), vec!["scan.png", "scan.jpg"]);
    }

    #[test]
    fn exact_mime_match() {
        let rules = AcceptRules::default().with_accept("application/pdf");
        assert_eq!(validate(&[file("x.bin", "application/pdf", 1)], &rules).len(), 1);
        assert!(validate(&[file("x.pdf", "application/octet-stream", 1)], &rules).is_empty());
    }

    #[test]
    fn no_patterns_means_no_type_filter() {
        let rules = AcceptRules {
            allow_multiple: true,
            ..Default::default()
        };
        let batch = vec![file("a.exe", "application/x-msdownload", 1), file("b", "", 1)];
        assert_eq!(validate(&batch, &rules).len(), 2);
    }

    #[test]
    fn oversized_files_dropped_individually() {
        let rules = AcceptRules {
            allow_multiple: true,
            max_file_size_bytes: Some(100),
            ..Default::default()
        };
        let batch = vec![file("small.pdf", "", 100), file("big.pdf", "", 101), file("tiny.pdf", "", 3)];
        assert_eq!(names(&validate(&batch, &rules)), vec!["small.pdf", "tiny.pdf"]);
    }

    #[test]
    fn aggregate_cap_rejects_whole_batch() {
        let rules = AcceptRules {
            allow_multiple: true,
            max_total_size_bytes: Some(100),
            ..Default::default()
        };
        let batch = vec![file("a.pdf", "", 60), file("b.pdf", "", 41)];
        let (result, report) = validate_with_report(&batch, &rules);
        assert!(result.is_empty());
        assert_eq!(report.dropped_total, 2);
        assert_eq!(report.dropped(), 2);
    }

    #[test]
    fn aggregate_cap_counts_only_survivors() {
        let rules = AcceptRules {
            allow_multiple: true,
            max_file_size_bytes: Some(50),
            max_total_size_bytes: Some(100),
            ..Default::default()
        }
        .with_accept(".pdf");
        let batch = vec![
            file("a.pdf", "", 50),
            file("huge.pdf", "", 500),
            file("b.docx", "", 90),
            file("c.pdf", "", 50),
        ];
        let (result, report) = validate_with_report(&batch, &rules);
        assert_eq!(names(&result), vec!["a.pdf", "c.pdf"]);
        assert_eq!(report.dropped_type, 1);
        assert_eq!(report.dropped_size, 1);
        assert_eq!(report.accepted, 2);
    }

    #[test]
    fn exactly_at_caps_is_accepted() {
        let rules = AcceptRules {
            allow_multiple: true,
            max_file_size_bytes: Some(10),
            max_total_size_bytes: Some(20),
            ..Default::default()
        };
        let batch = vec![file("a.pdf", "", 10), file("b.pdf", "", 10)];
        assert_eq!(validate(&batch, &rules).len(), 2);
    }

    #[test]
    fn parse_accept_skips_blanks() {
        assert_eq!(
            AcceptRules::parse_accept(" .PDF , ,image/* ,application/pdf"),
            vec![
                AcceptPattern::Extension(".pdf".into()),
                AcceptPattern::MimeWildcard("image".into()),
                AcceptPattern::Mime("application/pdf".into()),
            ]
        );
    }

    #[test]
    fn documents_preset_accepts_pdf_doc_and_docx() {
        let rules = AcceptRules::documents();
        let batch = vec![
            file("a.pdf", "application/pdf", 10),
            file("b.docx", "", 10),
            file("old.doc", "", 10),
            file("legacy", "application/msword", 10),
            file("c.png", "image/png", 10),
        ];
        assert_eq!(
            names(&validate(&batch, &rules)),
            vec!["a.pdf", "b.docx", "old.doc", "legacy"]
        );
    }

    #[test]
    fn empty_batch_yields_empty_result() {
        let (result, report) = validate_with_report(&[], &AcceptRules::documents());
        assert!(result.is_empty());
        assert_eq!(report, ValidationReport::default());
    }
}
