use serde::Serialize;

use crate::models::{BadgeVariant, Department, DocumentRecord, DocumentStatus};

/// Completed documents scoring above this are counted as at risk.
pub const AT_RISK_THRESHOLD: u8 = 70;

/// Coarse rating of a sensitivity score, used for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityBand {
    Low,
    Moderate,
    High,
    Critical,
}

impl SensitivityBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => Self::Critical,
            60..=79 => Self::High,
            40..=59 => Self::Moderate,
            _ => Self::Low,
        }
    }

    pub fn badge_variant(&self) -> BadgeVariant {
        match self {
            Self::Low => BadgeVariant::Success,
            Self::Moderate => BadgeVariant::Info,
            Self::High => BadgeVariant::Warning,
            Self::Critical => BadgeVariant::Danger,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub analyzing: usize,
    pub completed: usize,
    pub errored: usize,
    pub at_risk: usize,
    /// Departments in the order they first appear in the feed.
    pub by_department: Vec<(Department, usize)>,
}

impl DashboardStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a DocumentRecord>) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.total += 1;
            match record.status() {
                DocumentStatus::Analyzing => stats.analyzing += 1,
                DocumentStatus::Completed => stats.completed += 1,
                DocumentStatus::Error => stats.errored += 1,
            }
            if record
                .sensitivity_score()
                .is_some_and(|s| s > AT_RISK_THRESHOLD)
            {
                stats.at_risk += 1;
            }

            let department = record.classification().department;
            match stats.by_department.iter_mut().find(|(d, _)| *d == department) {
                Some((_, count)) => *count += 1,
                None => stats.by_department.push((department, 1)),
            }
        }
        stats
    }

    pub fn count(&self, status: DocumentStatus) -> usize {
        match status {
            DocumentStatus::Analyzing => self.analyzing,
            DocumentStatus::Completed => self.completed,
            DocumentStatus::Error => self.errored,
        }
    }

    /// Share of the whole feed in whole percent; 0 for an empty feed.
    pub fn percentage(&self, count: usize) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (count as f64 / self.total as f64 * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::{AnalysisReport, Classification, DocumentType, SecurityLevel};

    fn record(id: &str, department: Department, score: Option<u32>) -> DocumentRecord {
        let mut record = DocumentRecord::confirmed(
            id,
            "x.pdf",
            1,
            Classification {
                document_type: DocumentType::Report,
                security_level: SecurityLevel::Public,
                department,
                notes: None,
            },
            Utc::now(),
        );
        if let Some(score) = score {
            record.complete(AnalysisReport::new(score, vec![]).unwrap());
        }
        record
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(SensitivityBand::from_score(0), SensitivityBand::Low);
        assert_eq!(SensitivityBand::from_score(39), SensitivityBand::Low);
        assert_eq!(SensitivityBand::from_score(40), SensitivityBand::Moderate);
        assert_eq!(SensitivityBand::from_score(60), SensitivityBand::High);
        assert_eq!(SensitivityBand::from_score(79), SensitivityBand::High);
        assert_eq!(SensitivityBand::from_score(80), SensitivityBand::Critical);
        assert_eq!(SensitivityBand::Critical.badge_variant(), BadgeVariant::Danger);
    }

    #[test]
    fn counts_statuses_risk_and_departments() {
        let mut failed = record("4", Department::Sales, None);
        failed.fail();
        let records = vec![
            record("1", Department::Finance, Some(71)),
            record("2", Department::Sales, Some(70)),
            record("3", Department::Finance, None),
            failed,
        ];

        let stats = DashboardStats::from_records(&records);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.count(DocumentStatus::Completed), 2);
        assert_eq!(stats.count(DocumentStatus::Analyzing), 1);
        assert_eq!(stats.count(DocumentStatus::Error), 1);
        assert_eq!(stats.at_risk, 1);
        assert_eq!(
            stats.by_department,
            vec![(Department::Finance, 2), (Department::Sales, 2)]
        );
        assert_eq!(stats.percentage(1), 25);
    }

    #[test]
    fn percentage_rounds_and_handles_empty() {
        assert_eq!(DashboardStats::default().percentage(0), 0);
        let records = vec![
            record("1", Department::Other, None),
            record("2", Department::Other, None),
            record("3", Department::Other, None),
        ];
        let stats = DashboardStats::from_records(&records);
        assert_eq!(stats.percentage(1), 33);
        assert_eq!(stats.percentage(2), 67);
    }
}
