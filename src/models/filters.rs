use serde::{Deserialize, Serialize};

use super::enums::{DocumentStatus, TimeWindow};

/// Document feed criteria. Every field is optional; set fields AND together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFilter {
    pub search_term: Option<String>,
    pub status: Option<DocumentStatus>,
    pub time_window: Option<TimeWindow>,
}

impl DocumentFilter {
    pub fn is_empty(&self) -> bool {
        self.normalized_term().is_none() && self.status.is_none() && self.time_window.is_none()
    }

    /// Lower-cased search term; an empty term counts as absent.
    pub fn normalized_term(&self) -> Option<String> {
        self.search_term
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }
}
