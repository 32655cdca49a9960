//! Share dialog logic: picking recipients and building the request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{DocumentId, SharePermission};
use crate::pipeline::import::contains_html;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShareError {
    #[error("Select at least one recipient")]
    NoRecipients,

    #[error("Message must not contain HTML markup")]
    HtmlInMessage,

    #[error("Document {0} has not been uploaded yet")]
    NotUploaded(DocumentId),
}

/// A colleague the document can be shared with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub document_id: DocumentId,
    pub user_ids: Vec<String>,
    #[serde(rename = "permissions")]
    pub permission: SharePermission,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ShareRequest {
    pub fn validate(&self) -> Result<(), ShareError> {
        if self.user_ids.is_empty() {
            return Err(ShareError::NoRecipients);
        }
        if self.document_id.is_provisional() {
            return Err(ShareError::NotUploaded(self.document_id.clone()));
        }
        if self.message.as_deref().is_some_and(contains_html) {
            return Err(ShareError::HtmlInMessage);
        }
        Ok(())
    }
}

/// Case-insensitive search over name, email and department. A blank term
/// returns every user.
pub fn search_users<'a>(users: &'a [UserSummary], term: &str) -> Vec<&'a UserSummary> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return users.iter().collect();
    }
    users
        .iter()
        .filter(|u| {
            u.name.to_lowercase().contains(&term)
                || u.email.to_lowercase().contains(&term)
                || u.department.to_lowercase().contains(&term)
        })
        .collect()
}

/// Recipients picked in the dialog, in pick order.
#[derive(Debug, Clone, Default)]
pub struct ShareSelection {
    selected: Vec<String>,
}

impl ShareSelection {
    pub fn toggle(&mut self, user_id: &str) {
        match self.selected.iter().position(|id| id == user_id) {
            Some(idx) => {
                self.selected.remove(idx);
            }
            None => self.selected.push(user_id.to_string()),
        }
    }

    pub fn remove(&mut self, user_id: &str) {
        self.selected.retain(|id| id != user_id);
    }

    pub fn is_selected(&self, user_id: &str) -> bool {
        self.selected.iter().any(|id| id == user_id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Build the request; a blank message is omitted.
    pub fn into_request(
        self,
        document_id: DocumentId,
        permission: SharePermission,
        message: &str,
    ) -> Result<ShareRequest, ShareError> {
        let message = message.trim();
        let request = ShareRequest {
            document_id,
            user_ids: self.selected,
            permission,
            message: (!message.is_empty()).then(|| message.to_string()),
        };
        request.validate()?;
        Ok(request)
    }
}
