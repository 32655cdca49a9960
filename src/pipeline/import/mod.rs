pub mod format;
pub mod metadata;
pub mod validate;

pub use format::*;
pub use metadata::*;
pub use validate::*;

use thiserror::Error;

use crate::models::ModelError;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a regular file: {0}")]
    NotAFile(String),

    #[error("Invalid classification: {0}")]
    InvalidClassification(#[from] ModelError),

    #[error("Notes must not contain HTML markup")]
    HtmlInNotes,

    #[error("No files left after validation")]
    NothingToUpload,
}
