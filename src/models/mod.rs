pub mod document;
pub mod enums;
pub mod filters;

pub use document::*;
pub use enums::*;
pub use filters::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid {field} value: {value:?}")]
    InvalidEnum { field: String, value: String },

    #[error("Sensitivity score out of range: {0}")]
    ScoreOutOfRange(u32),
}
