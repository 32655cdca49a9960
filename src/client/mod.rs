//! Backend collaborators: upload, analysis status, document management and
//! password encryption.
//!
//! The reconciler only sees the traits; `ApiClient` is the HTTP
//! implementation and `mock` provides scripted doubles.

pub mod error;
pub mod http;
pub mod mock;
pub mod traits;

pub use error::ClientError;
pub use http::ApiClient;
pub use traits::*;
