//! Waiting for the backend's sensitivity analysis of an uploaded document.
//!
//! The poll loop asks the analysis collaborator on a backoff schedule until
//! it gets a terminal answer or gives up.

pub mod cancel;
pub mod poller;
pub mod policy;

pub use cancel::{cancel_pair, PollCancel, PollCancelHandle};
pub use poller::{poll_analysis, PollOutcome};
pub use policy::PollPolicy;
