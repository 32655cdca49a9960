pub mod analysis;
pub mod import;
