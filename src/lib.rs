#![forbid(unsafe_code)]

pub mod cli;
pub mod error;
pub mod hierarchy;
pub mod merge;
mod paths;
pub mod report;
pub mod source;
pub mod store;
pub mod telemetry;
pub mod vocab;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

// Re-export the types most callers touch.
pub use merge::{MergeField, OverridePolicy, Reconciliation};
pub use source::{SourceFormat, SourceRow};
pub use vocab::CvItem;
