use thiserror::Error;

use crate::report::ReportError;
use crate::source::LoadError;
use crate::store::StoreError;

/// Crate-level convenience error.
///
/// A thin wrapper over the per-stage capability errors; every variant is
/// fatal for the run (per-row anomalies degrade inside the stages instead
/// of surfacing here).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Report(#[from] ReportError),
}
