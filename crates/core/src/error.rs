use thiserror::Error;

use crate::{analysis::AnalysisError, controller::ControllerError, store::StoreError};

/// Any error the library can produce, for callers that do not care which layer failed.
#[derive(Error, Debug)]
pub enum TubemindError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Controller(#[from] ControllerError),
}

pub type Result<T> = std::result::Result<T, TubemindError>;
