//! Error types for the CLI runtime.

use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
}

impl AppError {
    /// True when clap produced informational output rather than a failure.
    pub(crate) fn is_informational(&self) -> bool {
        match self {
            Self::CliUsage(error) => matches!(
                error.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ),
            Self::LoadConfiguration(_) => false,
        }
    }
}
