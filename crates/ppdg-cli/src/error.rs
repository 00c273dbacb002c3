use ppdg::config::SettingsError;
use ppdg::workflows::descriptors::DescriptorError;
use ppdg::workflows::predict::PredictError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Descriptors(#[from] DescriptorError),

    #[error(transparent)]
    Predict(#[from] PredictError),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
