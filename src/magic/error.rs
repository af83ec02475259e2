use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error as ThisError;

pub type BoxedError = std::boxed::Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, MagicError>;

#[derive(Debug, ThisError)]
pub enum MagicError {
    #[error("I/O error while communicating with magic process: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Start(#[from] StartMagicError),

    #[error("error rendering magic script: {0}")]
    Template(#[from] tera::Error),

    #[error("magic exited with {status}: {stderr}")]
    Exit { status: ExitStatus, stderr: String },

    #[error("magic did not produce expected output file {0:?}")]
    MissingOutput(PathBuf),
}

#[derive(Debug, ThisError)]
pub enum StartMagicError {
    #[error("failed to start magic process: {0}")]
    Spawn(#[source] BoxedError),

    #[error("failed to connect to magic process: {0}")]
    Connect(String),
}
