use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: could not parse `{token}` as a number")]
    Parse { line: usize, token: String },

    #[error("line {line}: expected {expected} values, found {found}")]
    ColumnCount {
        line: usize,
        expected: String,
        found: usize,
    },

    #[error("no signal named `{0}` in simulation data")]
    UnknownSignal(String),

    #[error("no signals were saved")]
    NoSignals,

    #[error("invalid bus specification `{0}`")]
    Bus(String),

    #[error("signal `{name}` has {found} points, but the sweep has {expected}")]
    Length {
        name: String,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, DataError>;
