use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GdsSvgError>;

#[derive(Debug, Error)]
pub enum GdsSvgError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors from the GDSII reader, which are not thread-safe and so are
    /// carried as text.
    #[error("error reading GDSII: {0}")]
    Gds(String),

    #[error("no cell named `{0}` in library")]
    UnknownCell(String),

    #[error("cell `{parent}` references undefined cell `{cell}`")]
    UnknownReference { parent: String, cell: String },

    #[error("cell `{0}` contains no drawable geometry")]
    EmptyCell(String),

    #[error("hierarchy below `{0}` is too deep or recursive")]
    RecursionLimit(String),

    #[error("invalid scale {0}; must be positive and finite")]
    Scale(f64),

    #[error("error drawing SVG: {0}")]
    Draw(String),
}
