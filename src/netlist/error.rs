use thiserror::Error;

pub type Result<T> = std::result::Result<T, NetlistError>;

#[derive(Debug, Error)]
pub enum NetlistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode circuit: {0}")]
    Decode(String),

    #[error("error rendering prelude: {0}")]
    Template(#[from] tera::Error),

    #[error("simulation input contains no circuit package")]
    MissingPackage,

    #[error("{0} is missing")]
    MissingField(String),

    #[error("reference to undefined module `{0}`")]
    UnknownModule(String),

    #[error("reference to undefined external module `{domain}.{name}`")]
    UnknownExternalModule { domain: String, name: String },

    #[error("module `{module}` has no signal named `{signal}`")]
    UnknownSignal { module: String, signal: String },

    #[error("instance `{inst}` does not connect port `{port}`")]
    MissingConnection { inst: String, port: String },

    #[error("instance `{inst}` connects nonexistent port `{port}`")]
    UnknownPort { inst: String, port: String },

    #[error("instance `{inst}` port `{port}` expects {expected} bits, but {found} were connected")]
    WidthMismatch {
        inst: String,
        port: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid slice {signal}[{top}:{bot}]")]
    InvalidSlice { signal: String, top: i64, bot: i64 },

    #[error("unsupported primitive `{0}`")]
    UnsupportedPrimitive(String),

    #[error("instance `{inst}` is missing required parameter `{param}`")]
    MissingParameter { inst: String, param: String },

    #[error("parameter `{0}` has no value")]
    EmptyParameter(String),

    #[error("parameter `{param}` has non-finite value {value}")]
    NonFinite { param: String, value: f64 },
}
