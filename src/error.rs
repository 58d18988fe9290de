use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContribError>;

#[derive(Error, Debug)]
pub enum ContribError {
    #[error("could not open input file {}", path.display())]
    InputOpen {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not open output file {}", path.display())]
    OutputOpen {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write output")]
    OutputWrite(#[source] std::io::Error),
    #[error("could not decode toml")]
    ConfigParse(#[from] toml::de::Error),
    #[error("invalid config value for '{field}': {reason}")]
    ConfigValue { field: &'static str, reason: String },
    #[error("unable to get {repo}: {reason}")]
    RepoResolve { repo: String, reason: String },
    #[error("remote query failed: {0}")]
    Remote(String),
    #[error("Serialization error: {0}")]
    Encode(String),
    #[error("interrupted")]
    Interrupted,
}

impl ContribError {
    /// Process exit status for this error.
    ///
    /// A user interrupt is not a failure and maps to zero.
    pub fn exit_code(&self) -> u8 {
        match self {
            ContribError::InputOpen { .. } => 1,
            ContribError::OutputOpen { .. } | ContribError::OutputWrite(_) => 2,
            ContribError::ConfigParse(_) | ContribError::ConfigValue { .. } => 3,
            ContribError::RepoResolve { .. } => 4,
            ContribError::Remote(_) => 5,
            ContribError::Encode(_) => 6,
            ContribError::Interrupted => 0,
        }
    }
}

impl From<serde_json::Error> for ContribError {
    fn from(err: serde_json::Error) -> Self {
        ContribError::Encode(err.to_string())
    }
}

impl From<toml::ser::Error> for ContribError {
    fn from(err: toml::ser::Error) -> Self {
        ContribError::Encode(err.to_string())
    }
}

impl From<csv::Error> for ContribError {
    fn from(err: csv::Error) -> Self {
        ContribError::Encode(err.to_string())
    }
}
