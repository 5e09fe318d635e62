//! Error types for catalog discovery, configuration and copy execution

pub mod handlers;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MirrorError>;

#[derive(Error, Debug)]
pub enum MirrorError {
    /// Malformed or unreadable config, rules or credential files
    #[error("Configuration error: {0}")]
    Config(String),

    /// A catalog API call failed
    #[error("Catalog error: GET {url}{}: {message}", status_suffix(.status))]
    Catalog {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// The copy tool exited non-zero
    #[error("Copy failed for {reference}: {output}")]
    Copy { reference: String, output: String },

    /// The run finished but some projects or tasks failed
    #[error("Sync incomplete: {0}")]
    Incomplete(String),

    /// Argument or input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {})", code),
        None => String::new(),
    }
}

impl MirrorError {
    pub fn catalog(url: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        MirrorError::Catalog {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Captured subprocess text, if this error carries any
    pub fn output(&self) -> Option<&str> {
        match self {
            MirrorError::Copy { output, .. } => Some(output),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MirrorError {
    fn from(err: serde_json::Error) -> Self {
        MirrorError::Config(format!("JSON parse error: {}", err))
    }
}

impl From<serde_yaml_ng::Error> for MirrorError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        MirrorError::Config(format!("YAML parse error: {}", err))
    }
}

impl From<url::ParseError> for MirrorError {
    fn from(err: url::ParseError) -> Self {
        MirrorError::Validation(err.to_string())
    }
}
