use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Cannot resolve path {path}: {message}")]
    PathResolution { path: String, message: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, TemplateError>;

impl TemplateError {
    pub(crate) fn path(path: &str, message: impl Into<String>) -> Self {
        Self::PathResolution {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

// Helper conversions
impl From<std::io::Error> for TemplateError {
    fn from(e: std::io::Error) -> Self { Self::Serialization(e.to_string()) }
}
impl From<std::string::FromUtf8Error> for TemplateError {
    fn from(e: std::string::FromUtf8Error) -> Self { Self::Serialization(e.to_string()) }
}
impl From<serde_json::Error> for TemplateError {
    fn from(e: serde_json::Error) -> Self { Self::Serialization(e.to_string()) }
}
impl From<config::ConfigError> for TemplateError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
