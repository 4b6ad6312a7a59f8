use thiserror::Error;

/// Custom error types for docchat
#[derive(Error, Debug)]
pub enum DocChatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parsing error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Vector store error: {message}")]
    VectorStore { message: String },

    #[error("Embedding error: {message}")]
    Embedding { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("{variable} environment variable is not set")]
    MissingCredential { variable: String },

    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },
}

impl DocChatError {
    /// Create a vector store error
    pub fn vector_store<S: Into<String>>(message: S) -> Self {
        Self::VectorStore {
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding<S: Into<String>>(message: S) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a missing credential error
    pub fn missing_credential<S: Into<String>>(variable: S) -> Self {
        Self::MissingCredential {
            variable: variable.into(),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the error only affects a single interaction and the chat loop may continue
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DocChatError::MissingCredential { .. })
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            DocChatError::Io(_) => "io",
            DocChatError::Json(_) => "json",
            DocChatError::TomlDe(_) | DocChatError::TomlSer(_) => "config",
            DocChatError::VectorStore { .. } => "vector_store",
            DocChatError::Embedding { .. } => "embedding",
            DocChatError::InvalidConfig { .. } => "config",
            DocChatError::MissingCredential { .. } => "credential",
            DocChatError::Validation { .. } => "validation",
        }
    }
}

impl From<bincode::Error> for DocChatError {
    fn from(err: bincode::Error) -> Self {
        DocChatError::VectorStore {
            message: err.to_string(),
        }
    }
}

/// Result type alias for docchat
pub type Result<T> = std::result::Result<T, DocChatError>;
