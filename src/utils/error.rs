use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Validation error: {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("State conflict: {message}")]
    StateConflictError { message: String },

    #[error("Not found: {message}")]
    NotFoundError { message: String },

    #[error("Commit failed: {message}")]
    CommitError { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Geocoding failed for '{street}': {message}")]
    GeocodingError { street: String, message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// 錯誤分類，對應領域層的三種錯誤與基礎設施錯誤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    StateConflict,
    NotFound,
    Infrastructure,
}

/// 錯誤嚴重程度，CLI 依此決定退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DispatchError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn state_conflict(message: impl Into<String>) -> Self {
        Self::StateConflictError {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFoundError {
            message: message.into(),
        }
    }

    /// 在訊息前加上出處（例如檔案行號），錯誤種類不變
    pub fn in_context(self, context: impl AsRef<str>) -> Self {
        let context = context.as_ref();
        match self {
            Self::ValidationError { field, message } => Self::ValidationError {
                field: format!("{} {}", context, field),
                message,
            },
            Self::StateConflictError { message } => {
                Self::state_conflict(format!("{}: {}", context, message))
            }
            Self::NotFoundError { message } => Self::not_found(format!("{}: {}", context, message)),
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigError { .. } => ErrorKind::Validation,
            Self::StateConflictError { .. } => ErrorKind::StateConflict,
            Self::NotFoundError { .. } => ErrorKind::NotFound,
            _ => ErrorKind::Infrastructure,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::StateConflictError { .. } | Self::Cancelled => ErrorSeverity::Low,
            Self::CommitError { .. } | Self::GeocodingError { .. } => ErrorSeverity::Medium,
            Self::ValidationError { .. }
            | Self::NotFoundError { .. }
            | Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::CsvError(_)
            | Self::TomlError(_) => ErrorSeverity::High,
            Self::StorageError { .. } | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ValidationError { field, message } => {
                format!("Invalid input for '{}': {}", field, message)
            }
            Self::StateConflictError { message } => format!("Operation not allowed: {}", message),
            Self::NotFoundError { message } => format!("Lookup failed: {}", message),
            Self::CommitError { .. } => {
                "Changes could not be saved; nothing from this run was applied".to_string()
            }
            Self::Cancelled => "Operation was cancelled before completion".to_string(),
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } | Self::TomlError(_) => {
                format!("Configuration problem: {}", self)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "Check the input values and the configuration file",
            ErrorKind::StateConflict => "Re-read the current state; the entity already moved on",
            ErrorKind::NotFound => "Use one of the listed valid values",
            ErrorKind::Infrastructure => "The next scheduled cycle will retry automatically",
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
