use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublisherError {
    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("Listing {id} not found")]
    NotFoundError { id: String },

    #[error("{service} request failed: {message}")]
    RemoteError { service: String, message: String },

    #[error("Malformed response from {service}: {message}")]
    DecodeError { service: String, message: String },

    #[error("Revision conflict while writing {path}")]
    ConflictError { path: String },

    #[error("Primary templates not found: {path}")]
    TemplatesNotFoundError { path: String },

    #[error("HTTP transport failed: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// 錯誤分類，用於日誌與退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Auth,
    NotFound,
    Remote,
    Decode,
    Conflict,
    Template,
    Configuration,
    Io,
}

impl PublisherError {
    pub fn remote(service: &str, message: impl Into<String>) -> Self {
        Self::RemoteError {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub fn decode(service: &str, message: impl Into<String>) -> Self {
        Self::DecodeError {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AuthError { .. } => ErrorCategory::Auth,
            Self::NotFoundError { .. } => ErrorCategory::NotFound,
            // 超時與連線錯誤一律視為遠端錯誤
            Self::RemoteError { .. } | Self::TransportError(_) => ErrorCategory::Remote,
            Self::DecodeError { .. } => ErrorCategory::Decode,
            Self::ConflictError { .. } => ErrorCategory::Conflict,
            Self::TemplatesNotFoundError { .. } => ErrorCategory::Template,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) => ErrorCategory::Io,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Auth => format!("Could not authenticate against the listing API: {}", self),
            ErrorCategory::NotFound => format!("The listing does not exist upstream: {}", self),
            ErrorCategory::Remote => format!("A remote service is unavailable: {}", self),
            ErrorCategory::Decode => format!("A remote service returned unexpected data: {}", self),
            ErrorCategory::Conflict => format!("The file changed while publishing: {}", self),
            ErrorCategory::Template => format!("Page templates are missing: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Io => format!("Local file access failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, PublisherError>;
