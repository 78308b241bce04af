use thiserror::Error;

#[derive(Error, Debug)]
pub enum RaffleError {
    #[error("Invalid pool size: {size} (must be at least 1)")]
    InvalidSize { size: i64 },

    #[error("No draw session is active")]
    NotDrawing,

    #[error("Every number in the pool has already been drawn")]
    PoolExhausted,

    #[error("A reveal is already in progress")]
    AlreadyRolling,

    #[error("Reveal animator is busy")]
    AnimatorBusy,

    #[error("Reveal needs a running tokio runtime")]
    RuntimeUnavailable,

    #[error("No saved session to restore")]
    NoSavedSession,

    #[error("Saved session is corrupt: {reason}")]
    CorruptSnapshot { reason: String },

    #[error("Saved session version {found} is newer than supported version {supported}")]
    UnsupportedSnapshotVersion { found: u32, supported: u32 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Draw,
    Session,
    Persistence,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RaffleError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RaffleError::InvalidSize { .. }
            | RaffleError::PoolExhausted
            | RaffleError::AlreadyRolling
            | RaffleError::AnimatorBusy => ErrorCategory::Draw,
            RaffleError::NotDrawing
            | RaffleError::NoSavedSession
            | RaffleError::RuntimeUnavailable => ErrorCategory::Session,
            RaffleError::CorruptSnapshot { .. }
            | RaffleError::UnsupportedSnapshotVersion { .. }
            | RaffleError::IoError(_)
            | RaffleError::SerializationError(_)
            | RaffleError::StorageError { .. } => ErrorCategory::Persistence,
            RaffleError::ConfigError { .. }
            | RaffleError::ConfigValidationError { .. }
            | RaffleError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    /// Draw and session errors are recoverable by the caller. A missing
    /// runtime means the host is misbuilt.
    pub fn severity(&self) -> ErrorSeverity {
        if matches!(self, RaffleError::RuntimeUnavailable) {
            return ErrorSeverity::Critical;
        }
        match self.category() {
            ErrorCategory::Draw | ErrorCategory::Session => ErrorSeverity::Low,
            ErrorCategory::Persistence => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            RaffleError::InvalidSize { .. } => "Enter a whole number of 1 or more",
            RaffleError::NotDrawing => "Start a new session by entering a pool size",
            RaffleError::PoolExhausted => "All numbers are drawn; start a new session",
            RaffleError::AlreadyRolling | RaffleError::AnimatorBusy => {
                "Wait for the current reveal to finish"
            }
            RaffleError::NoSavedSession => "Start a new session instead",
            RaffleError::RuntimeUnavailable => "Call draw() from inside a tokio runtime",
            RaffleError::CorruptSnapshot { .. } | RaffleError::UnsupportedSnapshotVersion { .. } => {
                "Discard the saved session and start again"
            }
            RaffleError::IoError(_) | RaffleError::StorageError { .. } => {
                "Check that the storage directory exists and is writable"
            }
            RaffleError::SerializationError(_) => "Discard the saved session and start again",
            RaffleError::ConfigError { .. }
            | RaffleError::ConfigValidationError { .. }
            | RaffleError::InvalidConfigValueError { .. } => {
                "Check the configuration file and command line flags"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RaffleError::InvalidSize { size } => {
                format!("{} is not a valid pool size", size)
            }
            RaffleError::PoolExhausted => "All numbers have been drawn".to_string(),
            RaffleError::AlreadyRolling | RaffleError::AnimatorBusy => {
                "Still revealing the previous number".to_string()
            }
            RaffleError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RaffleError>;
