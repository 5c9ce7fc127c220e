use thiserror::Error;

/// One divergent header position, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDiff {
    pub position: usize,
    pub expected: String,
    pub actual: String,
}

/// Structured header comparison result carried by `SchemaMismatch`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    pub columns: Vec<ColumnDiff>,
    /// `(expected, actual)` column counts when they differ.
    pub count_mismatch: Option<(usize, usize)>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.count_mismatch.is_none()
    }
}

impl std::fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Header mismatch:")?;
        for diff in &self.columns {
            write!(
                f,
                "\n  Col {}: expected '{}', got '{}'",
                diff.position, diff.expected, diff.actual
            )?;
        }
        if let Some((expected, actual)) = self.count_mismatch {
            write!(
                f,
                "\n  Column count mismatch: expected {}, got {}",
                expected, actual
            )?;
        }
        Ok(())
    }
}

/// Errors raised by the mail collaborator. Stored per row as text, never propagated out of a run.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid address '{value}': {source}")]
    Address {
        value: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Preview write failed: {0}")]
    Preview(#[from] lettre::transport::file::Error),

    #[error("Attachment '{path}' could not be read: {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SMTP is not configured; send mode requires an [smtp] url")]
    SmtpNotConfigured,

    #[error("Transport session is closed")]
    SessionClosed,

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("File does not exist: {path}")]
    FileNotFound { path: String },

    #[error("Permission denied reading {path}")]
    PermissionDenied { path: String },

    #[error("Unable to open {path} as a workbook: {reason}")]
    UnreadableFormat { path: String, reason: String },

    #[error("Sheet '{sheet}' was not found. Sheets available: {}", available.join(", "))]
    MissingSheet {
        sheet: String,
        available: Vec<String>,
    },

    #[error("{0}")]
    SchemaMismatch(SchemaDiff),

    #[error("No data loaded; load rows from the 'Emails' sheet first")]
    NoData,

    #[error("Expected '{column}' column not found")]
    MissingRecipientColumn { column: String },

    #[error("No source file selected")]
    NoFileSelected,

    #[error("A dispatch run is already in progress")]
    DispatchInProgress,

    #[error("Dispatch run ended abnormally: {reason}")]
    DispatchAborted { reason: String },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Schema,
    Dispatch,
    Transport,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MailerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MailerError::FileNotFound { .. }
            | MailerError::PermissionDenied { .. }
            | MailerError::UnreadableFormat { .. }
            | MailerError::NoFileSelected => ErrorCategory::Input,
            MailerError::MissingSheet { .. } | MailerError::SchemaMismatch(_) => {
                ErrorCategory::Schema
            }
            MailerError::NoData
            | MailerError::MissingRecipientColumn { .. }
            | MailerError::DispatchInProgress
            | MailerError::DispatchAborted { .. } => ErrorCategory::Dispatch,
            MailerError::Transport(_) => ErrorCategory::Transport,
            MailerError::ConfigError { .. }
            | MailerError::MissingConfigError { .. }
            | MailerError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            MailerError::IoError(_) | MailerError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Dispatch => match self {
                MailerError::DispatchAborted { .. } => ErrorSeverity::High,
                _ => ErrorSeverity::Medium,
            },
            ErrorCategory::Transport => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Schema | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MailerError::PermissionDenied { .. } => {
                "The workbook is locked or unreadable.".to_string()
            }
            MailerError::SchemaMismatch(diff) => format!("Unexpected columns. {}", diff),
            MailerError::MissingSheet { sheet, .. } => {
                format!("The workbook has no '{}' sheet.", sheet)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            MailerError::FileNotFound { .. } | MailerError::NoFileSelected => {
                "Choose an existing .xlsx or .xlsm file".to_string()
            }
            MailerError::PermissionDenied { .. } => {
                "Close the file in Excel and try again".to_string()
            }
            MailerError::UnreadableFormat { .. } => {
                "Save the workbook as .xlsx and retry".to_string()
            }
            MailerError::MissingSheet { sheet, .. } => {
                format!("Rename the data sheet to '{}'", sheet)
            }
            MailerError::SchemaMismatch(_) => {
                "Fix the header row in columns C:N to match the expected names and order"
                    .to_string()
            }
            MailerError::NoData => "Load a workbook that contains at least one row".to_string(),
            MailerError::MissingRecipientColumn { column } => {
                format!("Add a '{}' column to the table", column)
            }
            MailerError::DispatchInProgress => {
                "Wait for the current run to finish".to_string()
            }
            MailerError::Transport(TransportError::SmtpNotConfigured) => {
                "Add an [smtp] url to the configuration or use preview mode".to_string()
            }
            MailerError::Transport(_) | MailerError::DispatchAborted { .. } => {
                "Check the mail server settings and reload the workbook before retrying"
                    .to_string()
            }
            MailerError::ConfigError { .. }
            | MailerError::MissingConfigError { .. }
            | MailerError::InvalidConfigValueError { .. } => {
                "Check the configuration file".to_string()
            }
            MailerError::IoError(_) | MailerError::SerializationError(_) => {
                "Check disk space and file permissions".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MailerError>;
