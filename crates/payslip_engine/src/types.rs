use std::fmt;

use payslip_core::{
    LogEntry, LogId, LogQuery, Matricule, MonthSummary, Operation, Paginated, PayslipMonth,
    PreviewProgress, PreviewStart, ProgressSnapshot, ResendOutcome, SendStarted, TaskId,
};

use crate::auth::SessionTokens;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    LoginFinished(Result<(), ApiError>),
    /// Tokens were stored, refreshed or cleared.
    SessionChanged(Option<SessionTokens>),
    AutoSendAccepted {
        task_id: TaskId,
    },
    PreviewStarted(PreviewStart),
    PreviewProgressed(PreviewProgress),
    PreviewFinished(PreviewProgress),
    SendStarted(SendStarted),
    SendProgressed(ProgressSnapshot),
    SendFinished(ProgressSnapshot),
    SummaryLoaded(Vec<MonthSummary>),
    LogsLoaded {
        query: LogQuery,
        page: Paginated<LogEntry>,
    },
    LogDeleted(LogId),
    AvailableMonthsLoaded {
        matricule: Matricule,
        months: Vec<PayslipMonth>,
    },
    Resent(ResendOutcome),
    Failed {
        operation: Operation,
        error: ApiError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Text suitable for a notification. Messages written by the backend are
    /// shown as-is; transport failures get a generic sentence.
    pub fn user_message(&self) -> String {
        match &self.kind {
            FailureKind::Backend { .. } | FailureKind::InvalidFile => self.message.clone(),
            FailureKind::Network => "Cannot reach the server. Check your connection.".to_string(),
            FailureKind::Timeout => "The server took too long to respond.".to_string(),
            FailureKind::HttpStatus(code) => format!("The request failed (HTTP {code})."),
            FailureKind::Unauthorized => "Authentication required. Run `login` first.".to_string(),
            FailureKind::SessionExpired => "Session expired. Please log in again.".to_string(),
            FailureKind::Decode => "Unexpected response from the server.".to_string(),
            FailureKind::InvalidUrl => format!("Invalid server address: {}", self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The upload could not be read or is not a PDF.
    InvalidFile,
    InvalidUrl,
    Network,
    Timeout,
    /// Non-2xx answer without a readable message.
    HttpStatus(u16),
    /// Error written by the backend (`{"error": ...}` or `{"detail": ...}`).
    Backend { status: u16 },
    Unauthorized,
    SessionExpired,
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidFile => write!(f, "invalid file"),
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Backend { status } => write!(f, "backend error (http {status})"),
            FailureKind::Unauthorized => write!(f, "unauthorized"),
            FailureKind::SessionExpired => write!(f, "session expired"),
            FailureKind::Decode => write!(f, "unexpected response body"),
        }
    }
}
