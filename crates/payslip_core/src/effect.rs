use std::path::PathBuf;

use crate::{
    DateRange, LogId, LogQuery, Matricule, ResendRequest, SendSelectedRequest, TaskId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Upload a PDF to the send-everything endpoint.
    UploadAuto { file: PathBuf },
    /// Upload a PDF for asynchronous analysis.
    StartPreview { file: PathBuf },
    WatchPreview { task_id: TaskId },
    ConfirmSend(SendSelectedRequest),
    WatchSend { task_id: TaskId },
    StopWatching { task_id: TaskId },
    FetchSummary(DateRange),
    FetchLogs(LogQuery),
    DeleteLog { id: LogId },
    FetchAvailableMonths { matricule: Matricule },
    Resend(ResendRequest),
    Notify(Notification),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A user-facing toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}
