use std::path::PathBuf;

use crate::{
    DateRange, LogEntry, LogId, LogQuery, LogScope, LogStatus, Matricule, MonthSummary,
    Paginated, PayslipMonth, PreviewProgress, PreviewStart, ProgressSnapshot, ResendOutcome,
    ResendRequest, SendStarted, TaskId,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User edited the reporting period (applied with `SummaryRequested`).
    PeriodChanged(DateRange),
    /// User asked to (re)load the monthly summary.
    SummaryRequested,
    SummaryLoaded(Vec<MonthSummary>),
    /// User picked a PDF for the send-everything flow.
    AutoUploadRequested { file: PathBuf },
    /// Backend accepted the auto-send upload and started a job.
    AutoSendAccepted { task_id: TaskId },
    /// User picked a PDF for the preview-then-select flow.
    PreviewUploadRequested { file: PathBuf },
    PreviewStarted(PreviewStart),
    /// Newest non-terminal preview poll.
    PreviewProgressed(PreviewProgress),
    /// Terminal preview poll.
    PreviewFinished(PreviewProgress),
    /// User dismissed the recipient selection.
    SelectionClosed,
    RecipientToggled(Matricule),
    AllRecipientsToggled,
    RecipientSearchChanged(String),
    /// User confirmed the selected recipients.
    ConfirmClicked,
    /// Backend started the send job for the confirmed recipients.
    SendStarted(SendStarted),
    /// Newest non-terminal send poll.
    SendProgressed(ProgressSnapshot),
    /// Terminal send poll.
    SendFinished(ProgressSnapshot),
    LogsOpened(LogScope),
    LogsClosed,
    LogStatusFilterChanged(Option<LogStatus>),
    LogSearchChanged(String),
    LogPageRequested(PageMove),
    LogsLoaded {
        query: LogQuery,
        page: Paginated<LogEntry>,
    },
    DeleteLogClicked(LogId),
    LogDeleted(LogId),
    AvailableMonthsRequested(Matricule),
    AvailableMonthsLoaded {
        matricule: Matricule,
        months: Vec<PayslipMonth>,
    },
    ResendRequested(ResendRequest),
    Resent(ResendOutcome),
    /// An operation failed at its boundary; `message` is shown to the user.
    RequestFailed {
        operation: Operation,
        message: String,
    },
    /// UI/render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMove {
    Next,
    Previous,
    To(u64),
}

/// Operation boundary at which a failure was caught.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    AutoUpload,
    PreviewUpload,
    ConfirmSend,
    Summary,
    Logs,
    DeleteLog(LogId),
    AvailableMonths(Matricule),
    Resend,
}
