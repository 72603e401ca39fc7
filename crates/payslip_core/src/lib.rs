//! Payslip core: pure state machine, wire types and view-model helpers.
mod effect;
mod msg;
mod pagination;
mod poll;
mod selection;
mod state;
mod summary;
mod types;
mod update;
mod view_model;

pub use effect::{Effect, Notification, NotificationLevel};
pub use msg::{Msg, Operation, PageMove};
pub use pagination::LogPager;
pub use poll::{PollSeq, PollStatus, PollTracker, PollVerdict};
pub use selection::RecipientSelector;
pub use state::{AppState, JobPhase, UploadFlow};
pub use summary::{sort_chronologically, totals, SummaryTotals};
pub use types::{
    AutoSendResponse, BatchId, DateRange, InvalidPayslipMonth, JobStatus, LogEntry, LogId,
    LogQuery, LogScope, LogStatus, Matricule, MonthSummary, Paginated, PayslipMonth,
    PreviewBatch, PreviewItem, PreviewProgress, PreviewStart, ProgressSnapshot, ResendOutcome,
    ResendRequest, SendSelectedRequest, SendStarted, TaskId, UnknownLogStatus,
    DEFAULT_LOG_PAGE_SIZE,
};
pub use update::{send_outcome, update};
pub use view_model::{
    AppViewModel, JobView, LogsView, RecipientRowView, ResendView, SelectionView,
    SendProgressView,
};
