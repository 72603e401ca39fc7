use crate::summary::SummaryTotals;
use crate::{
    DateRange, JobStatus, LogEntry, LogId, LogScope, LogStatus, Matricule, MonthSummary,
    PayslipMonth, ProgressSnapshot, ResendOutcome, TaskId, UploadFlow,
};

#[derive(Debug, Clone, PartialEq)]
pub struct AppViewModel {
    pub period: DateRange,
    pub job: JobView,
    pub summary: Vec<MonthSummary>,
    pub totals: SummaryTotals,
    pub summary_loading: bool,
    pub logs: Option<LogsView>,
    pub last_send: Option<SendProgressView>,
    pub resend: ResendView,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobView {
    Idle,
    Uploading(UploadFlow),
    Analysing {
        task_id: TaskId,
        progress: f32,
        total_pages: Option<u32>,
        pages_estimate: Option<u32>,
        found: Option<u32>,
        errors_count: Option<u32>,
    },
    Selecting(SelectionView),
    Sending {
        task_id: TaskId,
        /// `None` until the first poll lands.
        progress: Option<SendProgressView>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionView {
    pub batch_id: String,
    pub year: i32,
    pub month: u32,
    pub total_pages: u32,
    pub query: String,
    /// Rows matching the search query.
    pub rows: Vec<RecipientRowView>,
    pub selected_count: usize,
    pub eligible_count: usize,
    pub all_selected: bool,
    pub can_confirm: bool,
    pub submitting: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientRowView {
    pub matricule: Matricule,
    pub fullname: String,
    pub email: String,
    pub page: u32,
    pub can_send: bool,
    pub reason: Option<String>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendProgressView {
    pub task_id: TaskId,
    pub status: JobStatus,
    pub progress: f32,
    pub sent: u32,
    pub failed: u32,
    pub total: u32,
    pub errors: Vec<String>,
}

impl SendProgressView {
    pub fn from_snapshot(snapshot: &ProgressSnapshot) -> Self {
        Self {
            task_id: snapshot.task_id.clone(),
            status: snapshot.status,
            progress: snapshot.progress.clamp(0.0, 100.0),
            sent: snapshot.sent,
            failed: snapshot.failed,
            total: snapshot.total,
            errors: snapshot.errors.clone(),
        }
    }

    /// `"18 sent / 2 failed / 20 total"`.
    pub fn counts_label(&self) -> String {
        counts_label(self.sent, self.failed, self.total)
    }
}

pub(crate) fn counts_label(sent: u32, failed: u32, total: u32) -> String {
    format!("{sent} sent / {failed} failed / {total} total")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogsView {
    pub scope: LogScope,
    pub status: Option<LogStatus>,
    pub search: String,
    pub page: u64,
    pub total_pages: u64,
    pub count: u64,
    pub rows: Vec<LogEntry>,
    pub loading: bool,
    pub pending_delete: Option<LogId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResendView {
    pub matricule: Option<Matricule>,
    pub months: Option<Vec<PayslipMonth>>,
    pub in_flight: bool,
    pub last_outcome: Option<ResendOutcome>,
}
