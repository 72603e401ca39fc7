use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

pub type TaskId = String;
pub type BatchId = String;
pub type LogId = u64;
pub type Matricule = String;

/// Default page size of the payslip log browser.
pub const DEFAULT_LOG_PAGE_SIZE: u64 = 25;

/// Backend job state as reported by the task queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    #[default]
    Pending,
    Progress,
    Success,
    Failure,
    /// Any other queue state (`STARTED`, `RETRY`, ...). Never terminal.
    #[serde(other)]
    Other,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failure)
    }
}

/// Send job progress, replaced wholesale on every accepted poll.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    #[serde(default)]
    pub task_id: TaskId,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: f32,
    #[serde(default)]
    pub sent: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<String>,
}

impl ProgressSnapshot {
    /// Some payslips went out and some did not.
    pub fn is_partial_success(&self) -> bool {
        self.sent > 0 && self.failed > 0
    }
}

/// Response of the auto-send upload: either a task handle or a launch error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct AutoSendResponse {
    #[serde(default)]
    pub task_id: Option<TaskId>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PreviewStart {
    pub task_id: TaskId,
    pub batch_id: BatchId,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PreviewProgress {
    pub status: JobStatus,
    #[serde(default)]
    pub progress: f32,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub found: Option<u32>,
    #[serde(default)]
    pub errors_count: Option<u32>,
    #[serde(default)]
    pub result: Option<PreviewBatch>,
}

impl PreviewProgress {
    /// Approximate number of pages analysed so far, when the page count is known.
    pub fn pages_estimate(&self) -> Option<u32> {
        let total = self.total_pages?;
        let progress = f64::from(self.progress.clamp(0.0, 100.0));
        let estimate = (progress * f64::from(total) / 100.0).round() as u32;
        Some(estimate.max(1))
    }
}

/// Result of one payslip PDF analysis.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PreviewBatch {
    pub batch_id: BatchId,
    pub year: i32,
    pub month: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<PreviewItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PreviewItem {
    pub matricule: Matricule,
    #[serde(default)]
    pub employee_id: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fullname: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default)]
    pub page: u32,
    pub can_send: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendSelectedRequest {
    pub batch_id: BatchId,
    pub year: i32,
    pub month: u32,
    pub matricules: Vec<Matricule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SendStarted {
    pub task_id: TaskId,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub sent: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub pending: u32,
}

impl MonthSummary {
    /// Well-formed backend rows satisfy `total = sent + failed + pending`.
    pub fn is_consistent(&self) -> bool {
        u64::from(self.total)
            == u64::from(self.sent) + u64::from(self.failed) + u64::from(self.pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Sent,
    Failed,
    Pending,
}

impl LogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LogStatus::Sent => "sent",
            LogStatus::Failed => "failed",
            LogStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log status {0:?} (expected sent, failed or pending)")]
pub struct UnknownLogStatus(pub String);

impl FromStr for LogStatus {
    type Err = UnknownLogStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sent" => Ok(LogStatus::Sent),
            "failed" => Ok(LogStatus::Failed),
            "pending" => Ok(LogStatus::Pending),
            _ => Err(UnknownLogStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogEntry {
    pub id: LogId,
    pub matricule: Matricule,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    pub status: LogStatus,
    #[serde(default)]
    pub sent_at: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Paginated<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<T>,
}

/// Inclusive calendar date range used by the reporting endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The `days` days ending on `today`.
    pub fn last_days(today: NaiveDate, days: u64) -> Self {
        let start = today
            .checked_sub_days(Days::new(days))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("start", self.start.format("%Y-%m-%d").to_string()),
            ("end", self.end.format("%Y-%m-%d").to_string()),
        ]
    }
}

/// Year/month restriction of the log browser (a summary row, or a status card).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogScope {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub status: Option<LogStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub range: DateRange,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub status: Option<LogStatus>,
    pub search: Option<String>,
    pub page: u64,
    pub page_size: u64,
}

impl LogQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.range.query_pairs();
        if let Some(year) = self.year {
            pairs.push(("year", year.to_string()));
        }
        if let Some(month) = self.month {
            pairs.push(("month", month.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                pairs.push(("search", search.to_string()));
            }
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("page_size", self.page_size.to_string()));
        pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PayslipMonth {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for PayslipMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid month {0:?} (expected YYYY-MM)")]
pub struct InvalidPayslipMonth(pub String);

impl FromStr for PayslipMonth {
    type Err = InvalidPayslipMonth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidPayslipMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResendRequest {
    pub matricule: Matricule,
    #[serde(rename = "mois")]
    pub months: Vec<PayslipMonth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ResendOutcome {
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub not_found: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
