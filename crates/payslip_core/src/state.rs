use crate::pagination::LogPager;
use crate::selection::RecipientSelector;
use crate::summary::totals;
use crate::view_model::{
    AppViewModel, JobView, LogsView, RecipientRowView, ResendView, SelectionView,
    SendProgressView,
};
use crate::{
    BatchId, DateRange, LogEntry, LogId, LogQuery, LogScope, LogStatus, Matricule,
    MonthSummary, PayslipMonth, PreviewProgress, ProgressSnapshot, ResendOutcome, TaskId,
    DEFAULT_LOG_PAGE_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFlow {
    Auto,
    Preview,
}

/// The single outstanding job of the page, if any.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    /// File upload in flight.
    Uploading(UploadFlow),
    /// Preview analysis running on the backend.
    Analysing {
        task_id: TaskId,
        batch_id: BatchId,
        progress: Option<PreviewProgress>,
    },
    /// Preview ready; the user is choosing recipients.
    Selecting(RecipientSelector),
    /// Send job running on the backend.
    Sending {
        task_id: TaskId,
        snapshot: Option<ProgressSnapshot>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogsState {
    pub(crate) scope: LogScope,
    pub(crate) status: Option<LogStatus>,
    pub(crate) search: String,
    pub(crate) pager: LogPager,
    pub(crate) rows: Vec<LogEntry>,
    pub(crate) loading: bool,
    pub(crate) pending_delete: Option<LogId>,
}

impl LogsState {
    pub(crate) fn new(scope: LogScope, page_size: u64) -> Self {
        Self {
            scope,
            status: scope.status,
            search: String::new(),
            pager: LogPager::new(page_size),
            rows: Vec::new(),
            loading: false,
            pending_delete: None,
        }
    }

    pub(crate) fn query(&self, range: DateRange) -> LogQuery {
        let search = self.search.trim();
        LogQuery {
            range,
            year: self.scope.year,
            month: self.scope.month,
            status: self.status,
            search: (!search.is_empty()).then(|| search.to_string()),
            page: self.pager.page(),
            page_size: self.pager.page_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ResendState {
    pub(crate) matricule: Option<Matricule>,
    pub(crate) months: Option<Vec<PayslipMonth>>,
    pub(crate) in_flight: bool,
    pub(crate) last_outcome: Option<ResendOutcome>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub(crate) period: DateRange,
    pub(crate) log_page_size: u64,
    pub(crate) job: JobPhase,
    pub(crate) summary: Vec<MonthSummary>,
    pub(crate) summary_loading: bool,
    pub(crate) logs: Option<LogsState>,
    pub(crate) last_send: Option<ProgressSnapshot>,
    pub(crate) resend: ResendState,
    dirty: bool,
}

impl AppState {
    pub fn new(period: DateRange) -> Self {
        Self {
            period,
            log_page_size: DEFAULT_LOG_PAGE_SIZE,
            job: JobPhase::Idle,
            summary: Vec::new(),
            summary_loading: false,
            logs: None,
            last_send: None,
            resend: ResendState::default(),
            dirty: false,
        }
    }

    pub fn with_log_page_size(mut self, page_size: u64) -> Self {
        self.log_page_size = page_size.max(1);
        self
    }

    pub fn job(&self) -> &JobPhase {
        &self.job
    }

    /// True while any upload, analysis, selection or send is outstanding.
    pub fn has_active_job(&self) -> bool {
        !matches!(self.job, JobPhase::Idle)
    }

    pub fn period(&self) -> DateRange {
        self.period
    }

    /// Current log browser query, when the browser is open.
    pub fn log_query(&self) -> Option<LogQuery> {
        self.logs.as_ref().map(|logs| logs.query(self.period))
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            period: self.period,
            job: self.job_view(),
            totals: totals(&self.summary),
            summary: self.summary.clone(),
            summary_loading: self.summary_loading,
            logs: self.logs.as_ref().map(|logs| LogsView {
                scope: logs.scope,
                status: logs.status,
                search: logs.search.clone(),
                page: logs.pager.page(),
                total_pages: logs.pager.total_pages(),
                count: logs.pager.count(),
                rows: logs.rows.clone(),
                loading: logs.loading,
                pending_delete: logs.pending_delete,
            }),
            last_send: self.last_send.as_ref().map(SendProgressView::from_snapshot),
            resend: ResendView {
                matricule: self.resend.matricule.clone(),
                months: self.resend.months.clone(),
                in_flight: self.resend.in_flight,
                last_outcome: self.resend.last_outcome.clone(),
            },
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn job_view(&self) -> JobView {
        match &self.job {
            JobPhase::Idle => JobView::Idle,
            JobPhase::Uploading(flow) => JobView::Uploading(*flow),
            JobPhase::Analysing {
                task_id, progress, ..
            } => {
                let progress = progress.clone().unwrap_or_default();
                JobView::Analysing {
                    task_id: task_id.clone(),
                    progress: progress.progress,
                    total_pages: progress.total_pages,
                    pages_estimate: progress.pages_estimate(),
                    found: progress.found,
                    errors_count: progress.errors_count,
                }
            }
            JobPhase::Selecting(selector) => JobView::Selecting(selection_view(selector)),
            JobPhase::Sending { task_id, snapshot } => JobView::Sending {
                task_id: task_id.clone(),
                progress: snapshot.as_ref().map(SendProgressView::from_snapshot),
            },
        }
    }
}

fn selection_view(selector: &RecipientSelector) -> SelectionView {
    let batch = selector.batch();
    SelectionView {
        batch_id: batch.batch_id.clone(),
        year: batch.year,
        month: batch.month,
        total_pages: batch.total_pages,
        query: selector.query().to_string(),
        rows: selector
            .visible()
            .into_iter()
            .map(|item| RecipientRowView {
                matricule: item.matricule.clone(),
                fullname: item.fullname.clone(),
                email: item.email.clone(),
                page: item.page,
                can_send: item.can_send,
                reason: item.reason.clone(),
                selected: selector.is_selected(&item.matricule),
            })
            .collect(),
        selected_count: selector.selected_count(),
        eligible_count: selector.eligible_count(),
        all_selected: selector.all_selected(),
        can_confirm: selector.can_confirm(),
        submitting: selector.is_submitting(),
        errors: batch.errors.clone(),
    }
}
