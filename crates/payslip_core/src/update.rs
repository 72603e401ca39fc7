use crate::selection::RecipientSelector;
use crate::state::{LogsState, UploadFlow};
use crate::summary::sort_chronologically;
use crate::view_model::counts_label;
use crate::{
    AppState, Effect, JobPhase, JobStatus, LogEntry, LogId, LogQuery, Msg, Notification,
    Operation, PageMove, Paginated, PreviewProgress, ProgressSnapshot,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::PeriodChanged(range) => {
            state.period = range;
            state.mark_dirty();
            Vec::new()
        }
        Msg::SummaryRequested => {
            state.summary_loading = true;
            state.mark_dirty();
            vec![Effect::FetchSummary(state.period)]
        }
        Msg::SummaryLoaded(mut rows) => {
            sort_chronologically(&mut rows);
            state.summary = rows;
            state.summary_loading = false;
            state.mark_dirty();
            Vec::new()
        }
        Msg::AutoUploadRequested { file } => {
            // One outstanding job at a time: re-submission is blocked, not queued.
            if state.has_active_job() {
                return (state, Vec::new());
            }
            state.job = JobPhase::Uploading(UploadFlow::Auto);
            state.mark_dirty();
            vec![Effect::UploadAuto { file }]
        }
        Msg::AutoSendAccepted { task_id } => {
            if state.job != JobPhase::Uploading(UploadFlow::Auto) {
                return (state, Vec::new());
            }
            state.job = JobPhase::Sending {
                task_id: task_id.clone(),
                snapshot: None,
            };
            state.mark_dirty();
            vec![
                Effect::WatchSend { task_id },
                Effect::Notify(Notification::info(
                    "Automatic send started, tracking progress.",
                )),
            ]
        }
        Msg::PreviewUploadRequested { file } => {
            if state.has_active_job() {
                return (state, Vec::new());
            }
            state.job = JobPhase::Uploading(UploadFlow::Preview);
            state.mark_dirty();
            vec![Effect::StartPreview { file }]
        }
        Msg::PreviewStarted(start) => {
            if state.job != JobPhase::Uploading(UploadFlow::Preview) {
                return (state, Vec::new());
            }
            state.job = JobPhase::Analysing {
                task_id: start.task_id.clone(),
                batch_id: start.batch_id,
                progress: None,
            };
            state.mark_dirty();
            vec![
                Effect::WatchPreview {
                    task_id: start.task_id,
                },
                Effect::Notify(Notification::info("Analysis in progress.")),
            ]
        }
        Msg::PreviewProgressed(progress) => {
            if let JobPhase::Analysing { progress: slot, .. } = &mut state.job {
                *slot = Some(progress);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::PreviewFinished(progress) => on_preview_finished(&mut state, progress),
        Msg::SelectionClosed => match &state.job {
            JobPhase::Analysing { task_id, .. } => {
                let task_id = task_id.clone();
                state.job = JobPhase::Idle;
                state.mark_dirty();
                vec![Effect::StopWatching { task_id }]
            }
            JobPhase::Selecting(selector) if !selector.is_submitting() => {
                state.job = JobPhase::Idle;
                state.mark_dirty();
                Vec::new()
            }
            _ => Vec::new(),
        },
        Msg::RecipientToggled(matricule) => {
            let changed = editable_selector(&mut state)
                .is_some_and(|selector| selector.toggle(&matricule));
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::AllRecipientsToggled => {
            let changed = editable_selector(&mut state)
                .map(RecipientSelector::toggle_all)
                .is_some();
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::RecipientSearchChanged(text) => {
            if let JobPhase::Selecting(selector) = &mut state.job {
                selector.search(text);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ConfirmClicked => {
            let request = match &mut state.job {
                JobPhase::Selecting(selector) => selector.begin_confirm(),
                _ => None,
            };
            match request {
                Some(request) => {
                    state.mark_dirty();
                    vec![Effect::ConfirmSend(request)]
                }
                None => Vec::new(),
            }
        }
        Msg::SendStarted(started) => {
            let confirming =
                matches!(&state.job, JobPhase::Selecting(selector) if selector.is_submitting());
            if !confirming {
                return (state, Vec::new());
            }
            state.job = JobPhase::Sending {
                task_id: started.task_id.clone(),
                snapshot: None,
            };
            state.mark_dirty();
            let message = started
                .message
                .unwrap_or_else(|| "Send started, tracking progress.".to_string());
            vec![
                Effect::WatchSend {
                    task_id: started.task_id,
                },
                Effect::Notify(Notification::info(message)),
            ]
        }
        Msg::SendProgressed(progress) => {
            if let JobPhase::Sending { snapshot, .. } = &mut state.job {
                *snapshot = Some(progress);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SendFinished(snapshot) => on_send_finished(&mut state, snapshot),
        Msg::LogsOpened(scope) => {
            let mut logs = LogsState::new(scope, state.log_page_size);
            logs.loading = true;
            let query = logs.query(state.period);
            state.logs = Some(logs);
            state.mark_dirty();
            vec![Effect::FetchLogs(query)]
        }
        Msg::LogsClosed => {
            if state.logs.take().is_some() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::LogStatusFilterChanged(status) => refetch_logs(&mut state, |logs| {
            logs.status = status;
            logs.pager.reset();
            true
        }),
        Msg::LogSearchChanged(search) => refetch_logs(&mut state, |logs| {
            logs.search = search;
            logs.pager.reset();
            true
        }),
        Msg::LogPageRequested(movement) => refetch_logs(&mut state, |logs| match movement {
            PageMove::Next => logs.pager.next(),
            PageMove::Previous => logs.pager.previous(),
            PageMove::To(page) => logs.pager.go_to(page),
        }),
        Msg::LogsLoaded { query, page } => on_logs_loaded(&mut state, query, page),
        Msg::DeleteLogClicked(id) => on_delete_clicked(&mut state, id),
        Msg::LogDeleted(id) => on_log_deleted(&mut state, id),
        Msg::AvailableMonthsRequested(matricule) => {
            state.resend.matricule = Some(matricule.clone());
            state.resend.months = None;
            state.mark_dirty();
            vec![Effect::FetchAvailableMonths { matricule }]
        }
        Msg::AvailableMonthsLoaded {
            matricule,
            mut months,
        } => {
            if state.resend.matricule.as_deref() != Some(matricule.as_str()) {
                return (state, Vec::new());
            }
            months.sort();
            months.dedup();
            state.resend.months = Some(months);
            state.mark_dirty();
            Vec::new()
        }
        Msg::ResendRequested(request) => {
            if state.resend.in_flight || request.months.is_empty() {
                return (state, Vec::new());
            }
            state.resend.matricule = Some(request.matricule.clone());
            state.resend.in_flight = true;
            state.mark_dirty();
            vec![Effect::Resend(request)]
        }
        Msg::Resent(outcome) => {
            if !state.resend.in_flight {
                return (state, Vec::new());
            }
            state.resend.in_flight = false;
            let notification = if outcome.not_found.is_empty() && outcome.errors.is_empty() {
                Notification::success(if outcome.message.is_empty() {
                    "Payslips sent.".to_string()
                } else {
                    outcome.message.clone()
                })
            } else {
                Notification::warning(format!(
                    "Payslips partially sent: {} not found, {} error(s).",
                    outcome.not_found.len(),
                    outcome.errors.len()
                ))
            };
            state.resend.last_outcome = Some(outcome);
            state.mark_dirty();
            vec![Effect::Notify(notification)]
        }
        Msg::RequestFailed { operation, message } => {
            on_request_failed(&mut state, operation, message)
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn on_logs_loaded(state: &mut AppState, query: LogQuery, page: Paginated<LogEntry>) -> Vec<Effect> {
    let period = state.period;
    let Some(logs) = state.logs.as_mut() else {
        return Vec::new();
    };
    // A response for a query that is no longer displayed.
    if logs.query(period) != query {
        return Vec::new();
    }
    logs.pager.set_count(page.count);
    logs.rows = page.results;
    logs.loading = false;
    // Rows vanished server-side and the current page is now past the end.
    let effects = if logs.rows.is_empty() && logs.pager.page() > logs.pager.total_pages() {
        logs.pager.go_to(logs.pager.total_pages());
        logs.loading = true;
        vec![Effect::FetchLogs(logs.query(period))]
    } else {
        Vec::new()
    };
    state.mark_dirty();
    effects
}

fn on_delete_clicked(state: &mut AppState, id: LogId) -> Vec<Effect> {
    let Some(logs) = state.logs.as_mut() else {
        return Vec::new();
    };
    if logs.pending_delete.is_some() || !logs.rows.iter().any(|row| row.id == id) {
        return Vec::new();
    }
    logs.pending_delete = Some(id);
    state.mark_dirty();
    vec![Effect::DeleteLog { id }]
}

fn on_log_deleted(state: &mut AppState, id: LogId) -> Vec<Effect> {
    let period = state.period;
    let Some(logs) = state.logs.as_mut() else {
        return Vec::new();
    };
    if logs.pending_delete != Some(id) {
        return Vec::new();
    }
    logs.pending_delete = None;
    logs.pager.after_delete();
    logs.rows.retain(|row| row.id != id);
    logs.loading = true;
    let query = logs.query(period);
    state.summary_loading = true;
    state.mark_dirty();
    vec![
        Effect::Notify(Notification::success("Log entry deleted.")),
        Effect::FetchLogs(query),
        Effect::FetchSummary(period),
    ]
}

fn on_preview_finished(state: &mut AppState, progress: PreviewProgress) -> Vec<Effect> {
    if !matches!(state.job, JobPhase::Analysing { .. }) {
        return Vec::new();
    }
    state.mark_dirty();
    match (progress.status, progress.result) {
        (JobStatus::Success, Some(batch)) => {
            let count = batch.items.len();
            state.job = JobPhase::Selecting(RecipientSelector::new(batch));
            vec![Effect::Notify(Notification::success(format!(
                "Analysis complete: {count} matricule(s)."
            )))]
        }
        _ => {
            // The batch is gone for good; only a fresh upload can recover.
            state.job = JobPhase::Idle;
            vec![Effect::Notify(Notification::error(
                "Preview analysis failed. Upload the file again.",
            ))]
        }
    }
}

fn on_send_finished(state: &mut AppState, snapshot: ProgressSnapshot) -> Vec<Effect> {
    if !matches!(state.job, JobPhase::Sending { .. }) {
        return Vec::new();
    }
    let notification = send_outcome(&snapshot);
    state.job = JobPhase::Idle;
    state.last_send = Some(snapshot);
    state.summary_loading = true;
    state.mark_dirty();

    let mut effects = vec![
        Effect::Notify(notification),
        Effect::FetchSummary(state.period),
    ];
    if let Some(query) = state.log_query() {
        if let Some(logs) = state.logs.as_mut() {
            logs.loading = true;
        }
        effects.push(Effect::FetchLogs(query));
    }
    effects
}

/// Toast for a finished send job.
pub fn send_outcome(snapshot: &ProgressSnapshot) -> Notification {
    let counts = counts_label(snapshot.sent, snapshot.failed, snapshot.total);
    match snapshot.status {
        JobStatus::Success if snapshot.failed == 0 => {
            Notification::success(format!("All payslips have been sent ({counts})."))
        }
        JobStatus::Success if snapshot.is_partial_success() => {
            Notification::warning(format!("Send finished with failures: {counts}."))
        }
        // A finished job that delivered nothing is a failure.
        _ => Notification::error(format!("Errors occurred while sending payslips ({counts}).")),
    }
}

fn on_request_failed(state: &mut AppState, operation: Operation, message: String) -> Vec<Effect> {
    match operation {
        Operation::AutoUpload => {
            if state.job == JobPhase::Uploading(UploadFlow::Auto) {
                state.job = JobPhase::Idle;
            }
        }
        Operation::PreviewUpload => {
            if state.job == JobPhase::Uploading(UploadFlow::Preview) {
                state.job = JobPhase::Idle;
            }
        }
        Operation::ConfirmSend => {
            if let JobPhase::Selecting(selector) = &mut state.job {
                selector.confirm_failed();
            }
        }
        Operation::Summary => state.summary_loading = false,
        Operation::Logs => {
            if let Some(logs) = state.logs.as_mut() {
                logs.loading = false;
            }
        }
        Operation::DeleteLog(id) => {
            if let Some(logs) = state.logs.as_mut() {
                if logs.pending_delete == Some(id) {
                    logs.pending_delete = None;
                }
            }
        }
        Operation::AvailableMonths(matricule) => {
            if state.resend.matricule.as_deref() == Some(matricule.as_str()) {
                state.resend.months = Some(Vec::new());
            }
        }
        Operation::Resend => state.resend.in_flight = false,
    }
    state.mark_dirty();
    vec![Effect::Notify(Notification::error(message))]
}

fn editable_selector(state: &mut AppState) -> Option<&mut RecipientSelector> {
    match &mut state.job {
        JobPhase::Selecting(selector) if !selector.is_submitting() => Some(selector),
        _ => None,
    }
}

fn refetch_logs(state: &mut AppState, change: impl FnOnce(&mut LogsState) -> bool) -> Vec<Effect> {
    let period = state.period;
    let Some(logs) = state.logs.as_mut() else {
        return Vec::new();
    };
    if !change(logs) {
        return Vec::new();
    }
    logs.loading = true;
    let query = logs.query(period);
    state.mark_dirty();
    vec![Effect::FetchLogs(query)]
}
