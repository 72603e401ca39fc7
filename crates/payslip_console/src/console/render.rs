//! Plain-text rendering of view models.

use std::fmt::Write;

use payslip_core::{
    DateRange, JobView, LogsView, MonthSummary, Notification, NotificationLevel, PayslipMonth,
    ResendOutcome, SelectionView, SummaryTotals, UploadFlow,
};

pub fn notification(notification: &Notification) -> String {
    let tag = match notification.level {
        NotificationLevel::Info => "info",
        NotificationLevel::Success => " ok ",
        NotificationLevel::Warning => "warn",
        NotificationLevel::Error => "fail",
    };
    format!("[{tag}] {}", notification.message)
}

/// One status line for the running job, `None` when there is nothing to report.
pub fn job_line(job: &JobView) -> Option<String> {
    match job {
        JobView::Idle | JobView::Selecting(_) => None,
        JobView::Uploading(UploadFlow::Auto) => Some("Uploading payslips for sending...".into()),
        JobView::Uploading(UploadFlow::Preview) => {
            Some("Uploading payslips for analysis...".into())
        }
        JobView::Analysing {
            progress,
            total_pages,
            pages_estimate,
            found,
            errors_count,
            ..
        } => {
            let mut line = format!("Analysing {progress:>3.0}%");
            if let (Some(estimate), Some(total)) = (pages_estimate, total_pages) {
                let _ = write!(line, "  page ~{estimate}/{total}");
            }
            if let Some(found) = found {
                let _ = write!(line, "  {found} found");
            }
            if let Some(errors) = errors_count.filter(|count| *count > 0) {
                let _ = write!(line, "  {errors} error(s)");
            }
            Some(line)
        }
        JobView::Sending { task_id, progress } => Some(match progress {
            None => format!("Sending (task {task_id}), waiting for first progress..."),
            Some(progress) => format!(
                "Sending {:>3.0}%  {}",
                progress.progress,
                progress.counts_label()
            ),
        }),
    }
}

pub fn selection(view: &SelectionView) -> String {
    let mut out = format!(
        "Batch {} for {:04}-{:02} ({} pages): {}/{} eligible selected\n",
        view.batch_id,
        view.year,
        view.month,
        view.total_pages,
        view.selected_count,
        view.eligible_count
    );
    if !view.query.trim().is_empty() {
        let _ = writeln!(out, "Filter: {:?} ({} match)", view.query, view.rows.len());
    }
    for row in &view.rows {
        let mark = match (row.can_send, row.selected) {
            (false, _) => "[-]",
            (true, true) => "[x]",
            (true, false) => "[ ]",
        };
        let _ = write!(
            out,
            "{mark} {:<10} {:<28} {:<32} p.{}",
            row.matricule, row.fullname, row.email, row.page
        );
        if let Some(reason) = &row.reason {
            let _ = write!(out, "  ({reason})");
        }
        out.push('\n');
    }
    for error in &view.errors {
        let _ = writeln!(out, "  ! {error}");
    }
    if view.submitting {
        out.push_str("Submitting...\n");
    }
    out
}

pub fn summary(period: &DateRange, rows: &[MonthSummary], totals: &SummaryTotals) -> String {
    let mut out = format!("Payslips sent from {} to {}\n", period.start, period.end);
    if rows.is_empty() {
        out.push_str("No payslips in this period.\n");
        return out;
    }
    let _ = writeln!(
        out,
        "{:<8} {:>7} {:>7} {:>7} {:>7}",
        "month", "total", "sent", "failed", "pending"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:04}-{:02}  {:>7} {:>7} {:>7} {:>7}",
            row.year, row.month, row.total, row.sent, row.failed, row.pending
        );
    }
    let _ = writeln!(
        out,
        "{:<8} {:>7} {:>7} {:>7} {:>7}",
        "all", totals.total, totals.sent, totals.failed, totals.pending
    );
    out
}

pub fn logs(view: &LogsView) -> String {
    let mut out = String::new();
    let mut filters = Vec::new();
    if let (Some(year), Some(month)) = (view.scope.year, view.scope.month) {
        filters.push(format!("{year:04}-{month:02}"));
    }
    if let Some(status) = view.status {
        filters.push(format!("status={status}"));
    }
    if !view.search.trim().is_empty() {
        filters.push(format!("search={:?}", view.search.trim()));
    }
    let _ = write!(
        out,
        "Logs page {}/{} ({} entries)",
        view.page, view.total_pages, view.count
    );
    if !filters.is_empty() {
        let _ = write!(out, " [{}]", filters.join(", "));
    }
    out.push('\n');
    if view.rows.is_empty() {
        out.push_str("No log entries.\n");
    }
    for row in &view.rows {
        let _ = write!(
            out,
            "#{:<6} {:<10} {:<32} {:<8} {}",
            row.id,
            row.matricule,
            row.email,
            row.status.to_string(),
            row.sent_at.as_deref().unwrap_or("-")
        );
        if let Some(message) = row.message.as_deref().filter(|m| !m.is_empty()) {
            let _ = write!(out, "  {message}");
        }
        out.push('\n');
    }
    out
}

pub fn months(matricule: &str, months: &[PayslipMonth]) -> String {
    if months.is_empty() {
        return format!("No payslips on record for {matricule}.\n");
    }
    let listed: Vec<String> = months.iter().map(PayslipMonth::to_string).collect();
    format!("Payslips for {matricule}: {}\n", listed.join(", "))
}

pub fn resend_outcome(outcome: &ResendOutcome) -> String {
    let mut out = String::new();
    for month in &outcome.not_found {
        let _ = writeln!(out, "  not found: {month}");
    }
    for error in &outcome.errors {
        let _ = writeln!(out, "  error: {error}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use payslip_core::{
        JobStatus, LogEntry, LogScope, LogStatus, RecipientRowView, SendProgressView,
    };
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn idle_and_selection_have_no_status_line() {
        assert_eq!(job_line(&JobView::Idle), None);
    }

    #[test]
    fn sending_line_shows_counts() {
        let line = job_line(&JobView::Sending {
            task_id: "T1".to_string(),
            progress: Some(SendProgressView {
                task_id: "T1".to_string(),
                status: JobStatus::Progress,
                progress: 40.0,
                sent: 8,
                failed: 0,
                total: 20,
                errors: Vec::new(),
            }),
        });
        assert_eq!(
            line.as_deref(),
            Some("Sending  40%  8 sent / 0 failed / 20 total")
        );
    }

    #[test]
    fn analysing_line_includes_page_estimate() {
        let line = job_line(&JobView::Analysing {
            task_id: "T1".to_string(),
            progress: 25.0,
            total_pages: Some(300),
            pages_estimate: Some(75),
            found: Some(70),
            errors_count: Some(0),
        })
        .unwrap();
        assert_eq!(line, "Analysing  25%  page ~75/300  70 found");
    }

    #[test]
    fn selection_marks_ineligible_rows() {
        let view = SelectionView {
            batch_id: "B1".to_string(),
            year: 2024,
            month: 3,
            total_pages: 2,
            query: String::new(),
            rows: vec![
                RecipientRowView {
                    matricule: "M1".to_string(),
                    fullname: "Ana Silva".to_string(),
                    email: "ana@example.com".to_string(),
                    page: 1,
                    can_send: true,
                    reason: None,
                    selected: true,
                },
                RecipientRowView {
                    matricule: "M2".to_string(),
                    fullname: "Bruno Costa".to_string(),
                    email: String::new(),
                    page: 2,
                    can_send: false,
                    reason: Some("no email".to_string()),
                    selected: false,
                },
            ],
            selected_count: 1,
            eligible_count: 1,
            all_selected: true,
            can_confirm: true,
            submitting: false,
            errors: Vec::new(),
        };
        let text = selection(&view);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Batch B1 for 2024-03 (2 pages): 1/1 eligible selected");
        assert!(lines[1].starts_with("[x] M1"));
        assert!(lines[2].starts_with("[-] M2"));
        assert!(lines[2].ends_with("(no email)"));
    }

    #[test]
    fn summary_ends_with_totals() {
        let rows = vec![
            MonthSummary {
                year: 2024,
                month: 2,
                total: 10,
                sent: 9,
                failed: 1,
                pending: 0,
            },
            MonthSummary {
                year: 2024,
                month: 3,
                total: 5,
                sent: 5,
                failed: 0,
                pending: 0,
            },
        ];
        let totals = payslip_core::totals(&rows);
        let text = summary(&DateRange::new(date(2024, 1, 1), date(2024, 3, 31)), &rows, &totals);
        let last = text.lines().last().unwrap();
        assert_eq!(
            last.split_whitespace().collect::<Vec<_>>(),
            vec!["all", "15", "14", "1", "0"]
        );
    }

    #[test]
    fn empty_summary_says_so() {
        let text = summary(
            &DateRange::new(date(2024, 1, 1), date(2024, 3, 31)),
            &[],
            &SummaryTotals::default(),
        );
        assert!(text.contains("No payslips in this period."));
    }

    #[test]
    fn logs_header_lists_filters() {
        let view = LogsView {
            scope: LogScope {
                year: Some(2024),
                month: Some(3),
                status: None,
            },
            status: Some(LogStatus::Failed),
            search: "silva".to_string(),
            page: 2,
            total_pages: 3,
            count: 45,
            rows: vec![LogEntry {
                id: 42,
                matricule: "M1".to_string(),
                email: "ana@example.com".to_string(),
                status: LogStatus::Failed,
                sent_at: None,
                message: Some("mailbox full".to_string()),
            }],
            loading: false,
            pending_delete: None,
        };
        let text = logs(&view);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Logs page 2/3 (45 entries) [2024-03, status=failed, search=\"silva\"]"
        );
        assert!(lines[1].starts_with("#42"));
        assert!(lines[1].ends_with("mailbox full"));
    }

    #[test]
    fn months_are_listed_as_year_month() {
        let months = vec![
            PayslipMonth {
                year: 2023,
                month: 12,
            },
            PayslipMonth {
                year: 2024,
                month: 1,
            },
        ];
        assert_eq!(
            super::months("M1", &months),
            "Payslips for M1: 2023-12, 2024-01\n"
        );
        assert_eq!(
            super::months("M1", &[]),
            "No payslips on record for M1.\n"
        );
    }
}
