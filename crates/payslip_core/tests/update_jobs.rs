mod common;

use common::{has_notify, init_logging, new_state, period, selecting_state, snapshot};
use payslip_core::{
    update, Effect, JobPhase, JobStatus, JobView, Msg, NotificationLevel, Operation,
    PreviewProgress, PreviewStart, SendStarted, UploadFlow,
};
use pretty_assertions::assert_eq;

#[test]
fn auto_flow_tracks_progress_and_completes_once() {
    init_logging();
    let (state, effects) = update(
        new_state(),
        Msg::AutoUploadRequested {
            file: "march.pdf".into(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::UploadAuto {
            file: "march.pdf".into()
        }]
    );
    assert_eq!(state.view().job, JobView::Uploading(UploadFlow::Auto));

    let (state, effects) = update(
        state,
        Msg::AutoSendAccepted {
            task_id: "T1".to_string(),
        },
    );
    assert_eq!(
        effects[0],
        Effect::WatchSend {
            task_id: "T1".to_string()
        }
    );

    let (state, _) = update(
        state,
        Msg::SendProgressed(snapshot("T1", JobStatus::Progress, 40.0, 8, 0, 20)),
    );
    let (state, _) = update(
        state,
        Msg::SendProgressed(snapshot("T1", JobStatus::Progress, 80.0, 15, 1, 20)),
    );
    match state.view().job {
        JobView::Sending {
            progress: Some(progress),
            ..
        } => assert_eq!(progress.progress, 80.0),
        other => panic!("expected sending view, got {other:?}"),
    }

    let (state, effects) = update(
        state,
        Msg::SendFinished(snapshot("T1", JobStatus::Success, 100.0, 18, 2, 20)),
    );
    let view = state.view();
    assert_eq!(view.job, JobView::Idle);
    assert_eq!(
        view.last_send.as_ref().unwrap().counts_label(),
        "18 sent / 2 failed / 20 total"
    );

    let notifications: Vec<_> = effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Notify(notification) => Some(notification.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Warning);
    assert!(notifications[0]
        .message
        .contains("18 sent / 2 failed / 20 total"));
    assert_eq!(
        effects
            .iter()
            .filter(|effect| **effect == Effect::FetchSummary(period()))
            .count(),
        1
    );

    // A duplicate terminal event must not refresh twice.
    let (_state, effects) = update(
        state,
        Msg::SendFinished(snapshot("T1", JobStatus::Success, 100.0, 18, 2, 20)),
    );
    assert!(effects.is_empty());
}

#[test]
fn clean_success_and_failure_use_distinct_levels() {
    let success = payslip_core::send_outcome(&snapshot("T", JobStatus::Success, 100.0, 20, 0, 20));
    assert_eq!(success.level, NotificationLevel::Success);

    let failure = payslip_core::send_outcome(&snapshot("T", JobStatus::Failure, 60.0, 3, 9, 20));
    assert_eq!(failure.level, NotificationLevel::Error);
}

#[test]
fn only_a_mixed_outcome_is_a_warning() {
    let partial = payslip_core::send_outcome(&snapshot("T", JobStatus::Success, 100.0, 18, 2, 20));
    assert_eq!(partial.level, NotificationLevel::Warning);

    let nothing_delivered =
        payslip_core::send_outcome(&snapshot("T", JobStatus::Success, 100.0, 0, 20, 20));
    assert_eq!(nothing_delivered.level, NotificationLevel::Error);
    assert!(nothing_delivered
        .message
        .contains("0 sent / 20 failed / 20 total"));
}

#[test]
fn successful_job_with_every_payslip_failed_notifies_an_error() {
    init_logging();
    let (state, _) = update(
        new_state(),
        Msg::AutoUploadRequested {
            file: "march.pdf".into(),
        },
    );
    let (state, _) = update(
        state,
        Msg::AutoSendAccepted {
            task_id: "T9".to_string(),
        },
    );
    let (state, effects) = update(
        state,
        Msg::SendFinished(snapshot("T9", JobStatus::Success, 100.0, 0, 20, 20)),
    );

    assert_eq!(state.view().job, JobView::Idle);
    let levels: Vec<_> = effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Notify(notification) => Some(notification.level),
            _ => None,
        })
        .collect();
    assert_eq!(levels, vec![NotificationLevel::Error]);
    assert!(effects.contains(&Effect::FetchSummary(period())));
}

#[test]
fn resubmission_is_blocked_while_a_job_is_active() {
    init_logging();
    let (state, _) = update(
        new_state(),
        Msg::AutoUploadRequested {
            file: "a.pdf".into(),
        },
    );
    let before = state.clone();

    let (state, effects) = update(
        state,
        Msg::AutoUploadRequested {
            file: "a.pdf".into(),
        },
    );
    assert!(effects.is_empty());
    let (state, effects) = update(
        state,
        Msg::PreviewUploadRequested {
            file: "a.pdf".into(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state, before);

    let (state, _) = update(
        state,
        Msg::AutoSendAccepted {
            task_id: "T9".to_string(),
        },
    );
    let (_state, effects) = update(
        state,
        Msg::PreviewUploadRequested {
            file: "b.pdf".into(),
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn failed_upload_returns_to_idle_with_backend_message() {
    let (state, _) = update(
        new_state(),
        Msg::AutoUploadRequested {
            file: "a.pdf".into(),
        },
    );
    let (state, effects) = update(
        state,
        Msg::RequestFailed {
            operation: Operation::AutoUpload,
            message: "Aucun bulletin détecté".to_string(),
        },
    );
    assert_eq!(*state.job(), JobPhase::Idle);
    match &effects[..] {
        [Effect::Notify(notification)] => {
            assert_eq!(notification.level, NotificationLevel::Error);
            assert_eq!(notification.message, "Aucun bulletin détecté");
        }
        other => panic!("unexpected effects {other:?}"),
    }
}

#[test]
fn preview_success_selects_eligible_recipients() {
    init_logging();
    let state = selecting_state();
    match state.view().job {
        JobView::Selecting(selection) => {
            assert_eq!(selection.selected_count, 4);
            assert_eq!(selection.eligible_count, 4);
            assert_eq!(selection.rows.len(), 5);
            assert!(selection.all_selected);
            assert!(selection.can_confirm);
        }
        other => panic!("expected selection, got {other:?}"),
    }
}

#[test]
fn preview_failure_requires_a_fresh_upload() {
    let (state, _) = update(
        new_state(),
        Msg::PreviewUploadRequested {
            file: "a.pdf".into(),
        },
    );
    let (state, _) = update(
        state,
        Msg::PreviewStarted(PreviewStart {
            task_id: "P1".to_string(),
            batch_id: "B1".to_string(),
        }),
    );
    let (state, effects) = update(
        state,
        Msg::PreviewFinished(PreviewProgress {
            status: JobStatus::Failure,
            ..PreviewProgress::default()
        }),
    );
    assert_eq!(*state.job(), JobPhase::Idle);
    assert!(has_notify(&effects));

    let (_state, effects) = update(
        state,
        Msg::PreviewUploadRequested {
            file: "a.pdf".into(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::StartPreview {
            file: "a.pdf".into()
        }]
    );
}

#[test]
fn preview_success_without_result_is_a_failure() {
    let (state, _) = update(
        new_state(),
        Msg::PreviewUploadRequested {
            file: "a.pdf".into(),
        },
    );
    let (state, _) = update(
        state,
        Msg::PreviewStarted(PreviewStart {
            task_id: "P1".to_string(),
            batch_id: "B1".to_string(),
        }),
    );
    let (state, _) = update(
        state,
        Msg::PreviewFinished(PreviewProgress {
            status: JobStatus::Success,
            result: None,
            ..PreviewProgress::default()
        }),
    );
    assert_eq!(*state.job(), JobPhase::Idle);
}

#[test]
fn preview_progress_exposes_page_estimate() {
    let (state, _) = update(
        new_state(),
        Msg::PreviewUploadRequested {
            file: "a.pdf".into(),
        },
    );
    let (state, _) = update(
        state,
        Msg::PreviewStarted(PreviewStart {
            task_id: "P1".to_string(),
            batch_id: "B1".to_string(),
        }),
    );
    let (state, _) = update(
        state,
        Msg::PreviewProgressed(PreviewProgress {
            status: JobStatus::Progress,
            progress: 25.0,
            total_pages: Some(300),
            found: Some(70),
            errors_count: Some(2),
            result: None,
        }),
    );
    match state.view().job {
        JobView::Analysing {
            pages_estimate,
            found,
            errors_count,
            ..
        } => {
            assert_eq!(pages_estimate, Some(75));
            assert_eq!(found, Some(70));
            assert_eq!(errors_count, Some(2));
        }
        other => panic!("expected analysis view, got {other:?}"),
    }
}

#[test]
fn closing_during_analysis_stops_the_watch() {
    let (state, _) = update(
        new_state(),
        Msg::PreviewUploadRequested {
            file: "a.pdf".into(),
        },
    );
    let (state, _) = update(
        state,
        Msg::PreviewStarted(PreviewStart {
            task_id: "P1".to_string(),
            batch_id: "B1".to_string(),
        }),
    );
    let (state, effects) = update(state, Msg::SelectionClosed);
    assert_eq!(*state.job(), JobPhase::Idle);
    assert_eq!(
        effects,
        vec![Effect::StopWatching {
            task_id: "P1".to_string()
        }]
    );
}

#[test]
fn confirm_starts_a_distinct_send_job() {
    init_logging();
    let state = selecting_state();
    let (state, effects) = update(state, Msg::ConfirmClicked);
    match &effects[..] {
        [Effect::ConfirmSend(request)] => {
            assert_eq!(request.batch_id, "B1");
            assert_eq!(request.year, 2024);
            assert_eq!(request.month, 3);
            assert_eq!(request.matricules, vec!["M1", "M2", "M3", "M4"]);
        }
        other => panic!("unexpected effects {other:?}"),
    }

    // Double click while the submission is in flight.
    let (state, effects) = update(state, Msg::ConfirmClicked);
    assert!(effects.is_empty());

    let (state, effects) = update(
        state,
        Msg::SendStarted(SendStarted {
            task_id: "T2".to_string(),
            message: Some("Envoi lancé".to_string()),
        }),
    );
    assert_eq!(
        effects[0],
        Effect::WatchSend {
            task_id: "T2".to_string()
        }
    );
    assert!(matches!(
        state.job(),
        JobPhase::Sending { task_id, .. } if task_id == "T2"
    ));
}

#[test]
fn failed_confirm_allows_retry() {
    let state = selecting_state();
    let (state, _) = update(state, Msg::ConfirmClicked);
    let (state, effects) = update(
        state,
        Msg::RequestFailed {
            operation: Operation::ConfirmSend,
            message: "Batch expired".to_string(),
        },
    );
    assert!(has_notify(&effects));
    let (_state, effects) = update(state, Msg::ConfirmClicked);
    assert!(matches!(&effects[..], [Effect::ConfirmSend(_)]));
}

#[test]
fn confirm_with_empty_selection_is_refused() {
    let state = selecting_state();
    let (state, _) = update(state, Msg::AllRecipientsToggled);
    let (_state, effects) = update(state, Msg::ConfirmClicked);
    assert!(effects.is_empty());
}

#[test]
fn finished_send_refreshes_open_log_browser() {
    let (state, _) = update(new_state(), Msg::LogsOpened(Default::default()));
    let (state, _) = update(
        state,
        Msg::AutoUploadRequested {
            file: "a.pdf".into(),
        },
    );
    let (state, _) = update(
        state,
        Msg::AutoSendAccepted {
            task_id: "T1".to_string(),
        },
    );
    let (_state, effects) = update(
        state,
        Msg::SendFinished(snapshot("T1", JobStatus::Failure, 10.0, 0, 3, 20)),
    );
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, Effect::FetchLogs(query) if query.page == 1)));
}
