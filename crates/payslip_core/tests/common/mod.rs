#![allow(dead_code)]

use std::sync::Once;

use chrono::NaiveDate;
use payslip_core::{
    update, AppState, DateRange, Effect, JobStatus, Msg, PreviewBatch, PreviewItem,
    PreviewProgress, PreviewStart, ProgressSnapshot,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(payslip_logging::initialize_for_tests);
}

pub fn period() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
    )
}

pub fn new_state() -> AppState {
    AppState::new(period())
}

pub fn item(matricule: &str, fullname: &str, email: &str, can_send: bool) -> PreviewItem {
    PreviewItem {
        matricule: matricule.to_string(),
        employee_id: can_send.then_some(1),
        fullname: fullname.to_string(),
        email: email.to_string(),
        page: 1,
        can_send,
        reason: (!can_send).then(|| "Employee not found".to_string()),
    }
}

/// Five candidates, `M5` without a resolvable employee.
pub fn batch_b1() -> PreviewBatch {
    PreviewBatch {
        batch_id: "B1".to_string(),
        year: 2024,
        month: 3,
        total_pages: 5,
        items: vec![
            item("M1", "Ana Silva", "ana.silva@example.com", true),
            item("M2", "Bruno Costa", "bruno@example.com", true),
            item("M3", "Carla Dias", "carla@example.com", true),
            item("M4", "Diana Lopes", "dlopes@example.com", true),
            item("M5", "Eduardo Banana", "", false),
        ],
        errors: Vec::new(),
    }
}

pub fn snapshot(
    task_id: &str,
    status: JobStatus,
    progress: f32,
    sent: u32,
    failed: u32,
    total: u32,
) -> ProgressSnapshot {
    ProgressSnapshot {
        task_id: task_id.to_string(),
        status,
        progress,
        sent,
        failed,
        total,
        errors: Vec::new(),
    }
}

/// Drives the preview flow up to the recipient selection.
pub fn selecting_state() -> AppState {
    let (state, _) = update(
        new_state(),
        Msg::PreviewUploadRequested {
            file: "payslips.pdf".into(),
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
            progress: 100.0,
            result: Some(batch_b1()),
            ..PreviewProgress::default()
        }),
    );
    state
}

pub fn has_notify(effects: &[Effect]) -> bool {
    effects.iter().any(|effect| matches!(effect, Effect::Notify(_)))
}
