use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use payslip_core::{
    DateRange, LogId, LogQuery, Matricule, Operation, ResendRequest, SendSelectedRequest, TaskId,
};
use payslip_logging::{payslip_debug, payslip_info, payslip_warn};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::api::{PayslipApi, ReqwestApi};
use crate::auth::{SessionListener, SessionTokens};
use crate::poller::{watch, WatchOutcome};
use crate::{ApiError, ClientSettings, EngineEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Login { username: String, password: String },
    UploadAuto { file: PathBuf },
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
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Client(#[from] ApiError),
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("the engine thread has stopped")]
    Stopped,
}

#[derive(Debug, Clone, Copy)]
struct PollIntervals {
    send: Duration,
    preview: Duration,
}

/// Runs backend calls on a dedicated thread and reports back through events.
///
/// Dropping the handle stops the thread and cancels every active watch.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    /// Connects to the backend described by `settings`, restoring `session` if any.
    pub fn new(
        settings: &ClientSettings,
        session: Option<SessionTokens>,
    ) -> Result<Self, EngineError> {
        let (event_tx, event_rx) = mpsc::channel();
        let api = ReqwestApi::new(settings)?
            .with_session(session)
            .with_session_listener(Arc::new(ChannelSessionListener {
                tx: event_tx.clone(),
            }));
        Self::start(Arc::new(api), settings, event_tx, event_rx)
    }

    /// Uses a caller-provided backend, typically a test double.
    pub fn with_api(
        api: Arc<dyn PayslipApi>,
        settings: &ClientSettings,
    ) -> Result<Self, EngineError> {
        let (event_tx, event_rx) = mpsc::channel();
        Self::start(api, settings, event_tx, event_rx)
    }

    fn start(
        api: Arc<dyn PayslipApi>,
        settings: &ClientSettings,
        event_tx: mpsc::Sender<EngineEvent>,
        event_rx: mpsc::Receiver<EngineEvent>,
    ) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let intervals = PollIntervals {
            send: settings.send_poll_interval,
            preview: settings.preview_poll_interval,
        };

        thread::Builder::new()
            .name("payslip-engine".to_string())
            .spawn(move || run(runtime, api, intervals, cmd_rx, event_tx))?;

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    /// Waits up to `timeout` for the next event; `Ok(None)` when none arrived.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineError> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineError::Stopped),
        }
    }
}

struct ChannelSessionListener {
    tx: mpsc::Sender<EngineEvent>,
}

impl SessionListener for ChannelSessionListener {
    fn session_changed(&self, session: Option<&SessionTokens>) {
        let _ = self.tx.send(EngineEvent::SessionChanged(session.cloned()));
    }
}

fn run(
    runtime: Runtime,
    api: Arc<dyn PayslipApi>,
    intervals: PollIntervals,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let shutdown = CancellationToken::new();
    // Finished watches cancel their own token through the drop guard.
    let mut watches: HashMap<TaskId, CancellationToken> = HashMap::new();

    while let Ok(command) = cmd_rx.recv() {
        watches.retain(|_, token| !token.is_cancelled());
        match command {
            EngineCommand::WatchSend { task_id } => {
                let token = register_watch(&mut watches, &shutdown, &task_id);
                runtime.spawn(watch_send(
                    api.clone(),
                    task_id,
                    intervals.send,
                    token,
                    event_tx.clone(),
                ));
            }
            EngineCommand::WatchPreview { task_id } => {
                let token = register_watch(&mut watches, &shutdown, &task_id);
                runtime.spawn(watch_preview(
                    api.clone(),
                    task_id,
                    intervals.preview,
                    token,
                    event_tx.clone(),
                ));
            }
            EngineCommand::StopWatching { task_id } => {
                if let Some(token) = watches.remove(&task_id) {
                    payslip_info!("Stopped watching task {}", task_id);
                    token.cancel();
                }
            }
            command => {
                let api = api.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    if let Some(event) = handle_request(api.as_ref(), command).await {
                        let _ = event_tx.send(event);
                    }
                });
            }
        }
    }

    payslip_debug!("Engine command channel closed, shutting down");
    shutdown.cancel();
    runtime.shutdown_background();
}

fn register_watch(
    watches: &mut HashMap<TaskId, CancellationToken>,
    shutdown: &CancellationToken,
    task_id: &str,
) -> CancellationToken {
    let token = shutdown.child_token();
    if let Some(previous) = watches.insert(task_id.to_string(), token.clone()) {
        previous.cancel();
    }
    token
}

async fn watch_send(
    api: Arc<dyn PayslipApi>,
    task_id: TaskId,
    interval: Duration,
    cancel: CancellationToken,
    events: mpsc::Sender<EngineEvent>,
) {
    let fetch = {
        let task_id = task_id.clone();
        move || {
            let api = api.clone();
            let task_id = task_id.clone();
            async move { api.send_progress(&task_id).await }
        }
    };
    let progress_tx = events.clone();
    let outcome = watch(interval, cancel, fetch, move |snapshot| {
        let _ = progress_tx.send(EngineEvent::SendProgressed(snapshot));
    })
    .await;

    match outcome {
        WatchOutcome::Completed(snapshot) => {
            payslip_info!(
                "Send task {} finished with {:?} ({} sent, {} failed)",
                task_id,
                snapshot.status,
                snapshot.sent,
                snapshot.failed
            );
            let _ = events.send(EngineEvent::SendFinished(snapshot));
        }
        WatchOutcome::Cancelled => payslip_debug!("Send watch {} cancelled", task_id),
    }
}

async fn watch_preview(
    api: Arc<dyn PayslipApi>,
    task_id: TaskId,
    interval: Duration,
    cancel: CancellationToken,
    events: mpsc::Sender<EngineEvent>,
) {
    let fetch = {
        let task_id = task_id.clone();
        move || {
            let api = api.clone();
            let task_id = task_id.clone();
            async move { api.preview_progress(&task_id).await }
        }
    };
    let progress_tx = events.clone();
    let outcome = watch(interval, cancel, fetch, move |progress| {
        let _ = progress_tx.send(EngineEvent::PreviewProgressed(progress));
    })
    .await;

    match outcome {
        WatchOutcome::Completed(progress) => {
            payslip_info!("Preview task {} finished with {:?}", task_id, progress.status);
            let _ = events.send(EngineEvent::PreviewFinished(progress));
        }
        WatchOutcome::Cancelled => payslip_debug!("Preview watch {} cancelled", task_id),
    }
}

async fn handle_request(api: &dyn PayslipApi, command: EngineCommand) -> Option<EngineEvent> {
    let event = match command {
        EngineCommand::Login { username, password } => {
            EngineEvent::LoginFinished(api.login(&username, &password).await.map(|_| ()))
        }
        EngineCommand::UploadAuto { file } => match api.upload_auto(&file).await {
            Ok(task_id) => EngineEvent::AutoSendAccepted { task_id },
            Err(error) => failed(Operation::AutoUpload, error),
        },
        EngineCommand::StartPreview { file } => match api.start_preview(&file).await {
            Ok(started) => EngineEvent::PreviewStarted(started),
            Err(error) => failed(Operation::PreviewUpload, error),
        },
        EngineCommand::ConfirmSend(request) => match api.confirm_send(&request).await {
            Ok(started) => EngineEvent::SendStarted(started),
            Err(error) => failed(Operation::ConfirmSend, error),
        },
        EngineCommand::FetchSummary(range) => match api.summary(&range).await {
            Ok(rows) => EngineEvent::SummaryLoaded(rows),
            Err(error) => failed(Operation::Summary, error),
        },
        EngineCommand::FetchLogs(query) => match api.logs(&query).await {
            Ok(page) => EngineEvent::LogsLoaded { query, page },
            Err(error) => failed(Operation::Logs, error),
        },
        EngineCommand::DeleteLog { id } => match api.delete_log(id).await {
            Ok(()) => EngineEvent::LogDeleted(id),
            Err(error) => failed(Operation::DeleteLog(id), error),
        },
        EngineCommand::FetchAvailableMonths { matricule } => {
            match api.available_months(&matricule).await {
                Ok(months) => EngineEvent::AvailableMonthsLoaded { matricule, months },
                Err(error) => failed(Operation::AvailableMonths(matricule), error),
            }
        }
        EngineCommand::Resend(request) => match api.resend(&request).await {
            Ok(outcome) => EngineEvent::Resent(outcome),
            Err(error) => failed(Operation::Resend, error),
        },
        EngineCommand::WatchSend { .. }
        | EngineCommand::WatchPreview { .. }
        | EngineCommand::StopWatching { .. } => return None,
    };
    Some(event)
}

fn failed(operation: Operation, error: ApiError) -> EngineEvent {
    payslip_warn!("{:?} failed: {}", operation, error);
    EngineEvent::Failed { operation, error }
}
