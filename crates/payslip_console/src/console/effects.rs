use std::time::Duration;

use payslip_core::{Effect, Msg, Notification};
use payslip_engine::{
    ApiError, EngineCommand, EngineError, EngineEvent, EngineHandle, SessionTokens,
};
use payslip_logging::payslip_debug;

/// Forwards core effects to the engine thread.
pub struct EffectRunner {
    engine: EngineHandle,
}

/// What an effect turns into on the console side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Engine(EngineCommand),
    Show(Notification),
}

/// An engine event, sorted by who consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Core(Msg),
    Session(Option<SessionTokens>),
    Login(Result<(), ApiError>),
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    /// Sends backend effects to the engine and hands notifications back for display.
    pub fn enqueue(&self, effects: Vec<Effect>) -> Vec<Notification> {
        let mut notifications = Vec::new();
        for effect in effects {
            match dispatch(effect) {
                Dispatch::Engine(command) => {
                    payslip_debug!("Engine command: {:?}", command);
                    self.engine.send(command);
                }
                Dispatch::Show(notification) => notifications.push(notification),
            }
        }
        notifications
    }

    pub fn login(&self, username: String, password: String) {
        payslip_debug!("Engine command: Login username={}", username);
        self.engine.send(EngineCommand::Login { username, password });
    }

    pub fn next_event(&self, timeout: Duration) -> Result<Option<Incoming>, EngineError> {
        Ok(self.engine.recv_timeout(timeout)?.map(incoming))
    }
}

pub fn dispatch(effect: Effect) -> Dispatch {
    let command = match effect {
        Effect::UploadAuto { file } => EngineCommand::UploadAuto { file },
        Effect::StartPreview { file } => EngineCommand::StartPreview { file },
        Effect::WatchPreview { task_id } => EngineCommand::WatchPreview { task_id },
        Effect::ConfirmSend(request) => EngineCommand::ConfirmSend(request),
        Effect::WatchSend { task_id } => EngineCommand::WatchSend { task_id },
        Effect::StopWatching { task_id } => EngineCommand::StopWatching { task_id },
        Effect::FetchSummary(range) => EngineCommand::FetchSummary(range),
        Effect::FetchLogs(query) => EngineCommand::FetchLogs(query),
        Effect::DeleteLog { id } => EngineCommand::DeleteLog { id },
        Effect::FetchAvailableMonths { matricule } => {
            EngineCommand::FetchAvailableMonths { matricule }
        }
        Effect::Resend(request) => EngineCommand::Resend(request),
        Effect::Notify(notification) => return Dispatch::Show(notification),
    };
    Dispatch::Engine(command)
}

pub fn incoming(event: EngineEvent) -> Incoming {
    let msg = match event {
        EngineEvent::LoginFinished(result) => return Incoming::Login(result),
        EngineEvent::SessionChanged(session) => return Incoming::Session(session),
        EngineEvent::AutoSendAccepted { task_id } => Msg::AutoSendAccepted { task_id },
        EngineEvent::PreviewStarted(start) => Msg::PreviewStarted(start),
        EngineEvent::PreviewProgressed(progress) => Msg::PreviewProgressed(progress),
        EngineEvent::PreviewFinished(progress) => Msg::PreviewFinished(progress),
        EngineEvent::SendStarted(started) => Msg::SendStarted(started),
        EngineEvent::SendProgressed(snapshot) => Msg::SendProgressed(snapshot),
        EngineEvent::SendFinished(snapshot) => Msg::SendFinished(snapshot),
        EngineEvent::SummaryLoaded(rows) => Msg::SummaryLoaded(rows),
        EngineEvent::LogsLoaded { query, page } => Msg::LogsLoaded { query, page },
        EngineEvent::LogDeleted(id) => Msg::LogDeleted(id),
        EngineEvent::AvailableMonthsLoaded { matricule, months } => {
            Msg::AvailableMonthsLoaded { matricule, months }
        }
        EngineEvent::Resent(outcome) => Msg::Resent(outcome),
        EngineEvent::Failed { operation, error } => Msg::RequestFailed {
            operation,
            message: error.user_message(),
        },
    };
    Incoming::Core(msg)
}
