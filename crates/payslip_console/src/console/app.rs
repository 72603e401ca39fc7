use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect};
use payslip_core::{
    update, AppState, JobPhase, JobView, LogScope, Matricule, Msg, Notification,
    NotificationLevel, PayslipMonth, ResendRequest, SelectionView,
};
use payslip_engine::ApiError;
use payslip_logging::{payslip_error, payslip_info, payslip_warn};

use super::effects::{EffectRunner, Incoming};
use super::input::{self, LogCommand, SelectionCommand, LOG_HELP, SELECTION_HELP};
use super::persistence::SessionStore;
use super::render;

const EVENT_WAIT: Duration = Duration::from_millis(100);

/// Drives the core state machine from the terminal.
pub struct ConsoleApp {
    state: AppState,
    runner: EffectRunner,
    sessions: SessionStore,
    theme: ColorfulTheme,
    last_job_line: Option<String>,
    login: Option<Result<(), ApiError>>,
    errors: usize,
}

impl ConsoleApp {
    pub fn new(state: AppState, runner: EffectRunner, sessions: SessionStore) -> Self {
        Self {
            state,
            runner,
            sessions,
            theme: ColorfulTheme::default(),
            last_job_line: None,
            login: None,
            errors: 0,
        }
    }

    /// Error notifications shown so far.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let period = self.state.period();
        let state = std::mem::replace(&mut self.state, AppState::new(period));
        let (mut state, effects) = update(state, msg);
        let dirty = state.consume_dirty();
        self.state = state;

        for notification in self.runner.enqueue(effects) {
            self.show(&notification);
        }
        if dirty {
            self.render_job_line();
        }
    }

    fn show(&mut self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Error => {
                self.errors += 1;
                payslip_warn!("{}", notification.message);
            }
            NotificationLevel::Warning => payslip_warn!("{}", notification.message),
            NotificationLevel::Info | NotificationLevel::Success => {
                payslip_info!("{}", notification.message)
            }
        }
        println!("{}", render::notification(notification));
    }

    fn render_job_line(&mut self) {
        let line = render::job_line(&self.state.view().job);
        if line != self.last_job_line {
            if let Some(text) = &line {
                println!("{text}");
            }
            self.last_job_line = line;
        }
    }

    /// Feeds engine events into the core until `done` holds.
    fn pump_until(&mut self, done: impl Fn(&Self) -> bool) -> Result<()> {
        while !done(self) {
            self.pump_once()?;
        }
        Ok(())
    }

    fn pump_once(&mut self) -> Result<()> {
        if let Some(incoming) = self.runner.next_event(EVENT_WAIT)? {
            self.handle(incoming);
        }
        Ok(())
    }

    fn handle(&mut self, incoming: Incoming) {
        match incoming {
            Incoming::Core(msg) => self.dispatch(msg),
            Incoming::Session(session) => {
                if let Err(err) = self.sessions.save(session.as_ref()) {
                    payslip_error!("Failed to persist session: {}", err);
                }
            }
            Incoming::Login(result) => self.login = Some(result),
        }
    }

    pub fn login(&mut self, username: Option<String>) -> Result<()> {
        let username = match username {
            Some(username) => username,
            None => Input::<String>::with_theme(&self.theme)
                .with_prompt("Username")
                .interact_text()?,
        };
        let password = dialoguer::Password::with_theme(&self.theme)
            .with_prompt("Password")
            .interact()?;

        self.login = None;
        self.runner.login(username, password);
        loop {
            match self.login.take() {
                Some(Ok(())) => {
                    println!("Logged in.");
                    return Ok(());
                }
                Some(Err(err)) => return Err(anyhow!(err.user_message())),
                None => self.pump_once()?,
            }
        }
    }

    /// Uploads `file` and sends every payslip in it.
    pub fn send_all(&mut self, file: PathBuf) -> Result<()> {
        self.dispatch(Msg::AutoUploadRequested { file });
        self.pump_until(|app| !app.state.has_active_job())?;
        self.print_send_errors();
        Ok(())
    }

    /// Uploads `file` for analysis, lets the user pick recipients, then sends.
    pub fn preview_and_send(&mut self, file: PathBuf, assume_yes: bool) -> Result<()> {
        self.dispatch(Msg::PreviewUploadRequested { file });
        self.pump_until(|app| {
            !matches!(
                app.state.job(),
                JobPhase::Uploading(_) | JobPhase::Analysing { .. }
            )
        })?;

        while let JobView::Selecting(view) = self.state.view().job {
            if assume_yes {
                print!("{}", render::selection(&view));
                self.dispatch(Msg::ConfirmClicked);
            } else {
                self.prompt_selection(&view)?;
            }
            self.pump_until(|app| !is_submitting(app.state.job()))?;
            if assume_yes && matches!(self.state.job(), JobPhase::Selecting(_)) {
                // Nothing eligible, or the backend refused the batch.
                self.dispatch(Msg::SelectionClosed);
            }
        }

        self.pump_until(|app| !app.state.has_active_job())?;
        self.print_send_errors();
        Ok(())
    }

    fn prompt_selection(&mut self, view: &SelectionView) -> Result<()> {
        print!("{}", render::selection(view));
        let line = Input::<String>::with_theme(&self.theme)
            .with_prompt("selection (? for help)")
            .allow_empty(true)
            .interact_text()?;
        match input::parse_selection(&line) {
            Err(message) => println!("{message}"),
            Ok(SelectionCommand::Help) => println!("{SELECTION_HELP}"),
            Ok(SelectionCommand::Confirm) if !view.can_confirm => {
                println!("Select at least one recipient first.");
            }
            Ok(SelectionCommand::Confirm) => {
                let confirmed = Confirm::with_theme(&self.theme)
                    .with_prompt(format!(
                        "Send {} payslip(s) for {:04}-{:02}?",
                        view.selected_count, view.year, view.month
                    ))
                    .default(false)
                    .interact()?;
                if confirmed {
                    self.dispatch(Msg::ConfirmClicked);
                }
            }
            Ok(command) => {
                for msg in command.into_msgs() {
                    self.dispatch(msg);
                }
            }
        }
        Ok(())
    }

    fn print_send_errors(&self) {
        if let Some(last) = self.state.view().last_send {
            for error in &last.errors {
                println!("  ! {error}");
            }
        }
    }

    pub fn summary(&mut self) -> Result<()> {
        let errors = self.errors;
        self.dispatch(Msg::SummaryRequested);
        self.pump_until(|app| !app.state.view().summary_loading)?;
        if self.errors == errors {
            let view = self.state.view();
            print!("{}", render::summary(&view.period, &view.summary, &view.totals));
        }
        Ok(())
    }

    /// Opens the log browser; with `once` only the first page is printed.
    pub fn browse_logs(
        &mut self,
        scope: LogScope,
        search: Option<String>,
        once: bool,
    ) -> Result<()> {
        self.dispatch(Msg::LogsOpened(scope));
        if let Some(search) = search {
            self.dispatch(Msg::LogSearchChanged(search));
        }

        loop {
            self.pump_until(|app| {
                app.state
                    .view()
                    .logs
                    .map_or(true, |logs| !logs.loading && logs.pending_delete.is_none())
            })?;
            let Some(view) = self.state.view().logs else {
                return Ok(());
            };
            print!("{}", render::logs(&view));
            if once {
                return Ok(());
            }

            let line = Input::<String>::with_theme(&self.theme)
                .with_prompt("logs (? for help)")
                .allow_empty(true)
                .interact_text()?;
            match input::parse_log_command(&line) {
                Err(message) => println!("{message}"),
                Ok(LogCommand::Help) => println!("{LOG_HELP}"),
                Ok(LogCommand::Quit) => {
                    self.dispatch(Msg::LogsClosed);
                    return Ok(());
                }
                Ok(LogCommand::Delete(id)) => {
                    if !view.rows.iter().any(|row| row.id == id) {
                        println!("#{id} is not on this page.");
                        continue;
                    }
                    let confirmed = Confirm::with_theme(&self.theme)
                        .with_prompt(format!("Delete log entry #{id}?"))
                        .default(false)
                        .interact()?;
                    if confirmed {
                        self.dispatch(Msg::DeleteLogClicked(id));
                    }
                }
                Ok(command) => {
                    if let Some(msg) = command.into_msg() {
                        self.dispatch(msg);
                    }
                }
            }
        }
    }

    /// Fetches the months on record for `matricule`; `None` when the lookup failed.
    fn available_months(&mut self, matricule: &str) -> Result<Option<Vec<PayslipMonth>>> {
        let errors = self.errors;
        self.dispatch(Msg::AvailableMonthsRequested(matricule.to_string()));
        self.pump_until(|app| app.state.view().resend.months.is_some())?;
        if self.errors != errors {
            return Ok(None);
        }
        Ok(self.state.view().resend.months)
    }

    pub fn show_months(&mut self, matricule: &str) -> Result<()> {
        if let Some(months) = self.available_months(matricule)? {
            print!("{}", render::months(matricule, &months));
        }
        Ok(())
    }

    pub fn resend(
        &mut self,
        matricule: Matricule,
        months: Vec<PayslipMonth>,
        email: Option<String>,
    ) -> Result<()> {
        let months = if months.is_empty() {
            self.pick_months(&matricule)?
        } else {
            months
        };
        if months.is_empty() {
            println!("Nothing to resend.");
            return Ok(());
        }

        self.dispatch(Msg::ResendRequested(ResendRequest {
            matricule,
            months,
            email: email.filter(|email| !email.trim().is_empty()),
        }));
        self.pump_until(|app| !app.state.view().resend.in_flight)?;
        if let Some(outcome) = self.state.view().resend.last_outcome {
            print!("{}", render::resend_outcome(&outcome));
        }
        Ok(())
    }

    fn pick_months(&mut self, matricule: &str) -> Result<Vec<PayslipMonth>> {
        let Some(available) = self.available_months(matricule)? else {
            return Ok(Vec::new());
        };
        if available.is_empty() {
            print!("{}", render::months(matricule, &available));
            return Ok(Vec::new());
        }
        let labels: Vec<String> = available.iter().map(PayslipMonth::to_string).collect();
        let picked = MultiSelect::with_theme(&self.theme)
            .with_prompt(format!("Months to resend to {matricule}"))
            .items(&labels)
            .interact()?;
        Ok(picked.into_iter().map(|index| available[index]).collect())
    }
}

fn is_submitting(job: &JobPhase) -> bool {
    matches!(job, JobPhase::Selecting(selector) if selector.is_submitting())
}
