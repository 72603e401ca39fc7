mod app;
mod cli;
mod effects;
mod input;
mod logging;
mod persistence;
mod render;

use anyhow::{bail, Result};
use chrono::Local;
use clap::Parser;
use log::LevelFilter;
use payslip_core::{AppState, LogScope};
use payslip_engine::EngineHandle;
use payslip_logging::{parse_level, payslip_info};

use self::app::ConsoleApp;
use self::cli::{Cli, Command};
use self::effects::EffectRunner;
use self::persistence::{ConsoleConfig, SessionStore};

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = ConsoleConfig::load(&cli.config)?.with_env_override(cli.api_url.clone());

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        parse_level(&config.log_level).unwrap_or(LevelFilter::Info)
    };
    logging::initialize(config.log_destination, level);
    payslip_info!(
        "payslip_console {} starting, backend {}",
        env!("CARGO_PKG_VERSION"),
        config.base_url
    );

    let sessions = SessionStore::new(config.session_file.clone());
    if let Command::Logout = cli.command {
        sessions.clear()?;
        println!("Logged out.");
        return Ok(());
    }

    let session = sessions.load();
    if session.is_none() && cli.command.requires_session() {
        bail!("Not logged in. Run `payslip_console login` first.");
    }

    let period = cli
        .command
        .period()
        .resolve(Local::now().date_naive(), config.report_days)?;
    let engine = EngineHandle::new(&config.client_settings(), session)?;
    let state = AppState::new(period).with_log_page_size(config.log_page_size);
    let mut app = ConsoleApp::new(state, EffectRunner::new(engine), sessions);

    match cli.command {
        Command::Login { username } => return app.login(username),
        Command::Logout => {}
        Command::Send { file } => app.send_all(file)?,
        Command::Preview { file, yes } => app.preview_and_send(file, yes)?,
        Command::Summary { .. } => app.summary()?,
        Command::Logs {
            year,
            month,
            status,
            search,
            once,
            ..
        } => app.browse_logs(
            LogScope {
                year,
                month,
                status,
            },
            search,
            once,
        )?,
        Command::Months { matricule } => app.show_months(&matricule)?,
        Command::Resend {
            matricule,
            months,
            email,
        } => app.resend(matricule, months, email)?,
    }

    match app.error_count() {
        0 => Ok(()),
        count => bail!("finished with {count} error(s)"),
    }
}
