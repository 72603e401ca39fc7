use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use payslip_engine::{ClientSettings, SessionTokens, DEFAULT_BASE_URL};
use payslip_logging::{payslip_info, payslip_warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::logging::LogDestination;

pub const CONFIG_FILENAME: &str = "payslip_console.ron";
pub const API_URL_ENV: &str = "PAYSLIP_API_URL";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("cannot serialize: {0}")]
    Serialize(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Console settings, read from `payslip_console.ron`. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub send_poll_interval_ms: u64,
    pub preview_poll_interval_ms: u64,
    pub log_page_size: u64,
    /// Reporting window ending today, in days.
    pub report_days: u64,
    pub log_destination: LogDestination,
    pub log_level: String,
    pub session_file: PathBuf,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: client.connect_timeout.as_secs(),
            request_timeout_secs: client.request_timeout.as_secs(),
            upload_timeout_secs: client.upload_timeout.as_secs(),
            send_poll_interval_ms: client.send_poll_interval.as_millis() as u64,
            preview_poll_interval_ms: client.preview_poll_interval.as_millis() as u64,
            log_page_size: payslip_core::DEFAULT_LOG_PAGE_SIZE,
            report_days: 90,
            log_destination: LogDestination::File,
            log_level: "info".to_string(),
            session_file: PathBuf::from(".payslip_session.ron"),
        }
    }
}

impl ConsoleConfig {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        ron::from_str(&content).map_err(|err| PersistError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Applies `PAYSLIP_API_URL` when set and non-empty.
    pub fn with_env_override(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        self
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            upload_timeout: Duration::from_secs(self.upload_timeout_secs),
            send_poll_interval: Duration::from_millis(self.send_poll_interval_ms.max(1)),
            preview_poll_interval: Duration::from_millis(self.preview_poll_interval_ms.max(1)),
        }
    }
}

/// Persisted access/refresh tokens.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Option<SessionTokens> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                payslip_warn!("Failed to read session from {:?}: {}", self.path, err);
                return None;
            }
        };
        match ron::from_str(&content) {
            Ok(session) => Some(session),
            Err(err) => {
                payslip_warn!("Ignoring unreadable session file {:?}: {}", self.path, err);
                None
            }
        }
    }

    /// Stores `session`, or removes the file when it is `None`.
    pub fn save(&self, session: Option<&SessionTokens>) -> Result<(), PersistError> {
        let Some(session) = session else {
            return self.clear();
        };
        let content = ron::ser::to_string_pretty(session, ron::ser::PrettyConfig::new())
            .map_err(|err| PersistError::Serialize(err.to_string()))?;
        write_atomically(&self.path, &content)?;
        payslip_info!("Session saved to {:?}", self.path);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), PersistError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                payslip_info!("Session cleared");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Writes through a temp file in the target directory, then renames it over `target`.
fn write_atomically(target: &Path, content: &str) -> Result<(), PersistError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(target).map_err(|err| PersistError::Io(err.error))?;
    Ok(())
}
