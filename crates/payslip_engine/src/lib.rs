//! Payslip engine: backend client, authentication and task polling.
mod api;
mod auth;
mod engine;
mod http;
mod poller;
mod settings;
mod types;

pub use api::{PayslipApi, ReqwestApi};
pub use auth::{AuthPipeline, SessionListener, SessionTokens};
pub use engine::{EngineCommand, EngineError, EngineHandle};
pub use poller::{watch, WatchOutcome};
pub use settings::{ClientSettings, DEFAULT_BASE_URL};
pub use types::{ApiError, EngineEvent, FailureKind};
