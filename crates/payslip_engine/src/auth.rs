use std::sync::Arc;

use payslip_logging::{payslip_debug, payslip_info, payslip_warn};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use url::Url;

use crate::http::{decode, map_reqwest_error, with_json};
use crate::{ApiError, FailureKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Notified whenever the pipeline stores, refreshes or drops the session.
pub trait SessionListener: Send + Sync {
    fn session_changed(&self, session: Option<&SessionTokens>);
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// Request pipeline that authenticates outgoing calls.
///
/// A `401` triggers one token refresh followed by one retry. Refreshes are
/// single-flight: callers that hit `401` while another refresh is running
/// wait for it and reuse the new access token.
pub struct AuthPipeline {
    client: reqwest::Client,
    refresh_url: Url,
    session: RwLock<Option<SessionTokens>>,
    refresh_gate: Mutex<()>,
    listener: Option<Arc<dyn SessionListener>>,
}

impl AuthPipeline {
    pub fn new(client: reqwest::Client, refresh_url: Url) -> Self {
        Self {
            client,
            refresh_url,
            session: RwLock::new(None),
            refresh_gate: Mutex::new(()),
            listener: None,
        }
    }

    /// Restores a persisted session without notifying the listener.
    pub fn with_session(mut self, session: Option<SessionTokens>) -> Self {
        self.session = RwLock::new(session);
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub async fn session(&self) -> Option<SessionTokens> {
        self.session.read().await.clone()
    }

    pub async fn set_session(&self, session: Option<SessionTokens>) {
        *self.session.write().await = session.clone();
        self.notify(session.as_ref());
    }

    /// Sends the request built by `build`, retrying once after a refresh on `401`.
    ///
    /// `build` runs once per attempt, so bodies such as multipart forms are
    /// rebuilt for the retry.
    pub async fn execute<F>(&self, build: F) -> Result<Response, ApiError>
    where
        F: Fn() -> Result<RequestBuilder, ApiError>,
    {
        let token = self.access_token().await;
        let response = self.dispatch(&build, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(fresh) = self.refresh_after(token).await? else {
            return Ok(response);
        };
        payslip_debug!("Retrying request with refreshed access token");
        self.dispatch(&build, Some(&fresh)).await
    }

    async fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|session| session.access.clone())
    }

    async fn dispatch<F>(&self, build: &F, token: Option<&str>) -> Result<Response, ApiError>
    where
        F: Fn() -> Result<RequestBuilder, ApiError>,
    {
        let mut request = build()?;
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.map_err(map_reqwest_error)
    }

    /// Returns the access token to retry with, or `None` when there is no
    /// way to re-authenticate.
    async fn refresh_after(&self, rejected: Option<String>) -> Result<Option<String>, ApiError> {
        let _gate = self.refresh_gate.lock().await;

        let Some(current) = self.session().await else {
            return Ok(None);
        };
        if rejected.as_deref() != Some(current.access.as_str()) {
            // Refreshed by another caller while this one waited.
            return Ok(Some(current.access));
        }
        let Some(refresh) = current.refresh.clone() else {
            return Ok(None);
        };

        match self.request_refresh(&refresh).await {
            Ok(renewed) => {
                let session = SessionTokens {
                    access: renewed.access.clone(),
                    refresh: renewed.refresh.or(Some(refresh)),
                };
                payslip_info!("Access token refreshed");
                self.set_session(Some(session)).await;
                Ok(Some(renewed.access))
            }
            Err(err) => {
                payslip_warn!("Token refresh failed, clearing session: {}", err);
                self.set_session(None).await;
                Err(ApiError::new(FailureKind::SessionExpired, err.message))
            }
        }
    }

    async fn request_refresh(&self, refresh: &str) -> Result<RefreshResponse, ApiError> {
        let request = with_json(
            self.client.post(self.refresh_url.clone()),
            &RefreshRequest { refresh },
        )?;
        let response = request.send().await.map_err(map_reqwest_error)?;
        decode(response).await
    }

    fn notify(&self, session: Option<&SessionTokens>) {
        if let Some(listener) = &self.listener {
            listener.session_changed(session);
        }
    }
}
