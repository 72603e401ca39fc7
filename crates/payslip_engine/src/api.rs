use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use payslip_core::{
    AutoSendResponse, DateRange, LogEntry, LogId, LogQuery, MonthSummary, Paginated,
    PayslipMonth, PreviewProgress, PreviewStart, ProgressSnapshot, ResendOutcome, ResendRequest,
    SendSelectedRequest, SendStarted, TaskId,
};
use payslip_logging::{payslip_debug, payslip_info};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use url::Url;

use crate::auth::{AuthPipeline, SessionListener, SessionTokens};
use crate::http::{decode, expect_success, map_reqwest_error, with_json};
use crate::{ApiError, ClientSettings, FailureKind};

/// Backend operations used by the console.
#[async_trait::async_trait]
pub trait PayslipApi: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<SessionTokens, ApiError>;
    /// Uploads a PDF for immediate distribution. Returns the send task id.
    async fn upload_auto(&self, file: &Path) -> Result<TaskId, ApiError>;
    async fn start_preview(&self, file: &Path) -> Result<PreviewStart, ApiError>;
    async fn preview_progress(&self, task_id: &str) -> Result<PreviewProgress, ApiError>;
    async fn confirm_send(&self, request: &SendSelectedRequest) -> Result<SendStarted, ApiError>;
    async fn send_progress(&self, task_id: &str) -> Result<ProgressSnapshot, ApiError>;
    async fn summary(&self, range: &DateRange) -> Result<Vec<MonthSummary>, ApiError>;
    async fn logs(&self, query: &LogQuery) -> Result<Paginated<LogEntry>, ApiError>;
    async fn delete_log(&self, id: LogId) -> Result<(), ApiError>;
    async fn available_months(&self, matricule: &str) -> Result<Vec<PayslipMonth>, ApiError>;
    async fn resend(&self, request: &ResendRequest) -> Result<ResendOutcome, ApiError>;
}

pub struct ReqwestApi {
    client: reqwest::Client,
    base_url: Url,
    upload_timeout: Duration,
    auth: AuthPipeline,
}

impl ReqwestApi {
    pub fn new(settings: &ClientSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(settings.base_url.trim())
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{base_url} cannot be used as a base url"),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        let refresh_url = endpoint(&base_url, &["api", "auth", "token", "refresh"])?;

        Ok(Self {
            auth: AuthPipeline::new(client.clone(), refresh_url),
            client,
            base_url,
            upload_timeout: settings.upload_timeout,
        })
    }

    pub fn with_session(mut self, session: Option<SessionTokens>) -> Self {
        self.auth = self.auth.with_session(session);
        self
    }

    pub fn with_session_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.auth = self.auth.with_listener(listener);
        self
    }

    pub fn auth(&self) -> &AuthPipeline {
        &self.auth
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        endpoint(&self.base_url, segments)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self
            .auth
            .execute(|| Ok(self.client.get(url.clone())))
            .await?;
        decode(response).await
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .auth
            .execute(|| with_json(self.client.post(url.clone()), body))
            .await?;
        decode(response).await
    }

    async fn post_pdf<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        file: &Path,
    ) -> Result<T, ApiError> {
        let upload = PdfUpload::read(file).await?;
        payslip_info!(
            "Uploading {} ({} bytes) to {}",
            upload.file_name,
            upload.content.len(),
            url.path()
        );
        let response = self
            .auth
            .execute(|| {
                Ok(self
                    .client
                    .post(url.clone())
                    .timeout(self.upload_timeout)
                    .multipart(upload.form()?))
            })
            .await?;
        decode(response).await
    }
}

#[async_trait::async_trait]
impl PayslipApi for ReqwestApi {
    async fn login(&self, username: &str, password: &str) -> Result<SessionTokens, ApiError> {
        #[derive(Serialize)]
        struct Credentials<'a> {
            username: &'a str,
            password: &'a str,
        }

        let url = self.url(&["api", "auth", "login"])?;
        let request = with_json(
            self.client.post(url),
            &Credentials { username, password },
        )?;
        let response = request.send().await.map_err(map_reqwest_error)?;
        let tokens: SessionTokens = decode(response).await?;
        self.auth.set_session(Some(tokens.clone())).await;
        payslip_info!("Logged in as {}", username);
        Ok(tokens)
    }

    async fn upload_auto(&self, file: &Path) -> Result<TaskId, ApiError> {
        let url = self.url(&["api", "employees", "send-bulletins"])?;
        let response: AutoSendResponse = self.post_pdf(url, file).await?;
        match response {
            AutoSendResponse {
                error: Some(message),
                ..
            } => Err(ApiError::new(FailureKind::Backend { status: 200 }, message)),
            AutoSendResponse {
                task_id: Some(task_id),
                ..
            } => Ok(task_id),
            _ => Err(ApiError::new(
                FailureKind::Decode,
                "upload response carries no task_id",
            )),
        }
    }

    async fn start_preview(&self, file: &Path) -> Result<PreviewStart, ApiError> {
        let url = self.url(&["api", "employees", "send-bulletins-preview"])?;
        self.post_pdf(url, file).await
    }

    async fn preview_progress(&self, task_id: &str) -> Result<PreviewProgress, ApiError> {
        let url = self.url(&["api", "employees", "preview-progress", task_id])?;
        self.get(url).await
    }

    async fn confirm_send(&self, request: &SendSelectedRequest) -> Result<SendStarted, ApiError> {
        let url = self.url(&["api", "employees", "send-bulletins-selected"])?;
        payslip_info!(
            "Confirming batch {} for {} recipients",
            request.batch_id,
            request.matricules.len()
        );
        self.post_json(url, request).await
    }

    async fn send_progress(&self, task_id: &str) -> Result<ProgressSnapshot, ApiError> {
        let url = self.url(&["api", "employees", "progress", task_id])?;
        let mut snapshot: ProgressSnapshot = self.get(url).await?;
        if snapshot.task_id.is_empty() {
            snapshot.task_id = task_id.to_string();
        }
        Ok(snapshot)
    }

    async fn summary(&self, range: &DateRange) -> Result<Vec<MonthSummary>, ApiError> {
        let mut url = self.url(&["api", "employees", "bulletins", "logs", "summary"])?;
        url.query_pairs_mut().extend_pairs(range.query_pairs());
        self.get(url).await
    }

    async fn logs(&self, query: &LogQuery) -> Result<Paginated<LogEntry>, ApiError> {
        let mut url = self.url(&["api", "employees", "bulletins", "logs"])?;
        url.query_pairs_mut().extend_pairs(query.query_pairs());
        payslip_debug!("Fetching logs {}", url);
        self.get(url).await
    }

    async fn delete_log(&self, id: LogId) -> Result<(), ApiError> {
        let id = id.to_string();
        let url = self.url(&["api", "employees", "bulletins", "logs", id.as_str()])?;
        let response = self
            .auth
            .execute(|| Ok(self.client.delete(url.clone())))
            .await?;
        expect_success(response).await
    }

    async fn available_months(&self, matricule: &str) -> Result<Vec<PayslipMonth>, ApiError> {
        let url = self.url(&["api", "employees", matricule, "available-bulletins"])?;
        let body: serde_json::Value = self.get(url).await?;
        if !body.is_array() {
            return Ok(Vec::new());
        }
        serde_json::from_value(body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }

    async fn resend(&self, request: &ResendRequest) -> Result<ResendOutcome, ApiError> {
        let url = self.url(&["api", "employees", "send-bulletins-to-user"])?;
        self.post_json(url, request).await
    }
}

/// Builds `{base}/{segments...}/`, percent-encoding each segment.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|()| ApiError::new(FailureKind::InvalidUrl, base.to_string()))?
        .pop_if_empty()
        .extend(segments)
        .push("");
    Ok(url)
}

/// PDF read once and re-wrapped into a fresh form for every attempt.
struct PdfUpload {
    file_name: String,
    content: Bytes,
}

impl PdfUpload {
    async fn read(path: &Path) -> Result<Self, ApiError> {
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(ApiError::new(
                FailureKind::InvalidFile,
                format!("{} is not a PDF file", path.display()),
            ));
        }
        let content = tokio::fs::read(path).await.map_err(|err| {
            ApiError::new(
                FailureKind::InvalidFile,
                format!("cannot read {}: {err}", path.display()),
            )
        })?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("payslips.pdf")
            .to_string();
        Ok(Self {
            file_name,
            content: Bytes::from(content),
        })
    }

    fn form(&self) -> Result<Form, ApiError> {
        let part = Part::stream_with_length(self.content.clone(), self.content.len() as u64)
            .file_name(self.file_name.clone())
            .mime_str("application/pdf")
            .map_err(|err| ApiError::new(FailureKind::InvalidFile, err.to_string()))?;
        Ok(Form::new().part("file", part))
    }
}
