use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use payslip_core::DateRange;
use payslip_engine::{
    ClientSettings, FailureKind, PayslipApi, ReqwestApi, SessionListener, SessionTokens,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUMMARY: &str = "/api/employees/bulletins/logs/summary/";
const REFRESH: &str = "/api/auth/token/refresh/";

#[derive(Default)]
struct RecordingListener {
    changes: Mutex<Vec<Option<SessionTokens>>>,
}

impl RecordingListener {
    fn changes(&self) -> Vec<Option<SessionTokens>> {
        self.changes.lock().unwrap().clone()
    }
}

impl SessionListener for RecordingListener {
    fn session_changed(&self, session: Option<&SessionTokens>) {
        self.changes.lock().unwrap().push(session.cloned());
    }
}

fn tokens(access: &str, refresh: Option<&str>) -> SessionTokens {
    SessionTokens {
        access: access.to_string(),
        refresh: refresh.map(str::to_string),
    }
}

fn api_with_session(
    server: &MockServer,
    session: Option<SessionTokens>,
) -> (ReqwestApi, Arc<RecordingListener>) {
    let listener = Arc::new(RecordingListener::default());
    let settings = ClientSettings::default().with_base_url(server.uri());
    let api = ReqwestApi::new(&settings)
        .unwrap()
        .with_session(session)
        .with_session_listener(listener.clone());
    (api, listener)
}

fn range() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    )
}

async fn mount_summary(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(SUMMARY))
        .and(bearer_token("old"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(SUMMARY))
        .and(bearer_token("new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_stores_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_json(json!({"username": "rh", "password": "secret"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "a1", "refresh": "r1"})),
        )
        .mount(&server)
        .await;

    let (api, listener) = api_with_session(&server, None);
    let session = api.login("rh", "secret").await.unwrap();
    assert_eq!(session, tokens("a1", Some("r1")));
    assert_eq!(api.auth().session().await, Some(tokens("a1", Some("r1"))));
    assert_eq!(listener.changes(), vec![Some(tokens("a1", Some("r1")))]);
}

#[tokio::test]
async fn expired_access_token_is_refreshed_and_request_retried() {
    let server = MockServer::start().await;
    mount_summary(&server).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .and(body_json(json!({"refresh": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
        .expect(1)
        .mount(&server)
        .await;

    let (api, listener) = api_with_session(&server, Some(tokens("old", Some("r1"))));
    let rows = api.summary(&range()).await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(listener.changes(), vec![Some(tokens("new", Some("r1")))]);
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
    let server = MockServer::start().await;
    mount_summary(&server).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(200))
                .set_body_json(json!({"access": "new", "refresh": "r2"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (api, listener) = api_with_session(&server, Some(tokens("old", Some("r1"))));
    let range = range();
    let (a, b, c, d) = tokio::join!(
        api.summary(&range),
        api.summary(&range),
        api.summary(&range),
        api.summary(&range)
    );
    for result in [a, b, c, d] {
        assert!(result.is_ok(), "{result:?}");
    }
    assert_eq!(listener.changes(), vec![Some(tokens("new", Some("r2")))]);
}

#[tokio::test]
async fn failed_refresh_clears_the_session() {
    let server = MockServer::start().await;
    mount_summary(&server).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Token is invalid or expired"})),
        )
        .mount(&server)
        .await;

    let (api, listener) = api_with_session(&server, Some(tokens("old", Some("r1"))));
    let err = api.summary(&range()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::SessionExpired);
    assert_eq!(api.auth().session().await, None);
    assert_eq!(listener.changes(), vec![None]);
}

#[tokio::test]
async fn unauthorized_without_refresh_token_is_reported() {
    let server = MockServer::start().await;
    mount_summary(&server).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
        .expect(0)
        .mount(&server)
        .await;

    let (api, listener) = api_with_session(&server, Some(tokens("old", None)));
    let err = api.summary(&range()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Unauthorized);
    assert_eq!(err.message, "Token expired");
    assert!(listener.changes().is_empty());
}
