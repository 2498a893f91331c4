use reqwest::header::SET_COOKIE;
use reqwest::multipart::Form;
use reqwest::Method;
use tracing::{info, warn};

use super::problem::extract_success_message;
use super::{send, BackendCredential, BackendResult, Endpoint};

#[derive(Debug, Clone)]
pub struct AdminApiClient {
    endpoint: Endpoint,
}

/// Confirmation of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub message: String,
    /// Cookies the backend issued with the login response (name, value).
    pub backend_cookies: Vec<(String, String)>,
}

impl AdminApiClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            endpoint: Endpoint::new(http, base_url, "admin"),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> BackendResult<LoginOutcome> {
        let form = Form::new()
            .text("Username", username.to_string())
            .text("Password", password.to_string());

        let response = send(
            self.endpoint
                .request(Method::POST, "login", &BackendCredential::anonymous())
                .multipart(form),
        )
        .await?;

        let backend_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|raw| match cookie::Cookie::parse(raw.to_string()) {
                Ok(parsed) => Some((parsed.name().to_string(), parsed.value().to_string())),
                Err(error) => {
                    warn!(error = %error, "ignoring malformed backend cookie");
                    None
                }
            })
            .collect::<Vec<_>>();

        let body = response.text().await.unwrap_or_default();
        info!(cookies = backend_cookies.len(), "admin login accepted by backend");
        Ok(LoginOutcome {
            message: extract_success_message(&body),
            backend_cookies,
        })
    }

    pub async fn logout(&self, credential: &BackendCredential) -> BackendResult<()> {
        send(self.endpoint.request(Method::POST, "logout", credential)).await?;
        info!("admin logout accepted by backend");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::http::header::SET_COOKIE;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    use super::AdminApiClient;
    use crate::backend::test_support::spawn;
    use crate::backend::{BackendCredential, BackendError};

    #[tokio::test]
    async fn login_captures_backend_cookies_and_message() {
        let backend = spawn(Router::new().route(
            "/api/admin/login",
            post(|| async {
                (
                    [(SET_COOKIE, "backend_sid=abc123; Path=/; HttpOnly")],
                    Json(json!({ "message": "Welcome, admin" })),
                )
            }),
        ))
        .await;
        let client = AdminApiClient::new(backend.http(), &backend.base_url);

        let outcome = client.login("admin", "secret").await.unwrap();

        assert_eq!(outcome.message, "Welcome, admin");
        assert_eq!(
            outcome.backend_cookies,
            vec![(String::from("backend_sid"), String::from("abc123"))]
        );
        let call = backend.recorder.last().unwrap();
        assert_eq!(call.method, "POST");
        assert!(call.body.contains("name=\"Username\""));
        assert!(call.body.contains("admin"));
        assert!(call.body.contains("name=\"Password\""));
        assert!(call.cookie.is_none());
    }

    #[tokio::test]
    async fn login_failure_surfaces_problem_title() {
        let backend = spawn(Router::new().route(
            "/api/admin/login",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "title": "Invalid username or password", "status": 401 })),
                )
                    .into_response()
            }),
        ))
        .await;
        let client = AdminApiClient::new(backend.http(), &backend.base_url);

        let error = client.login("admin", "wrong").await.unwrap_err();

        assert_eq!(error.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(error.to_string(), "Invalid username or password");
    }

    #[tokio::test]
    async fn logout_forwards_credential() {
        let backend = spawn(Router::new().route(
            "/api/admin/logout",
            post(|| async { StatusCode::NO_CONTENT }),
        ))
        .await;
        let client = AdminApiClient::new(backend.http(), &backend.base_url);
        let credential = BackendCredential::anonymous().with_cookie("backend_sid", "abc123");

        client.logout(&credential).await.unwrap();

        let call = backend.recorder.last().unwrap();
        assert_eq!(call.cookie.as_deref(), Some("backend_sid=abc123"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let client = AdminApiClient::new(reqwest::Client::new(), "http://127.0.0.1:9");
        let error = client
            .logout(&BackendCredential::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(error, BackendError::Transport(_)));
    }
}
