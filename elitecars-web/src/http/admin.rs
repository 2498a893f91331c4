use axum::extract::{Query, State};
use axum::response::{Html, Redirect};
use axum::{Form, Json};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::BackendCredential;
use crate::models::LoginForm;
use crate::session::Flash;
use crate::views;

use super::guard::is_local_path;
use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(default, rename = "returnUrl")]
    return_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    success: bool,
    message: String,
    return_url: Option<String>,
}

impl LoginResponse {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            return_url: None,
        }
    }
}

pub async fn login_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> Html<String> {
    let return_url = query.return_url.filter(|url| is_local_path(url));
    Html(views::admin::login_page(
        &state.page_context(&jar),
        return_url.as_deref(),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> (CookieJar, Json<LoginResponse>) {
    if form.username.trim().is_empty() || form.password.trim().is_empty() {
        return (
            jar,
            Json(LoginResponse::failed("Username and password are required.")),
        );
    }

    match state.admin.login(&form.username, &form.password).await {
        Ok(outcome) => {
            info!(username = %form.username, "admin logged in");
            let jar = state.sessions.login(jar, outcome.backend_cookies);
            (
                jar,
                Json(LoginResponse {
                    success: true,
                    message: String::from("Login successful."),
                    return_url: form.return_url.filter(|url| is_local_path(url)),
                }),
            )
        }
        Err(error) => {
            warn!(username = %form.username, error = %error, "admin login rejected");
            let message = super::failure_text(&error, "Invalid username or password.");
            (jar, Json(LoginResponse::failed(message)))
        }
    }
}

/// The local admin flag is cleared only once the backend confirms the logout.
pub async fn logout(
    State(state): State<AppState>,
    credential: BackendCredential,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let flash = match state.admin.logout(&credential).await {
        Ok(()) => {
            state.sessions.logout(&jar);
            info!("admin logged out");
            Flash::success("Logged out successfully")
        }
        Err(error) => {
            warn!(error = %error, "admin logout failed");
            Flash::error("Logout failed")
        }
    };
    (state.flash(jar, flash), Redirect::to("/"))
}
