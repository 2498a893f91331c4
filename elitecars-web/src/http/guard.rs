use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tracing::debug;

use super::state::AppState;

pub const LOGIN_PATH: &str = "/admin/login";

/// Lets admin sessions through; everyone else is sent to the login page before
/// the handler (and therefore the backend) is reached.
pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    if state.sessions.is_admin(&jar) {
        return next.run(request).await;
    }

    // Only a GET can be replayed after login.
    let return_url = (request.method() == Method::GET)
        .then(|| request.uri().path_and_query().map(|pq| pq.as_str().to_string()))
        .flatten();
    debug!(path = %request.uri().path(), "admin session required");
    Redirect::to(&login_location(return_url.as_deref())).into_response()
}

pub fn login_location(return_url: Option<&str>) -> String {
    match return_url.filter(|url| is_local_path(url)) {
        Some(url) => format!(
            "{LOGIN_PATH}?returnUrl={}",
            utf8_percent_encode(url, NON_ALPHANUMERIC)
        ),
        None => LOGIN_PATH.to_string(),
    }
}

/// Same-site absolute paths only; `//host` and `/\host` are treated as external.
pub fn is_local_path(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.starts_with("/\\")
}
