use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use crate::backend::BackendCredential;
use crate::session::SessionStore;

use super::state::AppState;

/// Every handler that talks to the backend on the caller's behalf takes a
/// `BackendCredential`; it is rebuilt from the inbound cookies on each request.
impl FromRequestParts<AppState> for BackendCredential {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(credential_for(&state.sessions, &jar))
    }
}

/// The inbound session token under the backend's cookie name, overlaid with the
/// cookies the backend issued at login. Empty for a caller without a session.
pub fn credential_for(sessions: &SessionStore, jar: &CookieJar) -> BackendCredential {
    let mut credential = BackendCredential::anonymous();
    if let Some(token) = sessions.token(jar) {
        credential = credential.with_cookie(sessions.backend_cookie_name(), token);
    }
    for (name, value) in sessions.backend_cookies(jar) {
        credential = credential.with_cookie(name, value);
    }
    credential
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum_extra::extract::cookie::{Cookie, CookieJar};

    use super::credential_for;
    use crate::config::SessionConfig;
    use crate::session::SessionStore;

    #[test]
    fn no_session_cookie_means_anonymous() {
        let sessions = SessionStore::new(SessionConfig::default());
        assert!(credential_for(&sessions, &CookieJar::new()).is_anonymous());
    }

    #[test]
    fn login_cookies_override_forwarded_token() {
        let sessions = SessionStore::new(SessionConfig::default());
        let server_jar = sessions.login(
            CookieJar::new(),
            vec![(String::from("backend_auth"), String::from("xyz"))],
        );
        let token = server_jar.get(".EliteCars.Session").unwrap().value().to_string();
        let browser = CookieJar::new().add(Cookie::new(".EliteCars.Session", token.clone()));

        let header = credential_for(&sessions, &browser).header_value().unwrap();
        assert_eq!(header, format!(".AspNetCore.Session={token}; backend_auth=xyz"));
    }
}
