//! Server-side browser sessions keyed by an opaque cookie token.
//!
//! A session holds the admin flag, pending flash messages, an inquiry draft to
//! reopen after a failed submission, and the cookies the backend issued at login.
//! Sessions expire after an idle period; every access refreshes the deadline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use dashmap::DashMap;
use uuid::Uuid;

use crate::config::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

/// One-request-lifetime status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub text: String,
}

impl Flash {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            text: text.into(),
        }
    }
}

/// Inquiry fields kept after a failed submission so the form reopens filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InquiryDraft {
    pub car_id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone)]
struct SessionRecord {
    is_admin: bool,
    flashes: Vec<Flash>,
    draft: Option<InquiryDraft>,
    backend_cookies: Vec<(String, String)>,
    expires_at: Instant,
}

impl SessionRecord {
    fn new(idle: Duration) -> Self {
        Self {
            is_admin: false,
            flashes: Vec::new(),
            draft: None,
            backend_cookies: Vec::new(),
            expires_at: Instant::now() + idle,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<DashMap<String, SessionRecord>>,
    config: Arc<SessionConfig>,
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }

    #[cfg(test)]
    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    pub fn backend_cookie_name(&self) -> &str {
        &self.config.backend_cookie_name
    }

    /// Raw token from the inbound cookie, whether or not the session is live.
    pub fn token<'a>(&self, jar: &'a CookieJar) -> Option<&'a str> {
        jar.get(&self.config.cookie_name)
            .map(|cookie| cookie.value())
            .filter(|value| !value.is_empty())
    }

    pub fn is_admin(&self, jar: &CookieJar) -> bool {
        self.with_live(jar, |record| record.is_admin)
            .unwrap_or(false)
    }

    pub fn backend_cookies(&self, jar: &CookieJar) -> Vec<(String, String)> {
        self.with_live(jar, |record| record.backend_cookies.clone())
            .unwrap_or_default()
    }

    pub fn push_flash(&self, jar: CookieJar, flash: Flash) -> CookieJar {
        self.update(jar, |record| record.flashes.push(flash))
    }

    pub fn take_flashes(&self, jar: &CookieJar) -> Vec<Flash> {
        self.with_live(jar, |record| std::mem::take(&mut record.flashes))
            .unwrap_or_default()
    }

    pub fn store_draft(&self, jar: CookieJar, draft: InquiryDraft) -> CookieJar {
        self.update(jar, |record| record.draft = Some(draft))
    }

    /// Hands out the draft once, and only on the page of the car it belongs to.
    pub fn take_draft(&self, jar: &CookieJar, car_id: Uuid) -> Option<InquiryDraft> {
        self.with_live(jar, |record| {
            let belongs = record
                .draft
                .as_ref()
                .is_some_and(|draft| draft.car_id == car_id);
            if belongs {
                record.draft.take()
            } else {
                None
            }
        })
        .flatten()
    }

    /// Marks the caller as admin under a fresh token; pending flashes carry over.
    pub fn login(&self, jar: CookieJar, backend_cookies: Vec<(String, String)>) -> CookieJar {
        let previous = self
            .token(&jar)
            .and_then(|token| self.inner.remove(token))
            .map(|(_, record)| record);

        let mut record = SessionRecord::new(self.config.idle_timeout);
        if let Some(previous) = previous {
            record.flashes = previous.flashes;
            record.draft = previous.draft;
        }
        record.is_admin = true;
        record.backend_cookies = backend_cookies;

        let token = Uuid::new_v4().to_string();
        self.inner.insert(token.clone(), record);
        jar.add(self.session_cookie(token))
    }

    /// Clears admin state; the session itself survives to carry flashes.
    pub fn logout(&self, jar: &CookieJar) {
        self.with_live(jar, |record| {
            record.is_admin = false;
            record.backend_cookies.clear();
        });
    }

    /// Drops expired sessions, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.inner.len();
        self.inner.retain(|_, record| record.expires_at > now);
        before.saturating_sub(self.inner.len())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Runs `f` against a live session, refreshing its idle deadline.
    fn with_live<T>(&self, jar: &CookieJar, f: impl FnOnce(&mut SessionRecord) -> T) -> Option<T> {
        let token = self.token(jar)?;
        let now = Instant::now();
        let mut entry = self.inner.get_mut(token)?;
        if entry.expires_at <= now {
            drop(entry);
            self.inner.remove(token);
            return None;
        }
        entry.expires_at = now + self.config.idle_timeout;
        Some(f(&mut *entry))
    }

    /// Mutates the caller's session, creating one (and its cookie) if needed.
    fn update(&self, jar: CookieJar, f: impl FnOnce(&mut SessionRecord)) -> CookieJar {
        let mut f = Some(f);
        let applied = self.with_live(&jar, |record| {
            if let Some(f) = f.take() {
                f(record);
            }
        });
        if applied.is_some() {
            return jar;
        }

        let mut record = SessionRecord::new(self.config.idle_timeout);
        if let Some(f) = f.take() {
            f(&mut record);
        }
        let token = Uuid::new_v4().to_string();
        self.inner.insert(token.clone(), record);
        jar.add(self.session_cookie(token))
    }

    fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((self.config.cookie_name.clone(), token))
            .path("/")
            .http_only(true)
            .secure(self.config.secure)
            .same_site(SameSite::None)
            .build()
    }
}
