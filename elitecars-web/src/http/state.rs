use std::sync::Arc;

use axum_extra::extract::CookieJar;

use crate::backend::{AdminApiClient, CarApiClient, InquiryApiClient};
use crate::config::{BackendConfig, DEFAULT_MAX_UPLOAD_SIZE};
use crate::session::{Flash, SessionStore};
use crate::views::PageContext;

#[derive(Debug, Clone)]
pub struct AppState {
    pub admin: AdminApiClient,
    pub cars: CarApiClient,
    pub inquiries: InquiryApiClient,
    pub sessions: SessionStore,
    /// Used to resolve relative image URLs in rendered pages.
    pub api_base_url: Arc<str>,
    /// Body limit for the multipart car forms.
    pub max_upload_size: usize,
}

impl AppState {
    pub fn new(http: reqwest::Client, backend: &BackendConfig, sessions: SessionStore) -> Self {
        Self {
            admin: AdminApiClient::new(http.clone(), &backend.base_url),
            cars: CarApiClient::new(http.clone(), &backend.base_url),
            inquiries: InquiryApiClient::new(http, &backend.base_url),
            sessions,
            api_base_url: Arc::from(backend.base_url.as_str()),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    pub fn with_max_upload_size(mut self, max_upload_size: usize) -> Self {
        self.max_upload_size = max_upload_size;
        self
    }

    /// Admin flag plus any flashes queued for this render; the flashes are consumed.
    pub fn page_context(&self, jar: &CookieJar) -> PageContext {
        PageContext {
            is_admin: self.sessions.is_admin(jar),
            flashes: self.sessions.take_flashes(jar),
        }
    }

    pub fn flash(&self, jar: CookieJar, flash: Flash) -> CookieJar {
        self.sessions.push_flash(jar, flash)
    }
}
