use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

use crate::session::Flash;
use crate::views::{layout, PageContext};

/// Request-level failures that cannot be turned into a flash and redirect.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("The submitted form could not be read.")]
    Multipart(#[from] MultipartError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Multipart(error) => error.status(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = %status, error = %self, "request rejected");
        let ctx = PageContext::default().with_flash(Flash::error(self.to_string()));
        let body = layout(
            "Request error",
            &ctx,
            r#"<a class="btn btn-primary" href="/">Back to home</a>"#,
        );
        (status, Html(body)).into_response()
    }
}
