//! HTTP layer: Axum router, guard, and the handlers behind each page.
//!
//! Handlers stay thin: check input, make one backend call with the caller's
//! [`BackendCredential`](crate::backend::BackendCredential), then render a page or
//! redirect with a flash message.

mod admin;
mod bridge;
mod cars;
mod error;
mod guard;
mod handlers;
mod inquiries;
mod state;


pub use handlers::router;
pub use state::AppState;

use crate::backend::BackendError;

/// Banner text for a failed backend call, with a per-action fallback.
fn failure_text(error: &BackendError, fallback: &str) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
