//! HTML rendering. Pages are plain `format!` templates around a shared layout.

pub mod admin;
pub mod cars;
pub mod home;
pub mod inquiries;

use crate::models::FieldErrors;
use crate::session::{Flash, FlashKind};

/// Per-request data every page needs.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub is_admin: bool,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    /// Adds a banner that is shown on this render only.
    pub fn with_flash(mut self, flash: Flash) -> Self {
        self.flashes.push(flash);
        self
    }
}

pub fn layout(title: &str, ctx: &PageContext, content: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - EliteCars</title>
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css">
</head>
<body class="bg-light">
    {nav}
    <main class="container py-4">
        {banners}
        {content}
    </main>
</body>
</html>"##,
        title = escape(title),
        nav = nav(ctx),
        banners = banners(&ctx.flashes),
    )
}

fn nav(ctx: &PageContext) -> String {
    let links = if ctx.is_admin {
        r##"<li class="nav-item"><a class="nav-link" href="/cars">Cars</a></li>
            <li class="nav-item"><a class="nav-link" href="/cars/create">Add car</a></li>
            <li class="nav-item"><a class="nav-link" href="/inquiries">Inquiries</a></li>
            <li class="nav-item"><a class="nav-link" href="/home/admin">Dashboard</a></li>"##
    } else {
        r##"<li class="nav-item"><a class="nav-link" href="/cars">Cars</a></li>
            <li class="nav-item"><a class="nav-link" href="/inquiries/mine">My inquiries</a></li>"##
    };
    let session = if ctx.is_admin {
        r##"<form method="post" action="/admin/logout" class="d-flex">
                <button type="submit" class="btn btn-outline-light btn-sm">Log out</button>
            </form>"##
    } else {
        r##"<a class="btn btn-outline-light btn-sm" href="/admin/login">Admin login</a>"##
    };
    format!(
        r##"<nav class="navbar navbar-expand navbar-dark bg-dark">
        <div class="container">
            <a class="navbar-brand" href="/">EliteCars</a>
            <ul class="navbar-nav me-auto">
            {links}
            </ul>
            {session}
        </div>
    </nav>"##
    )
}

fn banners(flashes: &[Flash]) -> String {
    flashes
        .iter()
        .map(|flash| {
            let class = match flash.kind {
                FlashKind::Success => "alert-success",
                FlashKind::Error => "alert-danger",
            };
            format!(
                r#"<div class="alert {class}" role="alert">{}</div>"#,
                escape(&flash.text)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Inline error under a form field, empty when the field is valid.
pub fn field_error(errors: &FieldErrors, field: &str) -> String {
    errors
        .get(field)
        .map(|message| {
            format!(
                r#"<div class="invalid-feedback d-block">{}</div>"#,
                escape(message)
            )
        })
        .unwrap_or_default()
}

/// Resolves backend-relative image paths against the backend base URL.
pub fn image_src(api_base_url: &str, image_url: &str) -> String {
    if image_url.starts_with("http://") || image_url.starts_with("https://") {
        image_url.to_string()
    } else {
        format!(
            "{}/{}",
            api_base_url.trim_end_matches('/'),
            image_url.trim_start_matches('/')
        )
    }
}

pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
