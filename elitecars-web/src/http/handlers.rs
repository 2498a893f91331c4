use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::middleware;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use tower_governor::{
    governor::GovernorConfigBuilder,
    key_extractor::GlobalKeyExtractor,
    GovernorLayer,
};

use crate::views;

use super::guard::require_admin;
use super::state::AppState;
use super::{admin, cars, inquiries};

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router(state: AppState) -> Router {
    // Both limits are non-zero constants, so the builder always yields a config.
    #[allow(clippy::expect_used)]
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(20)
            .burst_size(50)
            .key_extractor(GlobalKeyExtractor)
            .finish()
            .expect("static governor config is valid"),
    );

    // Car photos routinely exceed axum's 2 MB default.
    let upload_limit = DefaultBodyLimit::max(state.max_upload_size);

    let admin_only = Router::new()
        .route("/home/admin", get(admin_view))
        .route(
            "/cars/create",
            get(cars::create_page)
                .post(cars::create)
                .layer(upload_limit),
        )
        .route(
            "/cars/{id}/edit",
            get(cars::edit_page)
                .post(cars::update)
                .layer(upload_limit),
        )
        .route("/cars/{id}/delete", post(cars::delete))
        .route(
            "/cars/{id}/images/{image_id}/delete",
            post(cars::delete_image),
        )
        .route("/inquiries/{id}/reply", post(inquiries::reply))
        .route("/inquiries/{id}/delete", post(inquiries::delete))
        .route(
            "/inquiries/{id}/delete-response",
            post(inquiries::delete_response),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/home/user", get(user_view))
        .route("/admin/login", get(admin::login_page).post(admin::login))
        .route("/admin/logout", post(admin::logout))
        .route("/cars", get(cars::list))
        .route("/cars/{id}", get(cars::details))
        .route("/inquiries", get(inquiries::index).post(inquiries::create))
        .route("/inquiries/mine", get(inquiries::mine))
        .route(
            "/inquiries/{id}/edit",
            get(inquiries::edit_page).post(inquiries::update),
        )
        .route("/inquiries/{id}/delete-mine", post(inquiries::delete_mine))
        .merge(admin_only)
        .layer(GovernorLayer::new(governor_conf))
        .layer(
            tower_http::request_id::SetRequestIdLayer::new(
                axum::http::header::HeaderName::from_static("x-request-id"),
                tower_http::request_id::MakeRequestUuid,
            ),
        )
        .layer(tower_http::request_id::PropagateRequestIdLayer::new(
            axum::http::header::HeaderName::from_static("x-request-id"),
        ))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn index(State(state): State<AppState>, jar: CookieJar) -> Html<String> {
    Html(views::home::index(&state.page_context(&jar)))
}

async fn user_view(State(state): State<AppState>, jar: CookieJar) -> Html<String> {
    Html(views::home::user_view(&state.page_context(&jar)))
}

async fn admin_view(State(state): State<AppState>, jar: CookieJar) -> Html<String> {
    Html(views::home::admin_view(&state.page_context(&jar)))
}
