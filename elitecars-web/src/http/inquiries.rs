use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::backend::{BackendCredential, BackendError};
use crate::inquiry_rules::{ensure_can_delete, Actor, InquiryRuleError};
use crate::models::{field_errors, CreateInquiryForm, FieldErrors, ReplyForm, UpdateInquiryForm};
use crate::session::{Flash, InquiryDraft};
use crate::views;
use crate::views::inquiries::requester_url;

use super::failure_text;
use super::state::AppState;

const INQUIRIES_PATH: &str = "/inquiries";

/// A deletion can be refused locally or by the backend.
#[derive(Debug, Error)]
enum DeleteError {
    #[error(transparent)]
    Rule(#[from] InquiryRuleError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    #[serde(default)]
    email: String,
}

/// Inquiry form as posted from the car details page; the car id is checked by hand
/// so a bad value still ends in a redirect rather than a rejection.
#[derive(Debug, Default, Deserialize)]
pub struct InquirySubmission {
    #[serde(default)]
    car_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    message: String,
}

pub async fn index(
    State(state): State<AppState>,
    credential: BackendCredential,
    jar: CookieJar,
) -> Response {
    if !state.sessions.is_admin(&jar) {
        return Redirect::to("/inquiries/mine").into_response();
    }

    let ctx = state.page_context(&jar);
    let (ctx, inquiries) = match state.inquiries.list(&credential).await {
        Ok(inquiries) => (ctx, inquiries),
        Err(error) => (
            ctx.with_flash(Flash::error(failure_text(&error, "Failed to load inquiries."))),
            Vec::new(),
        ),
    };
    debug!(inquiries = inquiries.len(), "admin inquiry list rendered");
    Html(views::inquiries::admin_list(&ctx, &inquiries)).into_response()
}

pub async fn mine(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<EmailQuery>,
) -> Html<String> {
    let email = query.email.trim();
    let ctx = state.page_context(&jar);
    if email.is_empty() {
        return Html(views::inquiries::requester_page(&ctx, "", &[]));
    }

    let (ctx, inquiries) = match state.inquiries.list_by_email(email).await {
        Ok(inquiries) => (ctx, inquiries),
        Err(error) => (
            ctx.with_flash(Flash::error(failure_text(&error, "Failed to load inquiries."))),
            Vec::new(),
        ),
    };
    Html(views::inquiries::requester_page(&ctx, email, &inquiries))
}

pub async fn create(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(submission): Form<InquirySubmission>,
) -> (CookieJar, Redirect) {
    let Ok(car_id) = Uuid::parse_str(submission.car_id.trim()) else {
        let jar = state.flash(
            jar,
            Flash::error("Please fill in all required fields correctly."),
        );
        return (jar, Redirect::to("/cars"));
    };

    let form = CreateInquiryForm {
        car_id,
        name: submission.name.trim().to_string(),
        email: submission.email.trim().to_string(),
        message: submission.message.trim().to_string(),
    };
    let details = format!("/cars/{car_id}");

    if let Err(errors) = form.validate() {
        debug!(car_id = %car_id, fields = errors.field_errors().len(), "inquiry form rejected");
        let jar = state.flash(
            jar,
            Flash::error("Please fill in all required fields correctly."),
        );
        let jar = state.sessions.store_draft(jar, draft_of(&form));
        return (jar, Redirect::to(&details));
    }

    match state.inquiries.create(&form).await {
        Ok(created) => {
            info!(car_id = %car_id, inquiry_id = %created.id, "inquiry submitted");
            let jar = state.flash(jar, Flash::success("Inquiry submitted successfully!"));
            (jar, Redirect::to(&details))
        }
        Err(error) => {
            let jar = state.flash(
                jar,
                Flash::error(format!("Failed to submit inquiry: {error}")),
            );
            let jar = state.sessions.store_draft(jar, draft_of(&form));
            (jar, Redirect::to(&details))
        }
    }
}

fn draft_of(form: &CreateInquiryForm) -> InquiryDraft {
    InquiryDraft {
        car_id: form.car_id,
        name: form.name.clone(),
        email: form.email.clone(),
        message: form.message.clone(),
    }
}

pub async fn edit_page(
    State(state): State<AppState>,
    credential: BackendCredential,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Query(query): Query<EmailQuery>,
) -> Response {
    if state.sessions.is_admin(&jar) {
        return Redirect::to(INQUIRIES_PATH).into_response();
    }

    match state.inquiries.get(id, &credential).await {
        Ok(inquiry) => {
            let ctx = state.page_context(&jar);
            let form = UpdateInquiryForm::from_inquiry(&inquiry);
            Html(views::inquiries::edit_form(&ctx, id, &form, &FieldErrors::new()))
                .into_response()
        }
        Err(error) => {
            warn!(inquiry_id = %id, error = %error, "inquiry unavailable for editing");
            let jar = state.flash(jar, Flash::error(error.to_string()));
            (jar, Redirect::to(&requester_url(&query.email))).into_response()
        }
    }
}

pub async fn update(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Form(form): Form<UpdateInquiryForm>,
) -> Response {
    if state.sessions.is_admin(&jar) {
        let jar = state.flash(jar, Flash::error("Admins cannot update user inquiries."));
        return (jar, Redirect::to(INQUIRIES_PATH)).into_response();
    }

    let form = UpdateInquiryForm {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        message: form.message.trim().to_string(),
    };
    if let Err(errors) = form.validate() {
        let ctx = state.page_context(&jar);
        let page = views::inquiries::edit_form(&ctx, id, &form, &field_errors(&errors));
        return (StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response();
    }

    match state.inquiries.update_by_requester(id, &form).await {
        Ok(_) => {
            let jar = state.flash(jar, Flash::success("Inquiry updated successfully!"));
            (jar, Redirect::to(&requester_url(&form.email))).into_response()
        }
        Err(error) => {
            let ctx = state
                .page_context(&jar)
                .with_flash(Flash::error(error.to_string()));
            let page = views::inquiries::edit_form(&ctx, id, &form, &FieldErrors::new());
            (StatusCode::BAD_GATEWAY, Html(page)).into_response()
        }
    }
}

pub async fn delete_mine(
    State(state): State<AppState>,
    credential: BackendCredential,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Form(query): Form<EmailQuery>,
) -> (CookieJar, Redirect) {
    let back = requester_url(&query.email);
    if state.sessions.is_admin(&jar) {
        let jar = state.flash(
            jar,
            Flash::error("Admins cannot delete user inquiries using this action."),
        );
        return (jar, Redirect::to(&back));
    }

    let email = query.email.trim();
    let result = async {
        let inquiry = state.inquiries.get(id, &credential).await?;
        ensure_can_delete(Actor::Requester, &inquiry)?;
        state.inquiries.delete_by_requester(id, email).await?;
        Ok::<(), DeleteError>(())
    }
    .await;

    let flash = match result {
        Ok(()) => Flash::success("Inquiry deleted successfully!"),
        Err(error) => {
            debug!(inquiry_id = %id, error = %error, "requester deletion refused");
            Flash::error(error.to_string())
        }
    };
    (state.flash(jar, flash), Redirect::to(&back))
}

pub async fn reply(
    State(state): State<AppState>,
    credential: BackendCredential,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Form(form): Form<ReplyForm>,
) -> (CookieJar, Redirect) {
    let form = ReplyForm {
        response: form.response.trim().to_string(),
    };
    let flash = if let Err(errors) = form.validate() {
        let message = field_errors(&errors)
            .into_values()
            .next()
            .unwrap_or_else(|| String::from("Response is required."));
        Flash::error(message)
    } else {
        match state.inquiries.reply(id, &form.response, &credential).await {
            Ok(_) => Flash::success("Response saved successfully!"),
            Err(error) => Flash::error(error.to_string()),
        }
    };
    (state.flash(jar, flash), Redirect::to(INQUIRIES_PATH))
}

pub async fn delete(
    State(state): State<AppState>,
    credential: BackendCredential,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> (CookieJar, Redirect) {
    let result = async {
        let inquiry = state.inquiries.get(id, &credential).await?;
        ensure_can_delete(Actor::Admin, &inquiry)?;
        state.inquiries.delete(id, &credential).await?;
        Ok::<(), DeleteError>(())
    }
    .await;

    let flash = match result {
        Ok(()) => Flash::success("Inquiry deleted successfully!"),
        Err(error) => {
            debug!(inquiry_id = %id, error = %error, "admin deletion refused");
            Flash::error(error.to_string())
        }
    };
    (state.flash(jar, flash), Redirect::to(INQUIRIES_PATH))
}

pub async fn delete_response(
    State(state): State<AppState>,
    credential: BackendCredential,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> (CookieJar, Redirect) {
    let flash = match state.inquiries.delete_response(id, &credential).await {
        Ok(_) => Flash::success("Response deleted successfully!"),
        Err(error) => Flash::error(error.to_string()),
    };
    (state.flash(jar, flash), Redirect::to(INQUIRIES_PATH))
}
