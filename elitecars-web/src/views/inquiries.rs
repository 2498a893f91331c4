use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use uuid::Uuid;

use crate::inquiry_rules::NO_RESPONSE_PLACEHOLDER;
use crate::models::{FieldErrors, Inquiry, UpdateInquiryForm};

use super::{escape, field_error, layout, PageContext};

/// `/inquiries/mine` link for a requester.
pub fn requester_url(email: &str) -> String {
    if email.trim().is_empty() {
        return String::from("/inquiries/mine");
    }
    format!(
        "/inquiries/mine?email={}",
        utf8_percent_encode(email.trim(), NON_ALPHANUMERIC)
    )
}

fn answer_text(inquiry: &Inquiry) -> Option<&str> {
    inquiry
        .response
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty() && *text != NO_RESPONSE_PLACEHOLDER)
}

fn car_label(inquiry: &Inquiry) -> String {
    let label = format!("{} {}", inquiry.car_maker, inquiry.car_model);
    if label.trim().is_empty() {
        inquiry.car_id.to_string()
    } else {
        label.trim().to_string()
    }
}

fn received(inquiry: &Inquiry) -> String {
    inquiry
        .created_at
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

pub fn admin_list(ctx: &PageContext, inquiries: &[Inquiry]) -> String {
    let rows = if inquiries.is_empty() {
        String::from(r#"<p class="text-muted">No inquiries yet.</p>"#)
    } else {
        inquiries
            .iter()
            .map(admin_card)
            .collect::<Vec<_>>()
            .join("\n")
    };
    let content = format!(
        r##"<h1 class="h3 mb-3">Inquiries</h1>
{rows}"##
    );
    layout("Inquiries", ctx, &content)
}

fn admin_card(inquiry: &Inquiry) -> String {
    let answer = answer_text(inquiry);
    let response_block = match answer {
        Some(text) => format!(
            r##"<div class="alert alert-secondary mb-2"><strong>Response:</strong> {text}</div>
        <form method="post" action="/inquiries/{id}/delete-response" class="d-inline">
            <button type="submit" class="btn btn-sm btn-outline-warning">Remove response</button>
        </form>
        <form method="post" action="/inquiries/{id}/delete" class="d-inline" onsubmit="return confirm('Delete this inquiry?');">
            <button type="submit" class="btn btn-sm btn-outline-danger">Delete inquiry</button>
        </form>"##,
            text = escape(text),
            id = inquiry.id,
        ),
        None => String::from(r#"<p class="text-muted mb-2">No response yet.</p>"#),
    };

    format!(
        r##"<div class="card mb-3 shadow-sm">
    <div class="card-body">
        <h2 class="h6 card-title">{car} &middot; {name} &lt;{email}&gt;</h2>
        <p class="small text-muted">{received}</p>
        <p>{message}</p>
        {response_block}
        <form method="post" action="/inquiries/{id}/reply" class="mt-2">
            <div class="input-group">
                <textarea class="form-control" name="response" maxlength="5000" rows="2" required>{current}</textarea>
                <button type="submit" class="btn btn-primary">Save response</button>
            </div>
        </form>
    </div>
</div>"##,
        car = escape(&car_label(inquiry)),
        name = escape(&inquiry.name),
        email = escape(&inquiry.email),
        received = escape(&received(inquiry)),
        message = escape(&inquiry.message),
        current = escape(answer.unwrap_or("")),
        id = inquiry.id,
    )
}

/// Requester view: lookup form, plus the inquiries for `email` when given.
pub fn requester_page(ctx: &PageContext, email: &str, inquiries: &[Inquiry]) -> String {
    let results = if email.trim().is_empty() {
        String::new()
    } else if inquiries.is_empty() {
        String::from(r#"<p class="text-muted">No inquiries found for this email.</p>"#)
    } else {
        inquiries
            .iter()
            .map(|inquiry| requester_card(inquiry, email))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let content = format!(
        r##"<h1 class="h3 mb-3">My inquiries</h1>
<form method="get" action="/inquiries/mine" class="row g-2 mb-4">
    <div class="col-auto">
        <input class="form-control" name="email" type="email" placeholder="you@example.com" value="{email}" required>
    </div>
    <div class="col-auto">
        <button type="submit" class="btn btn-primary">Show</button>
    </div>
</form>
{results}"##,
        email = escape(email),
    );
    layout("My inquiries", ctx, &content)
}

fn requester_card(inquiry: &Inquiry, email: &str) -> String {
    let actions = match answer_text(inquiry) {
        Some(text) => format!(
            r#"<div class="alert alert-success mb-0"><strong>Our answer:</strong> {}</div>"#,
            escape(text)
        ),
        None => format!(
            r##"<a class="btn btn-sm btn-outline-secondary" href="/inquiries/{id}/edit?email={encoded}">Edit</a>
        <form method="post" action="/inquiries/{id}/delete-mine" class="d-inline" onsubmit="return confirm('Withdraw this inquiry?');">
            <input type="hidden" name="email" value="{email}">
            <button type="submit" class="btn btn-sm btn-outline-danger">Delete</button>
        </form>"##,
            id = inquiry.id,
            encoded = utf8_percent_encode(email, NON_ALPHANUMERIC),
            email = escape(email),
        ),
    };

    format!(
        r##"<div class="card mb-3 shadow-sm">
    <div class="card-body">
        <h2 class="h6 card-title">{car}</h2>
        <p class="small text-muted">{received}</p>
        <p>{message}</p>
        {actions}
    </div>
</div>"##,
        car = escape(&car_label(inquiry)),
        received = escape(&received(inquiry)),
        message = escape(&inquiry.message),
    )
}

pub fn edit_form(
    ctx: &PageContext,
    id: Uuid,
    form: &UpdateInquiryForm,
    errors: &FieldErrors,
) -> String {
    let content = format!(
        r##"<h1 class="h3 mb-3">Edit inquiry</h1>
<form method="post" action="/inquiries/{id}/edit">
    <div class="mb-3">
        <label class="form-label" for="name">Name</label>
        <input class="form-control" id="name" name="name" maxlength="100" value="{name}">
        {name_error}
    </div>
    <div class="mb-3">
        <label class="form-label" for="email">Email</label>
        <input class="form-control" id="email" name="email" type="email" value="{email}" required>
        {email_error}
    </div>
    <div class="mb-3">
        <label class="form-label" for="message">Message</label>
        <textarea class="form-control" id="message" name="message" maxlength="5000" rows="5">{message}</textarea>
        {message_error}
    </div>
    <button type="submit" class="btn btn-primary">Save</button>
    <a class="btn btn-link" href="{back}">Cancel</a>
</form>"##,
        name = escape(&form.name),
        email = escape(&form.email),
        message = escape(&form.message),
        name_error = field_error(errors, "name"),
        email_error = field_error(errors, "email"),
        message_error = field_error(errors, "message"),
        back = escape(&requester_url(&form.email)),
    );
    layout("Edit inquiry", ctx, &content)
}

#[cfg(test)]
mod tests {
    use super::requester_url;

    #[test]
    fn requester_url_encodes_email() {
        assert_eq!(requester_url(""), "/inquiries/mine");
        assert_eq!(
            requester_url("ana+cars@example.com"),
            "/inquiries/mine?email=ana%2Bcars%40example%2Ecom"
        );
    }
}
