use uuid::Uuid;

use crate::models::{Car, FieldErrors, MAX_PRICE, MAX_YEAR, MIN_YEAR};
use crate::session::InquiryDraft;

use super::{escape, field_error, image_src, layout, PageContext};

/// Raw form input, kept as typed so invalid values re-render unchanged.
#[derive(Debug, Clone, Default)]
pub struct CarFormValues {
    pub make: String,
    pub model: String,
    pub year: String,
    pub price: String,
    pub description: String,
}

impl From<&Car> for CarFormValues {
    fn from(car: &Car) -> Self {
        Self {
            make: car.make.clone(),
            model: car.model.clone(),
            year: car.year.to_string(),
            price: car.price.to_string(),
            description: car.description.clone(),
        }
    }
}

pub fn list(ctx: &PageContext, cars: &[Car], api_base_url: &str) -> String {
    let cards = if cars.is_empty() {
        String::from(r#"<p class="text-muted">No cars listed yet.</p>"#)
    } else {
        cars.iter()
            .map(|car| car_card(ctx, car, api_base_url))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let add_button = if ctx.is_admin {
        r#"<a class="btn btn-success" href="/cars/create">Add car</a>"#
    } else {
        ""
    };

    let content = format!(
        r##"<div class="d-flex justify-content-between align-items-center mb-3">
    <h1 class="h3 m-0">Cars</h1>
    {add_button}
</div>
<div class="row row-cols-1 row-cols-md-3 g-4">
{cards}
</div>"##
    );
    layout("Cars", ctx, &content)
}

fn car_card(ctx: &PageContext, car: &Car, api_base_url: &str) -> String {
    let cover = car
        .images
        .first()
        .map(|image| {
            format!(
                r#"<img class="card-img-top" src="{}" alt="{}">"#,
                escape(&image_src(api_base_url, &image.image_url)),
                escape(&car.display_name())
            )
        })
        .unwrap_or_default();

    let admin_actions = if ctx.is_admin {
        format!(
            r##"<a class="btn btn-sm btn-outline-secondary" href="/cars/{id}/edit">Edit</a>
            <form method="post" action="/cars/{id}/delete" class="d-inline" onsubmit="return confirm('Delete this car?');">
                <button type="submit" class="btn btn-sm btn-outline-danger">Delete</button>
            </form>"##,
            id = car.id
        )
    } else {
        String::new()
    };

    format!(
        r##"<div class="col">
    <div class="card h-100 shadow-sm">
        {cover}
        <div class="card-body">
            <h2 class="h5 card-title">{name}</h2>
            <p class="card-text fw-bold">{price}</p>
        </div>
        <div class="card-footer bg-white">
            <a class="btn btn-sm btn-primary" href="/cars/{id}">Details</a>
            {admin_actions}
        </div>
    </div>
</div>"##,
        name = escape(&car.display_name()),
        price = format_price(car.price),
        id = car.id,
    )
}

pub fn details(
    ctx: &PageContext,
    car: &Car,
    api_base_url: &str,
    draft: Option<&InquiryDraft>,
) -> String {
    let gallery = car
        .images
        .iter()
        .map(|image| {
            let delete = if ctx.is_admin {
                format!(
                    r##"<form method="post" action="/cars/{car_id}/images/{image_id}/delete" class="mt-1">
                    <button type="submit" class="btn btn-sm btn-outline-danger">Remove image</button>
                </form>"##,
                    car_id = car.id,
                    image_id = image.id
                )
            } else {
                String::new()
            };
            format!(
                r#"<div class="col-md-4"><img class="img-fluid rounded" src="{}" alt="">{delete}</div>"#,
                escape(&image_src(api_base_url, &image.image_url))
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let listed = car
        .created_at
        .map(|at| format!("Listed {}", at.format("%Y-%m-%d")))
        .unwrap_or_default();

    let admin_actions = if ctx.is_admin {
        format!(
            r#"<a class="btn btn-outline-secondary" href="/cars/{}/edit">Edit</a>"#,
            car.id
        )
    } else {
        String::new()
    };

    let content = format!(
        r##"<h1 class="h3">{name}</h1>
<p class="text-muted">{listed}</p>
<div class="row g-3 mb-3">
{gallery}
</div>
<p class="fs-4 fw-bold">{price}</p>
<p>{description}</p>
{admin_actions}
{inquiry}"##,
        name = escape(&car.display_name()),
        price = format_price(car.price),
        description = escape(&car.description),
        inquiry = inquiry_form(car.id, draft),
    );
    layout(&car.display_name(), ctx, &content)
}

fn inquiry_form(car_id: Uuid, draft: Option<&InquiryDraft>) -> String {
    let (name, email, message) = draft
        .map(|d| (d.name.as_str(), d.email.as_str(), d.message.as_str()))
        .unwrap_or(("", "", ""));
    let open = if draft.is_some() { " open" } else { "" };

    format!(
        r##"<details class="mt-4"{open}>
    <summary class="btn btn-outline-primary">Ask about this car</summary>
    <form method="post" action="/inquiries" class="mt-3">
        <input type="hidden" name="car_id" value="{car_id}">
        <div class="mb-3">
            <label class="form-label" for="inquiry-name">Name</label>
            <input class="form-control" id="inquiry-name" name="name" maxlength="100" value="{name}" required>
        </div>
        <div class="mb-3">
            <label class="form-label" for="inquiry-email">Email</label>
            <input class="form-control" id="inquiry-email" name="email" type="email" value="{email}" required>
        </div>
        <div class="mb-3">
            <label class="form-label" for="inquiry-message">Message</label>
            <textarea class="form-control" id="inquiry-message" name="message" maxlength="5000" rows="4" required>{message}</textarea>
        </div>
        <button type="submit" class="btn btn-primary">Send inquiry</button>
    </form>
</details>"##,
        name = escape(name),
        email = escape(email),
        message = escape(message),
    )
}

pub fn create_form(ctx: &PageContext, values: &CarFormValues, errors: &FieldErrors) -> String {
    let content = format!(
        r##"<h1 class="h3 mb-3">Add car</h1>
<form method="post" action="/cars/create" enctype="multipart/form-data">
    {fields}
    <div class="mb-3">
        <label class="form-label" for="images">Images</label>
        <input class="form-control" id="images" name="images" type="file" accept="image/*" multiple>
        {images_error}
    </div>
    <button type="submit" class="btn btn-success">Save</button>
    <a class="btn btn-link" href="/cars">Cancel</a>
</form>"##,
        fields = car_fields(values, errors),
        images_error = field_error(errors, "images"),
    );
    layout("Add car", ctx, &content)
}

/// Edit page state beyond the form values themselves.
#[derive(Debug, Default)]
pub struct EditPage<'a> {
    pub car: Option<&'a Car>,
    pub api_base_url: &'a str,
    /// Set after a successful update; the page forwards there shortly.
    pub redirect_to: Option<String>,
}

pub fn edit_form(
    ctx: &PageContext,
    id: Uuid,
    values: &CarFormValues,
    errors: &FieldErrors,
    page: &EditPage<'_>,
) -> String {
    let existing = page
        .car
        .map(|car| {
            car.images
                .iter()
                .map(|image| {
                    format!(
                        r##"<div class="col-md-3">
            <img class="img-fluid rounded" src="{src}" alt="">
            <button type="submit" form="remove-{image_id}" class="btn btn-sm btn-outline-danger mt-1">Remove</button>
        </div>"##,
                        src = escape(&image_src(page.api_base_url, &image.image_url)),
                        image_id = image.id,
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    // Nested forms are invalid HTML; removal buttons target these via `form=`.
    let removal_forms = page
        .car
        .map(|car| {
            car.images
                .iter()
                .map(|image| {
                    format!(
                        r#"<form id="remove-{image_id}" method="post" action="/cars/{car_id}/images/{image_id}/delete"></form>"#,
                        car_id = car.id,
                        image_id = image.id,
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    let refresh = page
        .redirect_to
        .as_deref()
        .map(|url| {
            format!(
                r#"<meta http-equiv="refresh" content="2;url={}">"#,
                escape(url)
            )
        })
        .unwrap_or_default();

    let content = format!(
        r##"{refresh}
<h1 class="h3 mb-3">Edit car</h1>
<form method="post" action="/cars/{id}/edit" enctype="multipart/form-data">
    {fields}
    <div class="row g-3 mb-3">
    {existing}
    </div>
    <div class="mb-3">
        <label class="form-label" for="images">Add images</label>
        <input class="form-control" id="images" name="images" type="file" accept="image/*" multiple>
    </div>
    <button type="submit" class="btn btn-primary">Save changes</button>
    <a class="btn btn-link" href="/cars/{id}">Back to details</a>
</form>
{removal_forms}"##,
        fields = car_fields(values, errors),
    );
    layout("Edit car", ctx, &content)
}

fn car_fields(values: &CarFormValues, errors: &FieldErrors) -> String {
    format!(
        r##"<div class="row g-3">
        <div class="col-md-6">
            <label class="form-label" for="make">Make</label>
            <input class="form-control" id="make" name="make" maxlength="50" value="{make}">
            {make_error}
        </div>
        <div class="col-md-6">
            <label class="form-label" for="model">Model</label>
            <input class="form-control" id="model" name="model" maxlength="50" value="{model}">
            {model_error}
        </div>
        <div class="col-md-6">
            <label class="form-label" for="year">Year</label>
            <input class="form-control" id="year" name="year" type="number" min="{min_year}" max="{max_year}" value="{year}">
            {year_error}
        </div>
        <div class="col-md-6">
            <label class="form-label" for="price">Price</label>
            <input class="form-control" id="price" name="price" type="number" step="0.01" min="0" max="{max_price}" value="{price}">
            {price_error}
        </div>
        <div class="col-12 mb-3">
            <label class="form-label" for="description">Description</label>
            <textarea class="form-control" id="description" name="description" maxlength="2000" rows="5">{description}</textarea>
            {description_error}
        </div>
    </div>"##,
        make = escape(&values.make),
        model = escape(&values.model),
        year = escape(&values.year),
        price = escape(&values.price),
        description = escape(&values.description),
        make_error = field_error(errors, "make"),
        model_error = field_error(errors, "model"),
        year_error = field_error(errors, "year"),
        price_error = field_error(errors, "price"),
        description_error = field_error(errors, "description"),
        min_year = MIN_YEAR,
        max_year = MAX_YEAR,
        max_price = MAX_PRICE,
    )
}

fn format_price(price: f64) -> String {
    let total_cents = (price.max(0.0) * 100.0).round() as u64;
    let cents = total_cents % 100;
    let digits = (total_cents / 100).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${grouped}.{cents:02}")
}
