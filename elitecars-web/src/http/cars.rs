use std::str::FromStr;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use tracing::{debug, warn};
use uuid::Uuid;
use validator::Validate;

use crate::backend::{BackendCredential, BackendError};
use crate::models::{
    field_errors, Car, CreateCarForm, FieldErrors, ImageUpload, UpdateCarForm,
};
use crate::session::Flash;
use crate::views;
use crate::views::cars::{CarFormValues, EditPage};

use super::error::AppError;
use super::failure_text;
use super::state::AppState;

/// A car form as posted: raw field text plus every non-empty file part.
#[derive(Debug, Default)]
struct CarSubmission {
    values: CarFormValues,
    images: Vec<ImageUpload>,
}

async fn read_submission(mut multipart: Multipart) -> Result<CarSubmission, AppError> {
    let mut submission = CarSubmission::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_ascii_lowercase();
        match name.as_str() {
            "images" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let declared = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                // An untouched file input still posts one empty part.
                if data.is_empty() {
                    continue;
                }
                let content_type = declared
                    .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
                    .unwrap_or_else(|| {
                        mime_guess::from_path(&file_name)
                            .first_or_octet_stream()
                            .to_string()
                    });
                submission.images.push(ImageUpload {
                    file_name,
                    content_type,
                    data,
                });
            }
            "make" => submission.values.make = field.text().await?,
            "model" => submission.values.model = field.text().await?,
            "year" => submission.values.year = field.text().await?,
            "price" => submission.values.price = field.text().await?,
            "description" => submission.values.description = field.text().await?,
            _ => {}
        }
    }
    Ok(submission)
}

/// Blank input is `None`; text that does not parse records `message` for `field`.
fn parse_number<T: FromStr>(
    raw: &str,
    field: &str,
    message: &str,
    errors: &mut FieldErrors,
) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.insert(field.to_string(), message.to_string());
            None
        }
    }
}

fn parse_year_and_price(values: &CarFormValues, errors: &mut FieldErrors) -> (Option<i32>, Option<f64>) {
    let year = parse_number::<i32>(&values.year, "year", "Year must be a whole number.", errors);
    let price = parse_number::<f64>(&values.price, "price", "Price must be a number.", errors)
        .filter(|price| {
            let finite = price.is_finite();
            if !finite {
                errors.insert(String::from("price"), String::from("Price must be a number."));
            }
            finite
        });
    (year, price)
}

fn merge_validation(result: Result<(), validator::ValidationErrors>, errors: &mut FieldErrors) {
    if let Err(failed) = result {
        for (field, message) in field_errors(&failed) {
            errors.entry(field).or_insert(message);
        }
    }
}

fn validate_create(submission: CarSubmission) -> Result<CreateCarForm, (CarFormValues, FieldErrors)> {
    let mut errors = FieldErrors::new();
    let (year, price) = parse_year_and_price(&submission.values, &mut errors);
    let values = submission.values;
    let form = CreateCarForm {
        make: values.make.trim().to_string(),
        model: values.model.trim().to_string(),
        year,
        price,
        description: values.description.trim().to_string(),
        images: submission.images,
    };
    merge_validation(form.validate(), &mut errors);
    if errors.is_empty() {
        Ok(form)
    } else {
        Err((values, errors))
    }
}

fn optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn validate_update(submission: CarSubmission) -> Result<UpdateCarForm, (CarFormValues, FieldErrors)> {
    let mut errors = FieldErrors::new();
    let (year, price) = parse_year_and_price(&submission.values, &mut errors);
    let values = submission.values;
    let form = UpdateCarForm {
        make: optional_text(&values.make),
        model: optional_text(&values.model),
        year,
        price,
        description: optional_text(&values.description),
        images: submission.images,
    };
    merge_validation(form.validate(), &mut errors);
    if errors.is_empty() {
        Ok(form)
    } else {
        Err((values, errors))
    }
}

fn not_found_text(error: &BackendError) -> String {
    if error.status() == Some(StatusCode::NOT_FOUND) {
        String::from("Car not found.")
    } else {
        failure_text(error, "Car not found.")
    }
}

pub async fn list(State(state): State<AppState>, jar: CookieJar) -> Html<String> {
    let ctx = state.page_context(&jar);
    let (ctx, cars) = match state.cars.list().await {
        Ok(cars) => (ctx, cars),
        Err(error) => (
            ctx.with_flash(Flash::error(failure_text(&error, "Failed to load cars."))),
            Vec::new(),
        ),
    };
    debug!(cars = cars.len(), "car list rendered");
    Html(views::cars::list(&ctx, &cars, &state.api_base_url))
}

pub async fn details(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Response {
    match state.cars.get(id).await {
        Ok(car) => {
            let draft = state.sessions.take_draft(&jar, id);
            let ctx = state.page_context(&jar);
            Html(views::cars::details(&ctx, &car, &state.api_base_url, draft.as_ref()))
                .into_response()
        }
        Err(error) => {
            warn!(car_id = %id, error = %error, "car details unavailable");
            let jar = state.flash(jar, Flash::error(not_found_text(&error)));
            (jar, Redirect::to("/cars")).into_response()
        }
    }
}

pub async fn create_page(State(state): State<AppState>, jar: CookieJar) -> Html<String> {
    Html(views::cars::create_form(
        &state.page_context(&jar),
        &CarFormValues::default(),
        &FieldErrors::new(),
    ))
}

pub async fn create(
    State(state): State<AppState>,
    credential: BackendCredential,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let submission = read_submission(multipart).await?;
    let form = match validate_create(submission) {
        Ok(form) => form,
        Err((values, errors)) => {
            debug!(fields = errors.len(), "car form rejected");
            let ctx = state.page_context(&jar);
            let page = views::cars::create_form(&ctx, &values, &errors);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response());
        }
    };

    match state.cars.create(&form, &credential).await {
        Ok(()) => {
            let jar = state.flash(jar, Flash::success("Car added successfully!"));
            Ok((jar, Redirect::to("/cars")).into_response())
        }
        Err(error) => {
            let ctx = state
                .page_context(&jar)
                .with_flash(Flash::error(failure_text(&error, "Failed to add car.")));
            let values = CarFormValues {
                make: form.make,
                model: form.model,
                year: form.year.map(|y| y.to_string()).unwrap_or_default(),
                price: form.price.map(|p| p.to_string()).unwrap_or_default(),
                description: form.description,
            };
            let page = views::cars::create_form(&ctx, &values, &FieldErrors::new());
            Ok((StatusCode::BAD_GATEWAY, Html(page)).into_response())
        }
    }
}

pub async fn edit_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Response {
    match state.cars.get(id).await {
        Ok(car) => {
            let ctx = state.page_context(&jar);
            let page = EditPage {
                car: Some(&car),
                api_base_url: &state.api_base_url,
                redirect_to: None,
            };
            Html(views::cars::edit_form(
                &ctx,
                id,
                &CarFormValues::from(&car),
                &FieldErrors::new(),
                &page,
            ))
            .into_response()
        }
        Err(error) => {
            warn!(car_id = %id, error = %error, "car unavailable for editing");
            let jar = state.flash(jar, Flash::error(not_found_text(&error)));
            (jar, Redirect::to("/cars")).into_response()
        }
    }
}

/// Re-renders the edit page around the car's current images, if it still loads.
async fn render_edit(
    state: &AppState,
    ctx: &views::PageContext,
    id: Uuid,
    values: &CarFormValues,
    errors: &FieldErrors,
    redirect_to: Option<String>,
) -> String {
    let car: Option<Car> = state.cars.get(id).await.ok();
    let page = EditPage {
        car: car.as_ref(),
        api_base_url: &state.api_base_url,
        redirect_to,
    };
    views::cars::edit_form(ctx, id, values, errors, &page)
}

pub async fn update(
    State(state): State<AppState>,
    credential: BackendCredential,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let submission = read_submission(multipart).await?;
    let raw_values = submission.values.clone();
    let form = match validate_update(submission) {
        Ok(form) => form,
        Err((values, errors)) => {
            let ctx = state
                .page_context(&jar)
                .with_flash(Flash::error("Please fix the errors in the form."));
            let page = render_edit(&state, &ctx, id, &values, &errors, None).await;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response());
        }
    };

    let (ctx, status, redirect_to) = match state.cars.update(id, &form, &credential).await {
        Ok(()) => (
            state.page_context(&jar).with_flash(Flash::success(
                "Car updated successfully! Redirecting to details...",
            )),
            StatusCode::OK,
            Some(format!("/cars/{id}")),
        ),
        Err(error) => (
            state
                .page_context(&jar)
                .with_flash(Flash::error(failure_text(&error, "Failed to update car."))),
            StatusCode::BAD_GATEWAY,
            None,
        ),
    };
    let page = render_edit(&state, &ctx, id, &raw_values, &FieldErrors::new(), redirect_to).await;
    Ok((status, Html(page)).into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    credential: BackendCredential,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> (CookieJar, Redirect) {
    let flash = match state.cars.delete(id, &credential).await {
        Ok(()) => Flash::success("Car deleted successfully!"),
        Err(error) => Flash::error(failure_text(&error, "Failed to delete car.")),
    };
    (state.flash(jar, flash), Redirect::to("/cars"))
}

pub async fn delete_image(
    State(state): State<AppState>,
    credential: BackendCredential,
    jar: CookieJar,
    Path((car_id, image_id)): Path<(Uuid, Uuid)>,
) -> (CookieJar, Redirect) {
    let flash = match state.cars.delete_image(car_id, image_id, &credential).await {
        Ok(car) => {
            debug!(car_id = %car_id, remaining = car.images.len(), "image removed");
            Flash::success("Image deleted successfully!")
        }
        Err(error) => Flash::error(failure_text(&error, "Failed to delete image.")),
    };
    (state.flash(jar, flash), Redirect::to(&format!("/cars/{car_id}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::{parse_number, validate_create, validate_update, CarSubmission};
    use crate::models::FieldErrors;
    use crate::views::cars::CarFormValues;

    fn values(year: &str, price: &str) -> CarFormValues {
        CarFormValues {
            make: String::from("Audi"),
            model: String::from("A4"),
            year: year.to_string(),
            price: price.to_string(),
            description: String::from("Clean"),
        }
    }

    #[test]
    fn unparsable_numbers_keep_their_own_message() {
        let mut errors = FieldErrors::new();
        assert_eq!(parse_number::<i32>(" 2010 ", "year", "bad", &mut errors), Some(2010));
        assert_eq!(parse_number::<i32>("", "year", "bad", &mut errors), None);
        assert!(errors.is_empty());
        assert_eq!(parse_number::<i32>("twenty", "year", "bad", &mut errors), None);
        assert_eq!(errors.get("year").map(String::as_str), Some("bad"));
    }

    #[test]
    fn create_without_images_is_rejected() {
        let submission = CarSubmission {
            values: values("2010", "9500"),
            images: Vec::new(),
        };
        let (_, errors) = validate_create(submission).unwrap_err();
        assert_eq!(
            errors.get("images").map(String::as_str),
            Some("At least one image is required.")
        );
    }

    #[test]
    fn non_numeric_price_wins_over_required_message() {
        let submission = CarSubmission {
            values: values("2010", "NaN"),
            images: Vec::new(),
        };
        let (_, errors) = validate_create(submission).unwrap_err();
        assert_eq!(errors.get("price").map(String::as_str), Some("Price must be a number."));
    }

    #[test]
    fn update_accepts_blank_fields() {
        let submission = CarSubmission {
            values: CarFormValues::default(),
            images: Vec::new(),
        };
        let form = validate_update(submission).unwrap();
        assert!(form.make.is_none());
        assert!(form.year.is_none());
    }
}
