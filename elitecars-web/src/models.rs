//! Transfer records exchanged with the backend and the form inputs that feed them.
//!
//! Records mirror the backend's camelCase JSON. Forms carry `validator` rules;
//! a form that fails validation is never forwarded.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

pub const MIN_YEAR: i32 = 1886;
pub const MAX_YEAR: i32 = 2100;
pub const MAX_PRICE: f64 = 999_999_999.99;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub make: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub price: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<CarImage>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Car {
    pub fn display_name(&self) -> String {
        format!("{} {} ({})", self.make, self.model, self.year)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarImage {
    pub id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
    /// Owning car; lookup only.
    #[serde(default)]
    pub car_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: Uuid,
    pub car_id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub car_maker: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub car_model: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// An uploaded image as received from the browser, forwarded as-is.
#[derive(Debug, Clone, Serialize)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct CreateCarForm {
    #[validate(length(min = 1, max = 50, message = "Make is required (max 50 characters)."))]
    pub make: String,
    #[validate(length(min = 1, max = 50, message = "Model is required (max 50 characters)."))]
    pub model: String,
    #[validate(
        required(message = "Year is required."),
        range(min = 1886, max = 2100, message = "Year must be between 1886 and 2100.")
    )]
    pub year: Option<i32>,
    #[validate(
        required(message = "Price is required."),
        range(min = 0.0, max = 999_999_999.99, message = "Price must be a positive value.")
    )]
    pub price: Option<f64>,
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Description is required (max 2000 characters)."
    ))]
    pub description: String,
    #[validate(custom(function = "at_least_one_image"))]
    pub images: Vec<ImageUpload>,
}

fn at_least_one_image(images: &[ImageUpload]) -> Result<(), ValidationError> {
    if images.is_empty() {
        return Err(ValidationError::new("images")
            .with_message("At least one image is required.".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateCarForm {
    #[validate(length(max = 50, message = "Make cannot be longer than 50 characters."))]
    pub make: Option<String>,
    #[validate(length(max = 50, message = "Model cannot be longer than 50 characters."))]
    pub model: Option<String>,
    #[validate(range(min = 1886, max = 2100, message = "Year must be between 1886 and 2100."))]
    pub year: Option<i32>,
    #[validate(range(min = 0.0, max = 999_999_999.99, message = "Price must be a positive value."))]
    pub price: Option<f64>,
    #[validate(length(max = 2000, message = "Description cannot be longer than 2000 characters."))]
    pub description: Option<String>,
    pub images: Vec<ImageUpload>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInquiryForm {
    pub car_id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Name is required (max 100 characters)."))]
    pub name: String,
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(min = 1, max = 5000, message = "Message is required (max 5000 characters)."))]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateInquiryForm {
    #[serde(default)]
    #[validate(length(max = 100, message = "Name cannot be longer than 100 characters."))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 5000, message = "Message cannot be longer than 5000 characters."))]
    pub message: String,
}

impl UpdateInquiryForm {
    pub fn from_inquiry(inquiry: &Inquiry) -> Self {
        Self {
            name: inquiry.name.clone(),
            email: inquiry.email.clone(),
            message: inquiry.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReplyForm {
    #[validate(length(min = 1, max = 5000, message = "Response is required (max 5000 characters)."))]
    pub response: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "returnUrl")]
    pub return_url: Option<String>,
}

/// Field name to first error message, for re-rendering forms.
pub type FieldErrors = BTreeMap<String, String>;

pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, list) in errors.field_errors() {
        let Some(first) = list.first() else {
            continue;
        };
        let message = first
            .message
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| format!("{field} is invalid."));
        out.insert(field.to_string(), message);
    }
    out
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The backend emits both offset-qualified and naive (implicitly UTC) timestamps.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use anyhow::Result;
    use bytes::Bytes;
    use chrono::{Datelike, Timelike};
    use uuid::Uuid;
    use validator::Validate;

    use super::{
        field_errors, timestamp, Car, CreateCarForm, CreateInquiryForm, ImageUpload, Inquiry,
        UpdateCarForm,
    };

    fn image() -> ImageUpload {
        ImageUpload {
            file_name: String::from("front.jpg"),
            content_type: String::from("image/jpeg"),
            data: Bytes::from_static(b"jpeg"),
        }
    }

    fn valid_car_form() -> CreateCarForm {
        CreateCarForm {
            make: String::from("Porsche"),
            model: String::from("911"),
            year: Some(1999),
            price: Some(42_000.0),
            description: String::from("Guards red, manual."),
            images: vec![image()],
        }
    }

    #[test]
    fn car_deserializes_with_null_images_and_naive_timestamp() -> Result<()> {
        let car: Car = serde_json::from_str(
            r#"{"id":"6a1d3f3e-8a53-4d3b-9f6e-0d7c2b1e5a10","make":"Audi","model":"A4","year":2010,"price":9500.5,"description":null,"images":null,"createdAt":"2024-03-01T10:20:30.123"}"#,
        )?;
        assert!(car.images.is_empty());
        assert_eq!(car.description, "");
        let created = car.created_at.expect("timestamp parsed");
        assert_eq!(created.year(), 2024);
        assert_eq!(created.hour(), 10);
        Ok(())
    }

    #[test]
    fn inquiry_keeps_missing_response_as_none() -> Result<()> {
        let inquiry: Inquiry = serde_json::from_str(
            r#"{"id":"6a1d3f3e-8a53-4d3b-9f6e-0d7c2b1e5a10","carId":"0f8fad5b-d9cb-469f-a165-70867728950e","name":"Ana","email":"ana@example.com","message":"Still available?","createdAt":"2024-03-01T10:20:30Z"}"#,
        )?;
        assert!(inquiry.response.is_none());
        assert_eq!(inquiry.car_maker, "");
        Ok(())
    }

    #[test]
    fn offset_timestamps_are_normalized_to_utc() {
        let parsed = timestamp::parse("2024-03-01T12:00:00+02:00").unwrap();
        assert_eq!(parsed.hour(), 10);
        assert!(timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn create_car_form_requires_an_image() {
        let mut form = valid_car_form();
        assert!(form.validate().is_ok());

        form.images.clear();
        let errors = form.validate().unwrap_err();
        let messages = field_errors(&errors);
        assert_eq!(
            messages.get("images").map(String::as_str),
            Some("At least one image is required.")
        );
    }

    #[test]
    fn create_car_form_enforces_year_and_price_bounds() {
        let mut form = valid_car_form();
        form.year = Some(1885);
        form.price = Some(-1.0);
        let messages = field_errors(&form.validate().unwrap_err());
        assert!(messages.contains_key("year"));
        assert!(messages.contains_key("price"));

        form.year = Some(2100);
        form.price = Some(0.0);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn create_car_form_requires_year() {
        let mut form = valid_car_form();
        form.year = None;
        let messages = field_errors(&form.validate().unwrap_err());
        assert_eq!(messages.get("year").map(String::as_str), Some("Year is required."));
    }

    #[test]
    fn update_car_form_allows_missing_fields() {
        assert!(UpdateCarForm::default().validate().is_ok());
        let form = UpdateCarForm {
            make: Some("x".repeat(51)),
            ..Default::default()
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn inquiry_form_rejects_bad_email() {
        let form = CreateInquiryForm {
            car_id: Uuid::new_v4(),
            name: String::from("Ana"),
            email: String::from("not-an-email"),
            message: String::from("Hello"),
        };
        let messages = field_errors(&form.validate().unwrap_err());
        assert!(messages.contains_key("email"));
    }
}
