use reqwest::multipart::{Form, Part};
use reqwest::Method;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Car, CreateCarForm, ImageUpload, UpdateCarForm};

use super::{read_json, read_list, send, BackendCredential, BackendResult, Endpoint};

const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct CarApiClient {
    endpoint: Endpoint,
}

impl CarApiClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            endpoint: Endpoint::new(http, base_url, "cars"),
        }
    }

    pub async fn list(&self) -> BackendResult<Vec<Car>> {
        let response = send(self.endpoint.request(
            Method::GET,
            "getAll",
            &BackendCredential::anonymous(),
        ))
        .await?;
        let cars: Vec<Car> = read_list(response).await?;
        debug!(cars = cars.len(), "cars listed");
        Ok(cars)
    }

    pub async fn get(&self, id: Uuid) -> BackendResult<Car> {
        let response = send(self.endpoint.request(
            Method::GET,
            &id.to_string(),
            &BackendCredential::anonymous(),
        ))
        .await?;
        read_json(response).await
    }

    pub async fn create(
        &self,
        car: &CreateCarForm,
        credential: &BackendCredential,
    ) -> BackendResult<()> {
        let mut form = Form::new()
            .text("Make", car.make.clone())
            .text("Model", car.model.clone())
            .text("Year", car.year.map(|y| y.to_string()).unwrap_or_default())
            .text("Price", car.price.map(|p| p.to_string()).unwrap_or_default())
            .text("Description", car.description.clone());
        for image in &car.images {
            form = form.part("Images", image_part(image));
        }

        send(
            self.endpoint
                .request(Method::POST, "CreateCar", credential)
                .multipart(form),
        )
        .await?;
        info!(make = %car.make, model = %car.model, images = car.images.len(), "car created");
        Ok(())
    }

    pub async fn update(
        &self,
        id: Uuid,
        car: &UpdateCarForm,
        credential: &BackendCredential,
    ) -> BackendResult<()> {
        let mut form = Form::new()
            .text("Make", car.make.clone().unwrap_or_default())
            .text("Model", car.model.clone().unwrap_or_default())
            .text("Year", car.year.map(|y| y.to_string()).unwrap_or_default())
            .text("Price", car.price.map(|p| p.to_string()).unwrap_or_default())
            .text("Description", car.description.clone().unwrap_or_default());
        for image in &car.images {
            form = form.part("Images", image_part(image));
        }

        send(
            self.endpoint
                .request(Method::PUT, &format!("{id}/updateCar"), credential)
                .multipart(form),
        )
        .await?;
        info!(car_id = %id, images = car.images.len(), "car updated");
        Ok(())
    }

    pub async fn delete(&self, id: Uuid, credential: &BackendCredential) -> BackendResult<()> {
        send(
            self.endpoint
                .request(Method::DELETE, &format!("{id}/deleteCar"), credential),
        )
        .await?;
        info!(car_id = %id, "car deleted");
        Ok(())
    }

    /// Removes one image and returns the car as the backend now sees it.
    pub async fn delete_image(
        &self,
        car_id: Uuid,
        image_id: Uuid,
        credential: &BackendCredential,
    ) -> BackendResult<Car> {
        let response = send(self.endpoint.request(
            Method::DELETE,
            &format!("{car_id}/carImage/{image_id}"),
            credential,
        ))
        .await?;
        info!(car_id = %car_id, image_id = %image_id, "car image deleted");
        read_json(response).await
    }
}

/// A content type reqwest refuses is sent as `application/octet-stream`.
fn image_part(image: &ImageUpload) -> Part {
    let part = || Part::bytes(image.data.to_vec()).file_name(image.file_name.clone());
    part().mime_str(&image.content_type).unwrap_or_else(|error| {
        debug!(content_type = %image.content_type, error = %error, "unusable image content type");
        part()
            .mime_str(OCTET_STREAM)
            .unwrap_or_else(|_| part())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::{delete, get, post, put};
    use axum::{Json, Router};
    use bytes::Bytes;
    use serde_json::json;
    use uuid::Uuid;

    use super::CarApiClient;
    use crate::backend::test_support::spawn;
    use crate::backend::BackendCredential;
    use crate::models::{CreateCarForm, ImageUpload, UpdateCarForm};

    const CAR_ID: &str = "6a1d3f3e-8a53-4d3b-9f6e-0d7c2b1e5a10";

    fn car_json() -> serde_json::Value {
        json!({
            "id": CAR_ID,
            "make": "Porsche",
            "model": "911",
            "year": 1999,
            "price": 42000.0,
            "description": "Guards red",
            "images": [{ "id": "0f8fad5b-d9cb-469f-a165-70867728950e", "imageUrl": "/uploads/911.jpg", "carId": CAR_ID }],
            "createdAt": "2024-03-01T10:20:30Z"
        })
    }

    #[tokio::test]
    async fn list_treats_null_body_as_empty() {
        let backend = spawn(Router::new().route("/api/cars/getAll", get(|| async { "null" }))).await;
        let client = CarApiClient::new(backend.http(), &backend.base_url);

        let cars = client.list().await.unwrap();

        assert!(cars.is_empty());
    }

    #[tokio::test]
    async fn get_decodes_car_with_images() {
        let backend = spawn(Router::new().route(
            "/api/cars/{id}",
            get(|Path(id): Path<String>| async move {
                assert_eq!(id, CAR_ID);
                Json(car_json())
            }),
        ))
        .await;
        let client = CarApiClient::new(backend.http(), &backend.base_url);

        let car = client.get(CAR_ID.parse().unwrap()).await.unwrap();

        assert_eq!(car.make, "Porsche");
        assert_eq!(car.images.len(), 1);
        assert_eq!(car.images[0].image_url, "/uploads/911.jpg");
    }

    #[tokio::test]
    async fn not_found_message_comes_from_body() {
        let backend = spawn(Router::new().route(
            "/api/cars/{id}",
            get(|| async {
                (StatusCode::NOT_FOUND, Json(json!({ "message": "Car not found." }))).into_response()
            }),
        ))
        .await;
        let client = CarApiClient::new(backend.http(), &backend.base_url);

        let error = client.get(Uuid::new_v4()).await.unwrap_err();

        assert_eq!(error.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(error.to_string(), "Car not found.");
    }

    #[tokio::test]
    async fn create_sends_multipart_with_images_and_credential() {
        let backend = spawn(Router::new().route(
            "/api/cars/CreateCar",
            post(|| async { StatusCode::CREATED }),
        ))
        .await;
        let client = CarApiClient::new(backend.http(), &backend.base_url);
        let form = CreateCarForm {
            make: String::from("Porsche"),
            model: String::from("911"),
            year: Some(1999),
            price: Some(42000.0),
            description: String::from("Guards red"),
            images: vec![ImageUpload {
                file_name: String::from("front.jpg"),
                content_type: String::from("image/jpeg"),
                data: Bytes::from_static(b"jpeg-bytes"),
            }],
        };
        let credential = BackendCredential::anonymous().with_cookie(".AspNetCore.Session", "tok");

        client.create(&form, &credential).await.unwrap();

        let call = backend.recorder.last().unwrap();
        assert_eq!(call.cookie.as_deref(), Some(".AspNetCore.Session=tok"));
        assert!(call.body.contains("name=\"Make\""));
        assert!(call.body.contains("name=\"Year\""));
        assert!(call.body.contains("1999"));
        assert!(call.body.contains("filename=\"front.jpg\""));
        assert!(call.body.contains("jpeg-bytes"));
    }

    #[tokio::test]
    async fn unusable_content_type_is_sent_as_octet_stream() {
        let backend = spawn(Router::new().route(
            "/api/cars/{id}/updateCar",
            put(|| async { StatusCode::NO_CONTENT }),
        ))
        .await;
        let client = CarApiClient::new(backend.http(), &backend.base_url);
        let form = UpdateCarForm {
            images: vec![ImageUpload {
                file_name: String::from("side.jpg"),
                content_type: String::from("not a content type"),
                data: Bytes::from_static(b"side-bytes"),
            }],
            ..Default::default()
        };

        client
            .update(Uuid::new_v4(), &form, &BackendCredential::anonymous())
            .await
            .unwrap();

        let call = backend.recorder.last().unwrap();
        assert_eq!(call.method, "PUT");
        assert!(call.body.contains("filename=\"side.jpg\""));
        assert!(call.body.contains("application/octet-stream"));
        assert!(call.body.contains("side-bytes"));
    }

    #[tokio::test]
    async fn delete_image_returns_updated_car() {
        let backend = spawn(Router::new().route(
            "/api/cars/{car_id}/carImage/{image_id}",
            delete(|| async {
                let mut car = car_json();
                car["images"] = json!([]);
                Json(car)
            }),
        ))
        .await;
        let client = CarApiClient::new(backend.http(), &backend.base_url);

        let car = client
            .delete_image(
                CAR_ID.parse().unwrap(),
                Uuid::new_v4(),
                &BackendCredential::anonymous(),
            )
            .await
            .unwrap();

        assert!(car.images.is_empty());
        let call = backend.recorder.last().unwrap();
        assert_eq!(call.method, "DELETE");
        assert!(call.path.starts_with(&format!("/api/cars/{CAR_ID}/carImage/")));
    }

    #[tokio::test]
    async fn validation_problem_is_joined() {
        let backend = spawn(Router::new().route(
            "/api/cars/{id}/deleteCar",
            delete(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "errors": { "Id": ["Car is referenced by inquiries."] } })),
                )
                    .into_response()
            }),
        ))
        .await;
        let client = CarApiClient::new(backend.http(), &backend.base_url);

        let error = client
            .delete(Uuid::new_v4(), &BackendCredential::anonymous())
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "Car is referenced by inquiries.");
    }
}
