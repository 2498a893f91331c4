use chrono::{SecondsFormat, Utc};
use reqwest::multipart::Form;
use reqwest::Method;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{CreateInquiryForm, Inquiry, UpdateInquiryForm};

use super::{read_json, read_list, send, BackendCredential, BackendResult, Endpoint};

#[derive(Debug, Clone)]
pub struct InquiryApiClient {
    endpoint: Endpoint,
}

impl InquiryApiClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            endpoint: Endpoint::new(http, base_url, "inquiries"),
        }
    }

    pub async fn list(&self, credential: &BackendCredential) -> BackendResult<Vec<Inquiry>> {
        let response = send(
            self.endpoint
                .request(Method::GET, "getAllInquiry", credential),
        )
        .await?;
        let inquiries: Vec<Inquiry> = read_list(response).await?;
        debug!(inquiries = inquiries.len(), "inquiries listed");
        Ok(inquiries)
    }

    pub async fn get(&self, id: Uuid, credential: &BackendCredential) -> BackendResult<Inquiry> {
        let response = send(
            self.endpoint
                .request(Method::GET, &id.to_string(), credential),
        )
        .await?;
        read_json(response).await
    }

    /// A blank email yields no inquiries without a backend round trip.
    pub async fn list_by_email(&self, email: &str) -> BackendResult<Vec<Inquiry>> {
        let email = email.trim();
        if email.is_empty() {
            return Ok(Vec::new());
        }
        let response = send(
            self.endpoint
                .request(Method::GET, "byEmail", &BackendCredential::anonymous())
                .query(&[("email", email)]),
        )
        .await?;
        read_list(response).await
    }

    pub async fn create(&self, inquiry: &CreateInquiryForm) -> BackendResult<Inquiry> {
        let form = Form::new()
            .text("CarId", inquiry.car_id.to_string())
            .text("Name", inquiry.name.clone())
            .text("Email", inquiry.email.clone())
            .text("Message", inquiry.message.clone())
            .text(
                "CreatedAt",
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            );

        let response = send(
            self.endpoint
                .request(Method::POST, "createInquiry", &BackendCredential::anonymous())
                .multipart(form),
        )
        .await?;
        info!(car_id = %inquiry.car_id, "inquiry created");
        read_json(response).await
    }

    pub async fn reply(
        &self,
        id: Uuid,
        response_text: &str,
        credential: &BackendCredential,
    ) -> BackendResult<Inquiry> {
        let form = Form::new().text("response", response_text.to_string());
        let response = send(
            self.endpoint
                .request(Method::PUT, &format!("{id}/replyInquiry"), credential)
                .multipart(form),
        )
        .await?;
        info!(inquiry_id = %id, "inquiry answered");
        read_json(response).await
    }

    pub async fn delete_response(
        &self,
        id: Uuid,
        credential: &BackendCredential,
    ) -> BackendResult<Inquiry> {
        let response = send(self.endpoint.request(
            Method::PUT,
            &format!("{id}/deleteInquiryResponse"),
            credential,
        ))
        .await?;
        info!(inquiry_id = %id, "inquiry response removed");
        read_json(response).await
    }

    /// Admin deletion.
    pub async fn delete(&self, id: Uuid, credential: &BackendCredential) -> BackendResult<()> {
        send(
            self.endpoint
                .request(Method::DELETE, &format!("{id}/deleteInquiry"), credential),
        )
        .await?;
        info!(inquiry_id = %id, "inquiry deleted by admin");
        Ok(())
    }

    pub async fn update_by_requester(
        &self,
        id: Uuid,
        inquiry: &UpdateInquiryForm,
    ) -> BackendResult<Inquiry> {
        let form = Form::new()
            .text("Name", inquiry.name.clone())
            .text("Email", inquiry.email.clone())
            .text("Message", inquiry.message.clone());
        let response = send(
            self.endpoint
                .request(
                    Method::PUT,
                    &format!("{id}/updateUserInquiry"),
                    &BackendCredential::anonymous(),
                )
                .multipart(form),
        )
        .await?;
        info!(inquiry_id = %id, "inquiry updated by requester");
        read_json(response).await
    }

    pub async fn delete_by_requester(&self, id: Uuid, email: &str) -> BackendResult<()> {
        send(
            self.endpoint
                .request(
                    Method::DELETE,
                    &format!("{id}/deleteUserInquiry"),
                    &BackendCredential::anonymous(),
                )
                .query(&[("userEmail", email)]),
        )
        .await?;
        info!(inquiry_id = %id, "inquiry deleted by requester");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::{delete, get, post, put};
    use axum::{Json, Router};
    use serde_json::json;
    use uuid::Uuid;

    use super::InquiryApiClient;
    use crate::backend::test_support::spawn;
    use crate::backend::BackendCredential;
    use crate::models::CreateInquiryForm;

    const INQUIRY_ID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";
    const CAR_ID: &str = "6a1d3f3e-8a53-4d3b-9f6e-0d7c2b1e5a10";

    fn inquiry_json(response: Option<&str>) -> serde_json::Value {
        json!({
            "id": INQUIRY_ID,
            "carId": CAR_ID,
            "name": "Ana",
            "carMaker": "Porsche",
            "carModel": "911",
            "email": "ana@example.com",
            "message": "Still available?",
            "response": response,
            "createdAt": "2024-03-01T10:20:30Z"
        })
    }

    #[tokio::test]
    async fn list_forwards_admin_credential() {
        let backend = spawn(Router::new().route(
            "/api/inquiries/getAllInquiry",
            get(|| async { Json(json!([inquiry_json(None)])) }),
        ))
        .await;
        let client = InquiryApiClient::new(backend.http(), &backend.base_url);
        let credential = BackendCredential::anonymous().with_cookie(".AspNetCore.Session", "tok");

        let inquiries = client.list(&credential).await.unwrap();

        assert_eq!(inquiries.len(), 1);
        assert_eq!(inquiries[0].car_maker, "Porsche");
        let call = backend.recorder.last().unwrap();
        assert_eq!(call.cookie.as_deref(), Some(".AspNetCore.Session=tok"));
    }

    #[tokio::test]
    async fn list_by_email_encodes_query_and_skips_blank() {
        let backend = spawn(Router::new().route(
            "/api/inquiries/byEmail",
            get(|| async { Json(json!([inquiry_json(Some("Yes it is"))])) }),
        ))
        .await;
        let client = InquiryApiClient::new(backend.http(), &backend.base_url);

        assert!(client.list_by_email("  ").await.unwrap().is_empty());
        assert_eq!(backend.recorder.count(), 0);

        let found = client.list_by_email("ana+cars@example.com").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].response.as_deref(), Some("Yes it is"));
        let call = backend.recorder.last().unwrap();
        assert_eq!(call.query.as_deref(), Some("email=ana%2Bcars%40example.com"));
    }

    #[tokio::test]
    async fn create_posts_form_fields() {
        let backend = spawn(Router::new().route(
            "/api/inquiries/createInquiry",
            post(|| async { (StatusCode::CREATED, Json(inquiry_json(None))) }),
        ))
        .await;
        let client = InquiryApiClient::new(backend.http(), &backend.base_url);
        let form = CreateInquiryForm {
            car_id: CAR_ID.parse().unwrap(),
            name: String::from("Ana"),
            email: String::from("ana@example.com"),
            message: String::from("Still available?"),
        };

        let created = client.create(&form).await.unwrap();

        assert_eq!(created.id.to_string(), INQUIRY_ID);
        let call = backend.recorder.last().unwrap();
        for field in ["CarId", "Name", "Email", "Message", "CreatedAt"] {
            assert!(call.body.contains(&format!("name=\"{field}\"")), "missing {field}");
        }
        assert!(call.cookie.is_none());
    }

    #[tokio::test]
    async fn reply_sends_response_field() {
        let backend = spawn(Router::new().route(
            "/api/inquiries/{id}/replyInquiry",
            put(|| async { Json(inquiry_json(Some("It is."))) }),
        ))
        .await;
        let client = InquiryApiClient::new(backend.http(), &backend.base_url);

        let updated = client
            .reply(
                INQUIRY_ID.parse().unwrap(),
                "It is.",
                &BackendCredential::anonymous().with_cookie("sid", "1"),
            )
            .await
            .unwrap();

        assert_eq!(updated.response.as_deref(), Some("It is."));
        let call = backend.recorder.last().unwrap();
        assert!(call.body.contains("name=\"response\""));
    }

    #[tokio::test]
    async fn requester_delete_passes_email_query() {
        let backend = spawn(Router::new().route(
            "/api/inquiries/{id}/deleteUserInquiry",
            delete(|| async { StatusCode::NO_CONTENT }),
        ))
        .await;
        let client = InquiryApiClient::new(backend.http(), &backend.base_url);

        client
            .delete_by_requester(INQUIRY_ID.parse().unwrap(), "ana@example.com")
            .await
            .unwrap();

        let call = backend.recorder.last().unwrap();
        assert_eq!(call.query.as_deref(), Some("userEmail=ana%40example.com"));
    }

    #[tokio::test]
    async fn failure_returns_error_instead_of_panicking() {
        let backend = spawn(Router::new().route(
            "/api/inquiries/{id}",
            get(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "title": "One or more validation errors occurred.", "errors": { "id": ["The value 'x' is not valid."] } })),
                )
                    .into_response()
            }),
        ))
        .await;
        let client = InquiryApiClient::new(backend.http(), &backend.base_url);

        let error = client
            .get(Uuid::new_v4(), &BackendCredential::anonymous())
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "One or more validation errors occurred.");
    }
}
