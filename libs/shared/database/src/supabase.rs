use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{Appointment, AppointmentStatus, Doctor, DoctorStatus, User};

use crate::store::{AppointmentFilter, Store, StoreError, StoreResult};

/// Thin PostgREST client authenticated with the service key.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.supabase_url.clone(),
            service_key: config.supabase_service_key.clone(),
        })
    }

    fn get_headers(&self, prefer_representation: bool) -> StoreResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.service_key)
            .map_err(|_| StoreError::Backend("service key is not a valid header value".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.service_key))
            .map_err(|_| StoreError::Backend("service key is not a valid header value".to_string()))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if prefer_representation {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> StoreResult<T>
    where
        T: DeserializeOwned,
    {
        let prefer_representation = method != Method::GET;
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.get_headers(prefer_representation)?);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        // Map PostgREST failures onto store errors
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("PostgREST error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                404 => StoreError::NotFound(error_text),
                409 => StoreError::Conflict(error_text),
                _ => StoreError::Backend(format!("{}: {}", status, error_text)),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

/// [`Store`] backed by Supabase tables `users`, `doctors` and `appointments`.
pub struct SupabaseStore {
    client: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> StoreResult<Self> {
        Ok(Self {
            client: SupabaseClient::new(config)?,
        })
    }

    async fn select<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Vec<T>> {
        self.client.request(Method::GET, path, None).await
    }

    async fn select_one<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Option<T>> {
        Ok(self.select(path).await?.into_iter().next())
    }

    async fn insert<T: Serialize + DeserializeOwned>(&self, table: &str, record: &T) -> StoreResult<T> {
        let path = format!("/rest/v1/{}", table);
        let rows: Vec<T> = self
            .client
            .request(Method::POST, &path, Some(serde_json::to_value(record)?))
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend(format!("insert into {} returned no rows", table)))
    }

    async fn patch<T: DeserializeOwned>(&self, path: &str, body: Value) -> StoreResult<Option<T>> {
        let rows: Vec<T> = self.client.request(Method::PATCH, path, Some(body)).await?;
        Ok(rows.into_iter().next())
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Option<T>> {
        let rows: Vec<T> = self.client.request(Method::DELETE, path, None).await?;
        Ok(rows.into_iter().next())
    }
}

fn status_list(statuses: &[AppointmentStatus]) -> String {
    statuses
        .iter()
        .map(AppointmentStatus::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn appointment_query(filter: &AppointmentFilter) -> String {
    let mut query_parts = Vec::new();

    if let Some(patient_id) = filter.patient_id {
        query_parts.push(format!("patient_id=eq.{}", patient_id));
    }
    if let Some(doctor_id) = filter.doctor_id {
        query_parts.push(format!("doctor_id=eq.{}", doctor_id));
    }
    if let Some(from) = filter.date_from {
        query_parts.push(format!("date=gte.{}", from));
    }
    if let Some(to) = filter.date_to {
        query_parts.push(format!("date=lte.{}", to));
    }
    if let Some(statuses) = &filter.statuses {
        query_parts.push(format!("status=in.({})", status_list(statuses)));
    }
    query_parts.push("order=created_at.desc".to_string());

    format!("/rest/v1/appointments?{}", query_parts.join("&"))
}

#[async_trait]
impl Store for SupabaseStore {
    async fn ping(&self) -> StoreResult<()> {
        let _: Vec<Value> = self.select("/rest/v1/users?select=id&limit=1").await?;
        Ok(())
    }

    async fn insert_user(&self, user: User) -> StoreResult<User> {
        self.insert("users", &user).await
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.select_one(&format!("/rest/v1/users?id=eq.{}", id)).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.select_one(&format!("/rest/v1/users?email=eq.{}", urlencoding::encode(email)))
            .await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.select("/rest/v1/users?order=created_at.asc").await
    }

    async fn update_user(&self, user: User) -> StoreResult<User> {
        let body = json!({ "name": user.name, "email": user.email });
        self.patch(&format!("/rest/v1/users?id=eq.{}", user.id), body)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user.id)))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let removed: Option<Value> = self.delete(&format!("/rest/v1/users?id=eq.{}", id)).await?;
        Ok(removed.is_some())
    }

    async fn insert_doctor(&self, doctor: Doctor) -> StoreResult<Doctor> {
        self.insert("doctors", &doctor).await
    }

    async fn find_doctor(&self, id: Uuid) -> StoreResult<Option<Doctor>> {
        self.select_one(&format!("/rest/v1/doctors?id=eq.{}", id)).await
    }

    async fn find_doctor_by_user(&self, user_id: Uuid) -> StoreResult<Option<Doctor>> {
        self.select_one(&format!("/rest/v1/doctors?user_id=eq.{}", user_id)).await
    }

    async fn list_doctors(&self, status: Option<DoctorStatus>) -> StoreResult<Vec<Doctor>> {
        let path = match status {
            Some(status) => format!("/rest/v1/doctors?status=eq.{}&order=created_at.asc", status),
            None => "/rest/v1/doctors?order=created_at.asc".to_string(),
        };
        self.select(&path).await
    }

    async fn update_doctor(&self, doctor: Doctor) -> StoreResult<Doctor> {
        let body = json!({
            "specialization": doctor.specialization,
            "qualifications": doctor.qualifications,
            "experience": doctor.experience,
            "fees": doctor.fees,
            "availability": doctor.availability,
            "about": doctor.about,
            "image": doctor.image,
        });
        self.patch(&format!("/rest/v1/doctors?id=eq.{}", doctor.id), body)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("doctor {}", doctor.id)))
    }

    async fn set_doctor_status(&self, id: Uuid, status: DoctorStatus) -> StoreResult<Option<Doctor>> {
        self.patch(&format!("/rest/v1/doctors?id=eq.{}", id), json!({ "status": status }))
            .await
    }

    async fn delete_doctor_by_user(&self, user_id: Uuid) -> StoreResult<Option<Doctor>> {
        self.delete(&format!("/rest/v1/doctors?user_id=eq.{}", user_id)).await
    }

    async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        self.insert("appointments", &appointment).await
    }

    async fn find_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        self.select_one(&format!("/rest/v1/appointments?id=eq.{}", id)).await
    }

    async fn list_appointments(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        self.select(&appointment_query(filter)).await
    }

    async fn transition_appointment(
        &self,
        id: Uuid,
        from: &[AppointmentStatus],
        to: AppointmentStatus,
    ) -> StoreResult<Option<Appointment>> {
        // Matches no row once another writer has moved the status
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=in.({})",
            id,
            status_list(from)
        );
        self.patch(&path, json!({ "status": to })).await
    }
}
