//! HTTP appointment store
//!
//! Talks to the `/api/appointments` endpoints served by the API crate.

use agenda_core::{
    Appointment, AppointmentId, AppointmentPatch, AppointmentStore, NewAppointment, StoreError, TimeRange,
};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::{Client, Response, StatusCode};
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpAppointmentStore {
    client: Client,
    base_url: Url,
}

impl HttpAppointmentStore {
    /// `base_url` is the server root, e.g. `http://localhost:3000`
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(path)
            .map_err(|e| StoreError::Rejected(format!("Invalid endpoint {}: {}", path, e)))
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

/// Map a non-success response to a store error, preferring the API's details
async fn failure(response: Response, id: Option<AppointmentId>) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("details")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("{} {}", status, body));

    match (status, id) {
        (StatusCode::NOT_FOUND, Some(id)) => StoreError::NotFound(id),
        (s, _) if s.is_server_error() => StoreError::Unavailable(message),
        _ => StoreError::Rejected(message),
    }
}

#[async_trait]
impl AppointmentStore for HttpAppointmentStore {
    async fn list(&self, window: TimeRange) -> Result<Vec<Appointment>, StoreError> {
        let mut url = self.endpoint("api/appointments")?;
        url.query_pairs_mut()
            .append_pair("start", &window.start().to_rfc3339_opts(SecondsFormat::Secs, true))
            .append_pair("end", &window.end().to_rfc3339_opts(SecondsFormat::Secs, true));

        let response = self.client.get(url).send().await.map_err(transport)?;
        if !response.status().is_success() {
            return Err(failure(response, None).await);
        }
        response.json().await.map_err(transport)
    }

    async fn update(&self, id: AppointmentId, patch: AppointmentPatch) -> Result<Appointment, StoreError> {
        let url = self.endpoint(&format!("api/appointments/{}", id))?;

        let response = self
            .client
            .patch(url)
            .json(&patch)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(failure(response, Some(id)).await);
        }
        response.json().await.map_err(transport)
    }

    async fn create(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        let url = self.endpoint("api/appointments")?;

        let response = self
            .client
            .post(url)
            .json(&appointment)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(failure(response, None).await);
        }
        response.json().await.map_err(transport)
    }
}
