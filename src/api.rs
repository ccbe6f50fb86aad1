use std::future::Future;

use log::debug;
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ApiError;
use crate::record::{CreatedId, Sighting, SightingId, SightingPayload, SightingRow, UserId};

/// Backend operations the sighting store depends on.
pub trait SightingApi {
    /// `GET /sightings`
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Sighting>, ApiError>> + Send;

    /// `POST /sightings`, returning the id the backend assigned.
    fn create(
        &self,
        sighting: &Sighting,
    ) -> impl Future<Output = Result<SightingId, ApiError>> + Send;

    /// `PUT /sightings/{id}` with the full record.
    fn replace(&self, sighting: &Sighting) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `DELETE /sightings/{id}`
    fn delete(&self, id: &SightingId) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Backend operations the session store depends on.
pub trait AuthApi {
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    fn signup(
        &self,
        request: &SignupRequest,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;
}

#[derive(Debug, Clone, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Identity fields returned by `/login` and `/signup`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// REST client for the sighting backend. Cheap to clone.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("wildlife-tracker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// `{base}/sightings/{id}` with the id percent-encoded as a single path segment.
    fn sighting_url(&self, id: &SightingId) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::Config(format!("invalid API url {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Config(format!("API url {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .push("sightings")
            .push(id.as_str());
        Ok(url)
    }
}

/// Turn a non-2xx response into `ApiError::Rejected`, keeping the backend's message.
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(ApiError::Rejected {
        status: status.as_u16(),
        message: rejection_message(status, &text),
    })
}

/// The `{error}` field of an error body, else the trimmed body, else the status reason.
fn rejection_message(status: StatusCode, text: &str) -> String {
    if let Ok(body) = serde_json::from_str::<ErrorBody>(text) {
        return body.error;
    }
    let text = text.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        text.to_string()
    }
}

impl SightingApi for HttpBackend {
    async fn fetch_all(&self) -> Result<Vec<Sighting>, ApiError> {
        let response = check(self.client.get(self.url("sightings")).send().await?).await?;
        let rows: Vec<SightingRow> = serde_json::from_str(&response.text().await?)?;
        debug!("Fetched {} sighting rows", rows.len());
        Ok(rows.into_iter().map(Sighting::from).collect())
    }

    async fn create(&self, sighting: &Sighting) -> Result<SightingId, ApiError> {
        let payload = SightingPayload::from(sighting);
        let response = check(
            self.client
                .post(self.url("sightings"))
                .json(&payload)
                .send()
                .await?,
        )
        .await?;
        let created: CreatedId = serde_json::from_str(&response.text().await?)?;
        Ok(created.id)
    }

    async fn replace(&self, sighting: &Sighting) -> Result<(), ApiError> {
        let payload = SightingPayload::from(sighting);
        check(
            self.client
                .put(self.sighting_url(&sighting.id)?)
                .json(&payload)
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, id: &SightingId) -> Result<(), ApiError> {
        check(self.client.delete(self.sighting_url(id)?).send().await?).await?;
        Ok(())
    }
}

impl AuthApi for HttpBackend {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let response = check(
            self.client
                .post(self.url("login"))
                .json(&LoginRequest { email, password })
                .send()
                .await?,
        )
        .await?;
        Ok(serde_json::from_str(&response.text().await?)?)
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ApiError> {
        let response = check(
            self.client
                .post(self.url("signup"))
                .json(request)
                .send()
                .await?,
        )
        .await?;
        Ok(serde_json::from_str(&response.text().await?)?)
    }
}
