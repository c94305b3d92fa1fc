//! Registry web service HTTP client

use crate::auth::BasicAuthenticator;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;

/// Error raised by registry API calls.
///
/// Status failures keep the raw response body; save and restore surface it
/// verbatim in their error notifications.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// The raw response body for status failures, the display form otherwise
    pub fn body(&self) -> String {
        match self {
            Self::Status { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

/// HTTP client for the registry web service
pub struct RegistryClient {
    http_client: Client,
    auth: Arc<BasicAuthenticator>,
}

impl RegistryClient {
    /// Create a new registry client
    pub fn new(auth: Arc<BasicAuthenticator>) -> Self {
        let http_client = Client::builder()
            .user_agent("Regman/0.1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self { http_client, auth }
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        join_url(self.auth.server_url(), endpoint)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth.credentials() {
            Some((user, password)) => request.basic_auth(user, Some(password)),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        Ok(response)
    }

    /// Make an authenticated GET request
    pub async fn get(&self, endpoint: &str) -> Result<Response, ApiError> {
        let request = self
            .http_client
            .get(self.endpoint_url(endpoint))
            .header("Accept", "application/json");

        let response = self.apply_auth(request).send().await?;
        Self::check(response).await
    }

    /// Make an authenticated GET request and deserialize the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let response = self.get(endpoint).await?;
        Ok(response.json::<T>().await?)
    }

    /// PUT a JSON body to an endpoint, discarding the response body
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<(), ApiError> {
        let request = self.http_client.put(self.endpoint_url(endpoint)).json(body);
        let response = self.apply_auth(request).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Make an authenticated DELETE request
    pub async fn delete(&self, endpoint: &str) -> Result<(), ApiError> {
        let request = self.http_client.delete(self.endpoint_url(endpoint));
        let response = self.apply_auth(request).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Probe the service before starting the TUI
    pub async fn test_connection(&self) -> Result<(), ApiError> {
        self.get("user/search?q=&limit=0").await?;
        Ok(())
    }

    /// Get the server URL
    pub fn server_url(&self) -> &str {
        self.auth.server_url()
    }
}

fn join_url(base: &str, endpoint: &str) -> String {
    if endpoint.starts_with("http") {
        endpoint.to_string()
    } else {
        format!("{}/{}", base, endpoint.trim_start_matches('/'))
    }
}
