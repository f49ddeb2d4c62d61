//! Client view of the session endpoints.

use std::future::Future;

use serde::de::DeserializeOwned;

use super::store::DurableStoreError;
use crate::api::{API_PREFIX, LoginRequest, ValidateResponse};
use crate::auth::{ErrorBody, Session};
use crate::credentials::UserProfile;

/// Error returned by the client session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The server answered with a non-success status.
    Rejected { status: u16, message: String },
    /// The request never produced a response.
    Transport(String),
    /// The response body was not what the endpoint promises.
    Decode(String),
    /// The token could not be written to the durable store.
    Storage(DurableStoreError),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected { status, message } => write!(f, "rejected ({status}): {message}"),
            Self::Transport(reason) => write!(f, "transport error: {reason}"),
            Self::Decode(reason) => write!(f, "unexpected response: {reason}"),
            Self::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<DurableStoreError> for ClientError {
    fn from(e: DurableStoreError) -> Self {
        Self::Storage(e)
    }
}

/// The session endpoints as the client manager uses them.
pub trait SessionApi: Clone + Send + Sync + 'static {
    /// Exchange credentials for a session.
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, ClientError>> + Send;

    /// Resolve a token to its user.
    fn validate(&self, token: &str)
    -> impl Future<Output = Result<UserProfile, ClientError>> + Send;

    /// Tell the server the session is over.
    fn logout(&self, token: Option<&str>) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// [`SessionApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSessionApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSessionApi {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:3000`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.base_url)
    }
}

fn transport(e: &reqwest::Error) -> ClientError {
    ClientError::Transport(e.to_string())
}

async fn rejection(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let message = response
        .json::<ErrorBody>()
        .await
        .map_or_else(|_| status.to_string(), |body| body.error);
    ClientError::Rejected {
        status: status.as_u16(),
        message,
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(rejection(response).await);
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))
}

impl SessionApi for HttpSessionApi {
    async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .client
            .post(self.url("/login"))
            .json(&request)
            .send()
            .await
            .map_err(|e| transport(&e))?;
        decode(response).await
    }

    async fn validate(&self, token: &str) -> Result<UserProfile, ClientError> {
        let response = self
            .client
            .get(self.url("/validate"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| transport(&e))?;
        decode::<ValidateResponse>(response)
            .await
            .map(|body| body.user)
    }

    async fn logout(&self, token: Option<&str>) -> Result<(), ClientError> {
        let mut request = self.client.post(self.url("/logout"));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|e| transport(&e))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(rejection(response).await)
        }
    }
}
