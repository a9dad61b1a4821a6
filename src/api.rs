//! HTTP transport to the JurisFlow backend. Owns bearer attachment and the
//! uniform 401 mapping that every collaborator view relies on: a 401 from any
//! authenticated endpoint surfaces as `ApiError::Unauthorized`, the one error
//! the session manager treats as fatal.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::Identity;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Explicit credential rejection (HTTP 401). Fatal to the session.
    #[error("unauthorized: credential rejected by backend")]
    Unauthorized,
    /// Credential exchange refused; body carried verbatim for the login form.
    #[error("login failed: HTTP {status}: {body}")]
    LoginFailed { status: u16, body: String },
    /// Non-401 backend failure. Transient; never tears the session down.
    #[error("server error: HTTP {status}")]
    Server { status: u16 },
    /// Transport-level failure. Transient.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// Body of a successful credential exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Clone)]
pub struct ApiClient {
    base: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self { base, client: reqwest::Client::new() }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// POST /auth/login with form-encoded credentials. Any non-2xx is a login
    /// failure surfaced verbatim to the caller; no session state is touched.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        // The login form normalizes the username before submission.
        let username = username.trim().to_lowercase();
        let resp = self
            .client
            .post(self.url("/auth/login"))
            .form(&[("username", username.as_str()), ("password", password)])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::LoginFailed { status: status.as_u16(), body });
        }
        Ok(resp.json().await?)
    }

    /// GET /auth/me with the bearer token. 401 is the one signal that the
    /// credential is dead; any other non-2xx is transient.
    pub async fn fetch_me(&self, token: &str) -> Result<Identity, ApiError> {
        let resp = self.client.get(self.url("/auth/me")).bearer_auth(token).send().await?;
        Self::decode(resp).await
    }

    /// Generic authenticated GET used by collaborator views (cases, clients,
    /// documents, contracts, pieces, tenants, users, notifications, search).
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let mut req = self.client.get(self.url(path));
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        Self::decode(req.send().await?).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<T, ApiError> {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        Self::decode(req.send().await?).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<(), ApiError> {
        let mut req = self.client.delete(self.url(path));
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        let resp = req.send().await?;
        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            s if s.is_success() => Ok(()),
            s => Err(ApiError::Server { status: s.as_u16() }),
        }
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            s if s.is_success() => Ok(resp.json().await?),
            s => Err(ApiError::Server { status: s.as_u16() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = ApiClient::new("http://localhost:8000/api/v1/");
        assert_eq!(api.base(), "http://localhost:8000/api/v1");
        assert_eq!(api.url("/auth/me"), "http://localhost:8000/api/v1/auth/me");
    }

    #[test]
    fn only_401_is_fatal() {
        assert!(ApiError::Unauthorized.is_unauthorized());
        assert!(!ApiError::Server { status: 500 }.is_unauthorized());
        assert!(!ApiError::LoginFailed { status: 422, body: String::new() }.is_unauthorized());
    }
}
