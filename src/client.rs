// Stockroom - Typed API client
// Thin wrapper over reqwest. HTTP failures are not reinterpreted: a non-2xx
// status surfaces as the transport error carrying that status, so callers
// see exactly what the server answered.

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::api::{LoginRequest, LoginResponse, MeResponse, TestResponse};
use crate::entities::{Material, NamedEntity};

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    /// Client against a server root such as `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        ApiClient {
            base_url,
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, reqwest::Error> {
        self.http
            .get(self.url(path))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn repair_men(&self) -> Result<Vec<NamedEntity>, reqwest::Error> {
        self.get_json("/api/repair-men").await
    }

    pub async fn buyers(&self) -> Result<Vec<NamedEntity>, reqwest::Error> {
        self.get_json("/api/buyers").await
    }

    pub async fn suppliers(&self) -> Result<Vec<NamedEntity>, reqwest::Error> {
        self.get_json("/api/suppliers").await
    }

    pub async fn materials(&self) -> Result<Vec<Material>, reqwest::Error> {
        self.get_json("/api/materials").await
    }

    pub async fn units(&self) -> Result<Vec<String>, reqwest::Error> {
        self.get_json("/api/units").await
    }

    pub async fn api_test(&self) -> Result<TestResponse, reqwest::Error> {
        self.get_json("/api/test").await
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, reqwest::Error> {
        self.http
            .post(self.url("/api/login"))
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn me(&self, token: &str) -> Result<MeResponse, reqwest::Error> {
        self.http
            .get(self.url("/api/me"))
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn logout(&self, token: &str) -> Result<(), reqwest::Error> {
        self.http
            .post(self.url("/api/logout"))
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
