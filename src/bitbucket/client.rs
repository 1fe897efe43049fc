use crate::config::BitbucketConfig;
use crate::errors::{Result, StackError};
use base64::Engine;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, StatusCode,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

/// Bitbucket Server API client
pub struct BitbucketClient {
    client: Client,
    base_url: String,
    project_key: String,
    repo_slug: String,
}

impl BitbucketClient {
    /// Create a new Bitbucket client
    pub fn new(config: &BitbucketConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();

        let auth_header = match (&config.username, &config.token) {
            (Some(username), Some(token)) => {
                let auth_string = format!("{username}:{token}");
                let auth_encoded = base64::engine::general_purpose::STANDARD.encode(auth_string);
                format!("Basic {auth_encoded}")
            }
            (None, Some(token)) => format!("Bearer {token}"),
            _ => {
                return Err(StackError::config(
                    "Bitbucket authentication credentials not configured",
                ))
            }
        };

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_header)
                .map_err(|e| StackError::config(format!("Invalid auth header: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()
            .map_err(|e| StackError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
            project_key: config.project.clone(),
            repo_slug: config.repo.clone(),
        })
    }

    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    pub fn repo_slug(&self) -> &str {
        &self.repo_slug
    }

    /// Get the base API URL for this repository
    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/rest/api/1.0/projects/{}/repos/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.project_key,
            self.repo_slug,
            path.trim_start_matches('/')
        )
    }

    /// Make a GET request with query parameters
    pub async fn get<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = self.api_url(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| StackError::host(format!("GET request failed: {e}")))?;

        self.handle_response(response).await
    }

    pub async fn post<T, U>(&self, path: &str, body: &T) -> Result<U>
    where
        T: Serialize,
        U: for<'de> Deserialize<'de>,
    {
        let url = self.api_url(path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| StackError::host(format!("POST request failed: {e}")))?;

        self.handle_response(response).await
    }

    pub async fn put<T, U>(&self, path: &str, body: &T) -> Result<U>
    where
        T: Serialize,
        U: for<'de> Deserialize<'de>,
    {
        let url = self.api_url(path);
        debug!("PUT {}", url);

        let response = self
            .client
            .put(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| StackError::host(format!("PUT request failed: {e}")))?;

        self.handle_response(response).await
    }

    /// Handle HTTP response and deserialize JSON
    async fn handle_response<T>(&self, response: reqwest::Response) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let status = response.status();

        if status.is_success() {
            let text = response
                .text()
                .await
                .map_err(|e| StackError::host(format!("Failed to read response body: {e}")))?;

            trace!("Response body: {}", text);

            serde_json::from_str(&text)
                .map_err(|e| StackError::host(format!("Failed to parse JSON response: {e}")))
        } else {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if status == StatusCode::NOT_FOUND {
                return Err(StackError::not_found(text));
            }
            Err(StackError::bitbucket_api(status.as_u16(), text))
        }
    }
}
