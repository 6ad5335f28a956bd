//! REST transport for the build list and indicators endpoints.

use crate::config::ClientConfig;
use crate::error::ClientError;
use async_trait::async_trait;
use buildlens_core::{FetchError, IndicatorsResponse, IndicatorsSnapshot, ResultPage, Scope};
use buildlens_stream::{BuildSource, PageRequest};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Longest slice of a non-JSON error body kept in an error message.
const MAX_ERROR_BODY: usize = 200;

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: Url,
    auth_header: HeaderMap,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("buildlens/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = Url::parse(&config.api_base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Usage(format!(
                "api_base_url {} cannot carry a path",
                config.api_base_url
            )));
        }
        let auth_header = build_auth_headers(config.auth.token.as_deref())?;
        Ok(Self {
            client,
            base_url,
            auth_header,
        })
    }

    /// `{base}/api/v1/organizations/{org}/repositories/{repo}/builds[/{tail}]`
    pub fn builds_url(&self, scope: &Scope, tail: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "api",
                "v1",
                "organizations",
                scope.organization.as_str(),
                "repositories",
                scope.repository.as_str(),
                "builds",
            ]);
            if let Some(tail) = tail {
                segments.push(tail);
            }
        }
        url
    }

    async fn get_json<T>(&self, url: Url, request: &PageRequest) -> Result<T, FetchError>
    where
        T: serde::de::DeserializeOwned,
    {
        debug!(url = %url, page = request.page, "GET");
        let response = self
            .client
            .get(url)
            .headers(self.auth_header.clone())
            .query(&request.query_pairs())
            .send()
            .await
            .map_err(transport_error)?;
        parse_response(response).await
    }
}

#[async_trait]
impl BuildSource for RestClient {
    async fn list_builds(&self, request: &PageRequest) -> Result<ResultPage, FetchError> {
        let url = self.builds_url(&request.scope, None);
        self.get_json(url, request).await
    }

    async fn indicators(&self, request: &PageRequest) -> Result<IndicatorsSnapshot, FetchError> {
        let url = self.builds_url(&request.scope, Some("indicators"));
        let response: IndicatorsResponse = self.get_json(url, request).await?;
        Ok(response.indicators)
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, FetchError> {
    let status = response.status();
    let text = response.text().await.map_err(transport_error)?;
    if !status.is_success() {
        return Err(FetchError::http(status.as_u16(), server_message(&text)));
    }
    serde_json::from_str(&text).map_err(|e| FetchError::Decode {
        reason: e.to_string(),
    })
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            message: err.to_string(),
        }
    } else if err.is_decode() {
        FetchError::Decode {
            reason: err.to_string(),
        }
    } else {
        FetchError::Connect {
            message: err.to_string(),
        }
    }
}

/// Human-readable message from an error body: the server's `detail` or
/// `message` field when it sent JSON, otherwise the (truncated) body.
pub(crate) fn server_message(body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message"] {
            if let Some(serde_json::Value::String(message)) = map.get(key) {
                return message.clone();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_BODY).collect()
    }
}

fn build_auth_headers(token: Option<&str>) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|e| ClientError::Header(e.to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}
