// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Foundry Agents thread, message and run resources.
//!
//! Provides [`FoundryClient`], bound to one project endpoint and one bearer
//! token. Every call carries the `api-version` query parameter. Failed calls
//! are returned as they are; nothing is retried.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;

use parley_config::ServiceConfig;
use parley_core::ParleyError;

use crate::types::ApiErrorResponse;

const API_KEY: HeaderName = HeaderName::from_static("api-key");
const OPENAI_BETA: HeaderName = HeaderName::from_static("openai-beta");
const APIM_TRACE: HeaderName = HeaderName::from_static("ocp-apim-trace");

/// Authorized client for one agent service project.
#[derive(Debug, Clone)]
pub struct FoundryClient {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl FoundryClient {
    /// Builds a client for `endpoint` that authenticates with `token`.
    ///
    /// The token goes out both as a bearer credential and as `api-key`.
    pub fn new(
        endpoint: &str,
        token: &SecretString,
        config: &ServiceConfig,
    ) -> Result<Self, ParleyError> {
        let base_url = endpoint.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ParleyError::Config("agent service endpoint is empty".into()));
        }

        let mut bearer = header_value(&format!("Bearer {}", token.expose_secret()))?;
        bearer.set_sensitive(true);
        let mut api_key = header_value(token.expose_secret())?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(API_KEY, api_key);
        headers.insert(OPENAI_BETA, HeaderValue::from_static("assistants=v2"));
        if config.trace_requests {
            headers.insert(APIM_TRACE, HeaderValue::from_static("true"));
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ParleyError::Service {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url,
            api_version: config.api_version.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(format!("{}/{path}", self.base_url))
            .query(&[("api-version", self.api_version.as_str())])
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(format!("{}/{path}", self.base_url))
            .query(&[("api-version", self.api_version.as_str())])
    }

    /// Sends the request and decodes a 2xx JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ParleyError> {
        let response = self.send(request).await?;
        let status = response.status();
        response.json::<T>().await.map_err(|e| ParleyError::Service {
            message: format!("failed to parse agent service response: {e}"),
            status: Some(status.as_u16()),
            source: Some(Box::new(e)),
        })
    }

    /// Sends the request, turning transport failures and non-2xx statuses into errors.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, ParleyError> {
        let response = request.send().await.map_err(|e| ParleyError::Service {
            message: format!("HTTP request failed: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        debug!(status = %status, url = %response.url().path(), "agent service response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_err) => match api_err.error.code {
                Some(code) => format!("{status} ({code}): {}", api_err.error.message),
                None => format!("{status}: {}", api_err.error.message),
            },
            Err(_) if body.trim().is_empty() => format!("agent service returned {status}"),
            Err(_) => format!("agent service returned {status}: {}", body.trim()),
        };
        Err(ParleyError::Service {
            message,
            status: Some(status.as_u16()),
            source: None,
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ParleyError> {
    HeaderValue::from_str(value)
        .map_err(|e| ParleyError::auth(format!("access token is not a valid header value: {e}")))
}
