//! API client for the public BIGSdb REST resources.
//!
//! Everything reachable here is unauthenticated: the resource index,
//! database link documents, schemes, loci and allele FASTA files.
//! Authenticated routes go through `auth::TokenManager`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::models::{DatabaseAttributes, LociList, Locus, Resource, SchemeDetail, SchemeList};

use super::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// POST and PUT carry a form body; GET and DELETE never do.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(anyhow::anyhow!("Unsupported HTTP method: {}", other)),
        }
    }
}

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(serde_json::Value),
    Text(String),
}

impl ApiResponse {
    /// Decode a 2xx response according to its content type.
    pub async fn from_response(response: reqwest::Response) -> Result<Self> {
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("json"))
            .unwrap_or(false);

        let text = response.text().await.context("Failed to read response body")?;
        if is_json {
            let value = serde_json::from_str(&text)
                .map_err(|e| ApiError::InvalidResponse(format!("Malformed JSON body: {}", e)))?;
            Ok(ApiResponse::Json(value))
        } else {
            Ok(ApiResponse::Text(text))
        }
    }
}

impl fmt::Display for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiResponse::Json(value) => {
                let pretty = serde_json::to_string_pretty(value).map_err(|_| fmt::Error)?;
                f.write_str(&pretty)
            }
            ApiResponse::Text(text) => f.write_str(text),
        }
    }
}

/// Client for the public resources of one REST installation.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn send_get(&self, url: &str) -> Result<reqwest::Response> {
        debug!(url = url, "GET");
        self.client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))
    }

    /// Fetch any JSON document by absolute URL.
    pub async fn get_json_at<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = Self::check_response(self.send_get(url).await?).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// Fetch a JSON document, mapping a 404 to `ApiError::NotFound` with the
    /// given message instead of the server's.
    async fn get_json_or_not_found<T: DeserializeOwned>(
        &self,
        url: &str,
        not_found: impl FnOnce() -> String,
    ) -> Result<T> {
        let response = self.send_get(url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(not_found()).into());
        }
        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    // ===== Data Fetching Methods =====

    /// The REST root: every site and the databases it serves.
    pub async fn resources(&self) -> Result<Vec<Resource>> {
        self.get_json_at(&self.config.rest_url).await
    }

    pub async fn database(&self, database: &str) -> Result<DatabaseAttributes> {
        let url = self.config.database_url(database);
        self.get_json_or_not_found(&url, || format!("Database {} does not exist.", database))
            .await
    }

    pub async fn schemes_at(&self, url: &str) -> Result<SchemeList> {
        self.get_json_at(url).await
    }

    pub async fn scheme(&self, database: &str, scheme_id: u32) -> Result<SchemeDetail> {
        let url = format!("{}/schemes/{}", self.config.database_url(database), scheme_id);
        self.get_json_or_not_found(&url, || format!("Scheme {} does not exist.", scheme_id))
            .await
    }

    /// All loci defined in a database.
    pub async fn loci(&self, database: &str) -> Result<LociList> {
        let url = format!("{}/loci?return_all=1", self.config.database_url(database));
        self.get_json_at(&url).await
    }

    pub async fn locus_at(&self, url: &str) -> Result<Locus> {
        self.get_json_at(url).await
    }

    /// Raw FASTA text, returned exactly as served.
    pub async fn fasta_at(&self, url: &str) -> Result<String> {
        let response = Self::check_response(self.send_get(url).await?).await?;
        response
            .text()
            .await
            .with_context(|| format!("Failed to read FASTA from {}", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_parse() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("POST".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!("Put".parse::<HttpMethod>().unwrap(), HttpMethod::Put);
        assert_eq!("DELETE".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!("PATCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_http_method_body() {
        assert!(HttpMethod::Post.has_body());
        assert!(HttpMethod::Put.has_body());
        assert!(!HttpMethod::Get.has_body());
        assert!(!HttpMethod::Delete.has_body());
    }

    #[test]
    fn test_response_display() {
        let json = ApiResponse::Json(serde_json::json!({"records": 2}));
        assert_eq!(json.to_string(), "{\n  \"records\": 2\n}");
        assert_eq!(ApiResponse::Text(">abcZ_1\nACGT".into()).to_string(), ">abcZ_1\nACGT");
    }
}
