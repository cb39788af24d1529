//! Client configuration.
//!
//! A single `ClientConfig` is built once at startup and handed to every
//! component that needs it (API client, token manager). Values come from
//! `~/.config/bigsdb-rest/config.json`, then environment variables, then
//! whatever the caller overrides explicitly.

use std::path::PathBuf;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;

/// Application name used for config directory paths
const APP_NAME: &str = "bigsdb-rest";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_REST_URL: &str = "https://rest.pubmlst.org";
const DEFAULT_WEB_URL: &str = "https://pubmlst.org/bigsdb";
const DEFAULT_DATABASE: &str = "pubmlst_test_seqdef";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of the REST interface, e.g. `https://rest.pubmlst.org`.
    pub rest_url: String,
    /// Web front end used for the client authorization page.
    pub web_url: String,
    /// Database configuration name used for authenticated requests.
    pub database: String,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    /// Directory holding the `request_token`, `access_token` and
    /// `session_token` files.
    pub token_dir: PathBuf,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rest_url: DEFAULT_REST_URL.to_string(),
            web_url: DEFAULT_WEB_URL.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            consumer_key: None,
            consumer_secret: None,
            token_dir: PathBuf::from("."),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Load the config file if present and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Ok(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?
            }
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Override fields from `BIGSDB_*` variables. The lookup is injected so
    /// tests don't have to touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BIGSDB_REST_URL") {
            self.rest_url = v;
        }
        if let Some(v) = lookup("BIGSDB_WEB_URL") {
            self.web_url = v;
        }
        if let Some(v) = lookup("BIGSDB_DATABASE") {
            self.database = v;
        }
        if let Some(v) = lookup("BIGSDB_CONSUMER_KEY") {
            self.consumer_key = Some(v);
        }
        if let Some(v) = lookup("BIGSDB_CONSUMER_SECRET") {
            self.consumer_secret = Some(v);
        }
        if let Some(v) = lookup("BIGSDB_TOKEN_DIR") {
            self.token_dir = PathBuf::from(v);
        }
    }

    /// Consumer key and secret, required for any signed request.
    pub fn consumer(&self) -> Result<(&str, &str)> {
        match (self.consumer_key.as_deref(), self.consumer_secret.as_deref()) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => Ok((key, secret)),
            _ => Err(anyhow::anyhow!(
                "Consumer key and secret are required (set BIGSDB_CONSUMER_KEY and BIGSDB_CONSUMER_SECRET)"
            )),
        }
    }

    /// REST URL of a database, e.g. `https://rest.pubmlst.org/db/pubmlst_test_seqdef`.
    pub fn database_url(&self, database: &str) -> String {
        format!("{}/db/{}", self.rest_url.trim_end_matches('/'), database)
    }

    /// REST URL of the configured database.
    pub fn db_url(&self) -> String {
        self.database_url(&self.database)
    }

    /// Web page where the user authorizes a request token. Any query the
    /// configured `web_url` already carries is kept, except for the
    /// parameters set here.
    pub fn authorize_url(&self, request_token: &str) -> Result<String> {
        let mut url = Url::parse(&self.web_url)
            .with_context(|| format!("Invalid web URL: {}", self.web_url))?;
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !matches!(&**k, "db" | "page" | "oauth_token"))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("db", &self.database)
            .append_pair("page", "authorizeClient")
            .append_pair("oauth_token", request_token);
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.rest_url, "https://rest.pubmlst.org");
        assert_eq!(config.database, "pubmlst_test_seqdef");
        assert_eq!(config.token_dir, PathBuf::from("."));
        assert!(config.consumer().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"database": "pubmlst_neisseria_seqdef"}"#).unwrap();
        assert_eq!(config.database, "pubmlst_neisseria_seqdef");
        assert_eq!(config.web_url, "https://pubmlst.org/bigsdb");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_apply_env() {
        let env: HashMap<&str, &str> = [
            ("BIGSDB_REST_URL", "http://localhost:3000"),
            ("BIGSDB_CONSUMER_KEY", "key"),
            ("BIGSDB_CONSUMER_SECRET", "secret"),
            ("BIGSDB_TOKEN_DIR", "/tmp/tokens"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.rest_url, "http://localhost:3000");
        assert_eq!(config.database, "pubmlst_test_seqdef");
        assert_eq!(config.consumer().unwrap(), ("key", "secret"));
        assert_eq!(config.token_dir, PathBuf::from("/tmp/tokens"));
    }

    #[test]
    fn test_urls() {
        let config = ClientConfig {
            rest_url: "http://rest.pubmlst.org/".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(config.db_url(), "http://rest.pubmlst.org/db/pubmlst_test_seqdef");
        assert_eq!(
            config.authorize_url("abc").unwrap(),
            "https://pubmlst.org/bigsdb?db=pubmlst_test_seqdef&page=authorizeClient&oauth_token=abc"
        );
    }

    #[test]
    fn test_authorize_url_with_existing_query() {
        let config = ClientConfig {
            web_url: "https://pubmlst.org/bigsdb?db=pubmlst_neisseria_seqdef&lang=en".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.authorize_url("a b/c").unwrap(),
            "https://pubmlst.org/bigsdb?lang=en&db=pubmlst_test_seqdef&page=authorizeClient&oauth_token=a+b%2Fc"
        );
    }

    #[test]
    fn test_authorize_url_rejects_invalid_web_url() {
        let config = ClientConfig {
            web_url: "not a url".to_string(),
            ..ClientConfig::default()
        };
        assert!(config.authorize_url("abc").is_err());
    }
}
