//! Token lifecycle: request -> access -> session.
//!
//! A request token (obtained with the consumer key alone) is authorized by
//! the user in the web interface, which yields a verification code. The
//! request token plus that code buys a long-lived access token, and the
//! access token buys session tokens that sign ordinary API calls. Any
//! missing tier is obtained on demand; an expired session token is renewed
//! once per call.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use reqwest_oauth1::{OAuthClientProvider, Secrets};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::api::{ApiError, ApiResponse, HttpMethod, Payload};
use crate::config::ClientConfig;

use super::{Credential, CredentialKind, CredentialStore, Operator};

/// How many times a single call may renew its session token.
const MAX_SESSION_RENEWALS: u32 = 1;

/// Marker the server puts in 401 messages when the client itself has been
/// refused, as opposed to presenting a stale token.
const UNAUTHORIZED_MARKER: &str = "unauthorized";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    oauth_token: String,
    oauth_token_secret: String,
}

/// Result of one signed request that did not fail outright.
enum Attempt {
    Done(ApiResponse),
    Expired(String),
}

pub struct TokenManager {
    config: ClientConfig,
    client: Client,
    consumer_key: String,
    consumer_secret: String,
    store: Box<dyn CredentialStore>,
    operator: Box<dyn Operator>,
}

impl TokenManager {
    pub fn new(
        config: ClientConfig,
        store: Box<dyn CredentialStore>,
        operator: Box<dyn Operator>,
    ) -> Result<Self> {
        let (key, secret) = config.consumer()?;
        let consumer_key = key.to_string();
        let consumer_secret = secret.to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            client,
            consumer_key,
            consumer_secret,
            store,
            operator,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    fn oauth_url(&self, endpoint: &str) -> String {
        format!("{}/oauth/{}", self.config.db_url(), endpoint)
    }

    /// Absolute URL of a database route; the leading `/` is optional.
    pub fn route_url(&self, route: &str) -> String {
        if route.is_empty() || route.starts_with('/') {
            format!("{}{}", self.config.db_url(), route)
        } else {
            format!("{}/{}", self.config.db_url(), route)
        }
    }

    /// Consumer secrets, plus the token pair when the call is made on behalf
    /// of a token.
    fn secrets<'a>(&'a self, token: Option<&'a Credential>) -> Secrets<'a> {
        let secrets = Secrets::new(self.consumer_key.as_str(), self.consumer_secret.as_str());
        match token {
            Some(token) => secrets.token(token.token.as_str(), token.secret.as_str()),
            None => secrets,
        }
    }

    /// Signed GET against one of the token endpoints. `oauth_*` parameters
    /// in `extra` are carried in the signed Authorization header.
    async fn exchange(
        &self,
        kind: CredentialKind,
        endpoint: &str,
        token: Option<&Credential>,
        extra: &[(&str, &str)],
    ) -> Result<Credential> {
        let url = self.oauth_url(endpoint);
        let mut request = self.client.clone().oauth1(self.secrets(token)).get(&url);
        if !extra.is_empty() {
            request = request.query(extra);
        }

        debug!(url = %url, kind = %kind, "Requesting token");
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {} token request", kind))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status != StatusCode::OK {
            return Err(ApiError::ExchangeFailed {
                kind,
                message: ApiError::server_message(&body),
            }
            .into());
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("Malformed {} token response: {}", kind, e)))?;
        Ok(Credential::new(kind, parsed.oauth_token, parsed.oauth_token_secret))
    }

    /// The stored session token, or a freshly escalated one.
    pub async fn session_credential(&self) -> Result<Credential> {
        match self.store.load(CredentialKind::Session)? {
            Some(credential) => Ok(credential),
            None => self.escalate_to_session(None).await,
        }
    }

    /// Obtain and persist a request token using out-of-band callback mode.
    pub async fn request_credential(&self) -> Result<Credential> {
        self.operator.notice("Getting request token...");
        let credential = self
            .exchange(
                CredentialKind::Request,
                "get_request_token",
                None,
                &[("oauth_callback", "oob")],
            )
            .await?;
        self.store.save(&credential)?;
        info!(kind = %credential.kind, "Stored token");
        self.operator
            .notice(&format!("Request Token:        {}\n", credential.token));
        Ok(credential)
    }

    /// Turn a request token into an access token. Needs the user to authorize
    /// the request token in the browser and type in the verification code.
    pub async fn escalate_to_access(&self, existing_request: Option<Credential>) -> Result<Credential> {
        let request = match existing_request {
            Some(credential) => credential,
            None => self.request_credential().await?,
        };

        let authorize_url = self.config.authorize_url(&request.token)?;
        let verifier = self.operator.verification_code(&authorize_url)?;

        self.store.delete(CredentialKind::Access)?;
        let access = self
            .exchange(
                CredentialKind::Access,
                "get_access_token",
                Some(&request),
                &[("oauth_verifier", verifier.as_str())],
            )
            .await?;
        self.store.save(&access)?;
        info!(kind = %access.kind, "Stored token");

        self.operator.notice(&format!(
            "Access Token:        {}\n\n\
             This access token will not expire but may be revoked\n\
             by the user or the service provider. It may be used to\n\
             obtain temporary session tokens.",
            access.token
        ));
        Ok(access)
    }

    /// Replace the session token, escalating to an access token first if
    /// none is supplied or stored.
    pub async fn escalate_to_session(&self, existing_access: Option<Credential>) -> Result<Credential> {
        self.store.delete(CredentialKind::Session)?;

        let access = match existing_access {
            Some(credential) => credential,
            None => match self.store.load(CredentialKind::Access)? {
                Some(credential) => credential,
                None => self.escalate_to_access(None).await?,
            },
        };

        self.operator
            .notice("Now requesting session token using access token...\n");
        self.operator.pause()?;

        let session = self
            .exchange(CredentialKind::Session, "get_session_token", Some(&access), &[])
            .await?;
        self.store.save(&session)?;
        info!(kind = %session.kind, "Stored token");

        self.operator.notice(&format!(
            "Session Token:        {}\n\n\
             This session token will expire in 12 hours (default).\n\
             It should be used with the secret to sign any requests\n\
             to the API.",
            session.token
        ));
        Ok(session)
    }

    /// Send one signed request. A stale session token is renewed and the
    /// request repeated, at most once.
    pub async fn invoke(
        &self,
        route: &str,
        method: HttpMethod,
        credential: &Credential,
        payload: Option<&Payload>,
    ) -> Result<ApiResponse> {
        let url = self.route_url(route);
        self.operator
            .notice(&format!("Accessing authenticated resource ({})...\n", url));

        let mut credential = credential.clone();
        let mut renewals = 0;
        loop {
            match self.attempt(&url, method, &credential, payload).await? {
                Attempt::Done(response) => return Ok(response),
                Attempt::Expired(message) => {
                    if renewals >= MAX_SESSION_RENEWALS {
                        return Err(ApiError::SessionRejected(message).into());
                    }
                    renewals += 1;
                    warn!(url = %url, message = %message, "Session token rejected, renewing");
                    self.operator
                        .notice("Invalid session token, requesting new one...\n");
                    credential = self.escalate_to_session(None).await?;
                }
            }
        }
    }

    async fn attempt(
        &self,
        url: &str,
        method: HttpMethod,
        credential: &Credential,
        payload: Option<&Payload>,
    ) -> Result<Attempt> {
        let form: &[(String, String)] = match payload {
            Some(payload) if method.has_body() => payload.fields(),
            _ => &[],
        };
        let oauth = self.client.clone().oauth1(self.secrets(Some(credential)));
        let mut request = match method {
            HttpMethod::Get => oauth.get(url),
            HttpMethod::Post => oauth.post(url),
            HttpMethod::Put => oauth.put(url),
            HttpMethod::Delete => oauth.delete(url),
        };
        if method.has_body() {
            request = request.form(&form);
        }

        debug!(url = url, method = %method, "Sending signed request");
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            return Ok(Attempt::Done(ApiResponse::from_response(response).await?));
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::BAD_REQUEST => Err(ApiError::BadRequest(ApiError::server_message(&body)).into()),
            StatusCode::UNAUTHORIZED => {
                let message = ApiError::server_message(&body);
                if message.contains(UNAUTHORIZED_MARKER) {
                    Err(ApiError::AccessDenied(message).into())
                } else {
                    Ok(Attempt::Expired(message))
                }
            }
            _ => Err(ApiError::Unexpected {
                status: status.as_u16(),
                body,
            }
            .into()),
        }
    }

    /// Call a route with the best available session token.
    pub async fn call(
        &self,
        route: &str,
        method: HttpMethod,
        payload: Option<&Payload>,
    ) -> Result<ApiResponse> {
        let credential = self.session_credential().await?;
        self.invoke(route, method, &credential, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;

    struct SilentOperator;

    impl Operator for SilentOperator {
        fn verification_code(&self, _authorize_url: &str) -> Result<String> {
            Ok("1234".to_string())
        }
    }

    fn manager(config: ClientConfig) -> Result<TokenManager> {
        TokenManager::new(
            config,
            Box::new(MemoryCredentialStore::new()),
            Box::new(SilentOperator),
        )
    }

    fn configured() -> ClientConfig {
        ClientConfig {
            rest_url: "http://rest.example.org".to_string(),
            consumer_key: Some("key".to_string()),
            consumer_secret: Some("secret".to_string()),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn test_requires_consumer() {
        assert!(manager(ClientConfig::default()).is_err());
    }

    #[test]
    fn test_route_url() {
        let manager = manager(configured()).unwrap();
        assert_eq!(
            manager.route_url("submissions"),
            "http://rest.example.org/db/pubmlst_test_seqdef/submissions"
        );
        assert_eq!(
            manager.route_url("/submissions"),
            "http://rest.example.org/db/pubmlst_test_seqdef/submissions"
        );
        assert_eq!(manager.route_url(""), "http://rest.example.org/db/pubmlst_test_seqdef");
    }

    #[test]
    fn test_oauth_url() {
        let manager = manager(configured()).unwrap();
        assert_eq!(
            manager.oauth_url("get_session_token"),
            "http://rest.example.org/db/pubmlst_test_seqdef/oauth/get_session_token"
        );
    }
}
