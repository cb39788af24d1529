//! Shared helpers: an in-process stub of the REST server on an ephemeral port,
//! and the server side of OAuth 1.0a signature checking.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;

use axum::http::{header, HeaderMap};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine};
use bigsdb_rest_core::ClientConfig;
use hmac::{Hmac, Mac};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;
use tokio::net::TcpListener;

pub const DATABASE: &str = "pubmlst_test_seqdef";
pub const CONSUMER_KEY: &str = "test-consumer";
pub const CONSUMER_SECRET: &str = "test-consumer-secret";

/// RFC 3986 unreserved characters pass through.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Bind to a free port, build the router with the resulting base URL and
/// serve it in the background. Returns the base URL.
pub async fn serve<F>(build: F) -> String
where
    F: FnOnce(String) -> Router,
{
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let base = format!("http://{}", listener.local_addr().expect("No local address"));
    let app = build(base.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub server failed");
    });
    base
}

pub fn config(base: &str, token_dir: &Path) -> ClientConfig {
    ClientConfig {
        rest_url: base.to_string(),
        web_url: format!("{}/bigsdb", base),
        database: DATABASE.to_string(),
        consumer_key: Some(CONSUMER_KEY.to_string()),
        consumer_secret: Some(CONSUMER_SECRET.to_string()),
        token_dir: token_dir.to_path_buf(),
        request_timeout_secs: 5,
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

fn decode(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// Protocol parameters of a request: the fields of its `Authorization: OAuth`
/// header, plus any `oauth_*` parameters sent in the query string.
pub fn oauth_params(headers: &HeaderMap, query: &HashMap<String, String>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let fields = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("OAuth "));
    if let Some(fields) = fields {
        for field in fields.split(',') {
            if let Some((key, quoted)) = field.trim().split_once('=') {
                params.insert(decode(key), decode(quoted.trim_matches('"')));
            }
        }
    }
    for (key, value) in query {
        if key.starts_with("oauth_") {
            params.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    params
}

pub fn oauth_param(headers: &HeaderMap, query: &HashMap<String, String>, name: &str) -> Option<String> {
    oauth_params(headers, query).remove(name)
}

pub fn signature_base_string(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> =
        params.iter().map(|(k, v)| (encode(k), encode(v))).collect();
    encoded.sort();
    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}&{}&{}", method, encode(url), encode(&normalized))
}

pub fn hmac_sha1_signature(base: &str, consumer_secret: &str, token_secret: &str) -> String {
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes()).expect("HMAC takes any key length");
    mac.update(base.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Recompute the signature of a request from everything it sent (protocol
/// parameters, query and form body) and compare it with the one it carries.
pub fn signature_matches(
    method: &str,
    url: &str,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
    form: &[(String, String)],
    token_secret: &str,
) -> bool {
    let mut oauth = oauth_params(headers, query);
    let Some(signature) = oauth.remove("oauth_signature") else {
        return false;
    };
    oauth.remove("realm");

    let mut params: Vec<(String, String)> = oauth.into_iter().collect();
    params.extend(
        query
            .iter()
            .filter(|(k, _)| !k.starts_with("oauth_"))
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    params.extend(form.iter().cloned());

    let base = signature_base_string(method, url, &params);
    hmac_sha1_signature(&base, CONSUMER_SECRET, token_secret) == signature
}
