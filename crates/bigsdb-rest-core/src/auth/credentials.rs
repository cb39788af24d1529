use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use keyring::Entry;

use crate::api::ApiError;
use crate::config::ClientConfig;

/// Prefix of keychain service names
pub const KEYRING_SERVICE: &str = "bigsdb-rest";

/// The three OAuth 1.0a token tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    Request,
    Access,
    Session,
}

impl CredentialKind {
    pub const ALL: [CredentialKind; 3] = [
        CredentialKind::Request,
        CredentialKind::Access,
        CredentialKind::Session,
    ];

    /// Storage name: the file name for file stores, the entry name for the keyring.
    pub fn file_name(&self) -> &'static str {
        match self {
            CredentialKind::Request => "request_token",
            CredentialKind::Access => "access_token",
            CredentialKind::Session => "session_token",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CredentialKind::Request => "request",
            CredentialKind::Access => "access",
            CredentialKind::Session => "session",
        })
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub kind: CredentialKind,
    pub token: String,
    pub secret: String,
}

// Secrets stay out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("kind", &self.kind)
            .field("token", &self.token)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Credential {
    pub fn new(kind: CredentialKind, token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            kind,
            token: token.into(),
            secret: secret.into(),
        }
    }

    /// Two-line `token=...` / `secret=...` representation.
    pub fn to_file_contents(&self) -> String {
        format!("token={}\nsecret={}\n", self.token, self.secret)
    }

    /// Parse the two-line format. Returns `None` unless both a token and a
    /// secret are present and non-empty.
    pub fn parse(kind: CredentialKind, contents: &str) -> Option<Self> {
        let mut token = None;
        let mut secret = None;
        for line in contents.lines() {
            match line.trim_end_matches('\r').split_once('=') {
                Some(("token", value)) => token = Some(value.to_string()),
                Some(("secret", value)) => secret = Some(value.to_string()),
                _ => {}
            }
        }
        match (token, secret) {
            (Some(token), Some(secret)) if !token.is_empty() && !secret.is_empty() => {
                Some(Self::new(kind, token, secret))
            }
            _ => None,
        }
    }
}

/// Where credentials persist between runs. One credential per kind.
pub trait CredentialStore: Send + Sync {
    fn load(&self, kind: CredentialKind) -> Result<Option<Credential>>;

    /// Store a credential, replacing any previous one of the same kind.
    fn save(&self, credential: &Credential) -> Result<()>;

    /// Remove the credential of this kind; removing nothing is not an error.
    fn delete(&self, kind: CredentialKind) -> Result<()>;
}

/// Plain files named after the kind, in a single directory.
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, kind: CredentialKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self, kind: CredentialKind) -> Result<Option<Credential>> {
        let path = self.path(kind);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read token file {}", path.display()))?;
        Ok(Credential::parse(kind, &contents))
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(credential.kind);
        std::fs::write(&path, credential.to_file_contents())
            .with_context(|| format!("Failed to write token file {}", path.display()))?;
        Ok(())
    }

    fn delete(&self, kind: CredentialKind) -> Result<()> {
        let path = self.path(kind);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove token file {}", path.display()))?;
        }
        Ok(())
    }
}

/// Process-local store, nothing touches disk.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<HashMap<CredentialKind, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(credentials: impl IntoIterator<Item = Credential>) -> Self {
        let map = credentials.into_iter().map(|c| (c.kind, c)).collect();
        Self {
            credentials: Mutex::new(map),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<CredentialKind, Credential>>> {
        self.credentials
            .lock()
            .map_err(|_| ApiError::Store("credential map lock poisoned".to_string()).into())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self, kind: CredentialKind) -> Result<Option<Credential>> {
        Ok(self.lock()?.get(&kind).cloned())
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        self.lock()?.insert(credential.kind, credential.clone());
        Ok(())
    }

    fn delete(&self, kind: CredentialKind) -> Result<()> {
        self.lock()?.remove(&kind);
        Ok(())
    }
}

/// OS keychain, one entry per kind holding the two-line text.
pub struct KeyringCredentialStore {
    service: String,
}

impl KeyringCredentialStore {
    /// Fails when the build has no platform keychain backend: keyring's
    /// fallback mock keeps nothing between entries, so tokens would never
    /// be found again.
    pub fn new(service: impl Into<String>) -> Result<Self> {
        if !cfg!(feature = "keyring-native") {
            return Err(ApiError::Store(
                "No OS keychain backend in this build (enable the keyring-native feature, \
                 or keep tokens in files)"
                    .to_string(),
            )
            .into());
        }
        Ok(Self {
            service: service.into(),
        })
    }

    /// Store scoped to the configured REST installation and database.
    pub fn for_config(config: &ClientConfig) -> Result<Self> {
        Self::new(Self::service_name(config))
    }

    /// Keychain service name, e.g. `bigsdb-rest:https://rest.pubmlst.org/db/pubmlst_test_seqdef`.
    pub fn service_name(config: &ClientConfig) -> String {
        format!("{}:{}", KEYRING_SERVICE, config.db_url())
    }

    fn entry(&self, kind: CredentialKind) -> Result<Entry> {
        Entry::new(&self.service, kind.file_name())
            .map_err(|e| ApiError::Store(format!("Failed to create keyring entry: {}", e)).into())
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn load(&self, kind: CredentialKind) -> Result<Option<Credential>> {
        match self.entry(kind)?.get_password() {
            Ok(contents) => Ok(Credential::parse(kind, &contents)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ApiError::Store(format!(
                "Failed to retrieve {} token from keychain: {}",
                kind, e
            ))
            .into()),
        }
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        self.entry(credential.kind)?
            .set_password(&credential.to_file_contents())
            .map_err(|e| {
                ApiError::Store(format!("Failed to store token in keychain: {}", e)).into()
            })
    }

    fn delete(&self, kind: CredentialKind) -> Result<()> {
        match self.entry(kind)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ApiError::Store(format!(
                "Failed to delete {} token from keychain: {}",
                kind, e
            ))
            .into()),
        }
    }
}
