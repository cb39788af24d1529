//! Form payloads for authenticated POST/PUT requests.
//!
//! Submissions take sequences, allelic profiles and isolate records as plain
//! text fields, arbitrary files as base64 in `upload`, plus free-form
//! `key=value` arguments.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};

use super::ApiError;

/// Files and arguments selected on the command line.
#[derive(Debug, Clone, Default)]
pub struct UploadSources {
    pub sequence_file: Option<PathBuf>,
    pub profiles_file: Option<PathBuf>,
    pub isolates_file: Option<PathBuf>,
    pub file: Option<PathBuf>,
    /// `type=alleles&software=Enterobase` style argument string.
    pub arguments: Option<String>,
}

/// Ordered form fields; setting an existing key replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    fields: Vec<(String, String)>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(field) => field.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Add `key=value` pairs separated by `&`. A pair without `=` becomes a
    /// key with an empty value.
    pub fn add_arguments(&mut self, arguments: &str) {
        for pair in arguments.split('&').filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some((key, value)) => self.set(key, value),
                None => self.set(pair, ""),
            }
        }
    }

    /// Read a text file into `field`.
    pub fn add_text_file(&mut self, field: &str, label: &'static str, path: &Path) -> Result<()> {
        Self::ensure_exists(label, path)?;
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.set(field, data);
        Ok(())
    }

    /// Read any file and store it base64-encoded in `field`.
    pub fn add_binary_file(&mut self, field: &str, label: &'static str, path: &Path) -> Result<()> {
        Self::ensure_exists(label, path)?;
        let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        self.set(field, STANDARD.encode(data));
        Ok(())
    }

    fn ensure_exists(label: &'static str, path: &Path) -> Result<()> {
        if path.exists() {
            Ok(())
        } else {
            Err(ApiError::LocalFileMissing {
                label,
                path: path.to_path_buf(),
            }
            .into())
        }
    }

    pub fn from_sources(sources: &UploadSources) -> Result<Self> {
        let mut payload = Self::new();
        if let Some(ref path) = sources.sequence_file {
            payload.add_text_file("sequences", "Sequence file", path)?;
        }
        if let Some(ref path) = sources.profiles_file {
            payload.add_text_file("profiles", "Profiles file", path)?;
        }
        if let Some(ref path) = sources.isolates_file {
            payload.add_text_file("isolates", "Isolates file", path)?;
        }
        if let Some(ref path) = sources.file {
            payload.add_binary_file("upload", "File", path)?;
        }
        if let Some(ref arguments) = sources.arguments {
            payload.add_arguments(arguments);
        }
        Ok(payload)
    }
}
