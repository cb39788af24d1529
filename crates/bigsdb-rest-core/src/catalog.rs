//! Scheme catalog across every sequence definition database of a site.

use std::fmt;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::api::ApiClient;
use crate::models::{DatabaseAttributes, DatabaseLink, SchemeList};

/// Include/exclude terms applied to scheme descriptions. Terms are regular
/// expressions searched anywhere in the description.
#[derive(Debug, Clone, Default)]
pub struct SchemeFilter {
    matching: Option<Regex>,
    excluding: Option<Regex>,
}

impl SchemeFilter {
    pub fn new(match_term: Option<&str>, exclude_term: Option<&str>) -> Result<Self> {
        let compile = |term: Option<&str>| -> Result<Option<Regex>> {
            term.map(|t| Regex::new(t).with_context(|| format!("Invalid pattern: {}", t)))
                .transpose()
        };
        Ok(Self {
            matching: compile(match_term)?,
            excluding: compile(exclude_term)?,
        })
    }

    pub fn accepts(&self, description: &str) -> bool {
        if let Some(ref re) = self.matching {
            if !re.is_match(description) {
                return false;
            }
        }
        if let Some(ref re) = self.excluding {
            if re.is_match(description) {
                return false;
            }
        }
        true
    }
}

/// One listed scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeEntry {
    pub database: String,
    pub description: String,
    pub uri: String,
}

impl fmt::Display for SchemeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.database, self.description, self.uri)
    }
}

/// Schemes of one database that pass the filter, in server order.
pub fn filter_schemes(database: &str, list: &SchemeList, filter: &SchemeFilter) -> Vec<SchemeEntry> {
    list.schemes
        .iter()
        .filter(|s| filter.accepts(&s.description))
        .map(|s| SchemeEntry {
            database: database.to_string(),
            description: s.description.clone(),
            uri: s.scheme.clone(),
        })
        .collect()
}

pub async fn database_schemes(
    client: &ApiClient,
    database: &DatabaseLink,
    filter: &SchemeFilter,
) -> Result<Vec<SchemeEntry>> {
    let attributes = client.get_json_at::<DatabaseAttributes>(&database.href).await?;
    let Some(schemes_url) = attributes.schemes else {
        debug!(database = %database.description, "No schemes link");
        return Ok(Vec::new());
    };
    let list = client.schemes_at(&schemes_url).await?;
    debug!(database = %database.description, records = ?list.records, "Fetched schemes");
    Ok(filter_schemes(&database.description, &list, filter))
}

/// Walk the resource index and list matching schemes of every sequence
/// definition database.
pub async fn matching_schemes(client: &ApiClient, filter: &SchemeFilter) -> Result<Vec<SchemeEntry>> {
    let mut entries = Vec::new();
    for resource in client.resources().await? {
        for database in resource.databases.iter().filter(|db| db.is_seqdef()) {
            entries.extend(database_schemes(client, database, filter).await?);
        }
    }
    Ok(entries)
}
