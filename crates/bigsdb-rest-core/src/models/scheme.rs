use serde::Deserialize;

/// Response of a database's `schemes` link.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemeList {
    #[serde(default)]
    pub schemes: Vec<SchemeSummary>,
    pub records: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemeSummary {
    /// URI of the scheme, e.g. `.../db/pubmlst_test_seqdef/schemes/1`.
    pub scheme: String,
    pub description: String,
}

/// Response of `GET /db/{db}/schemes/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemeDetail {
    pub description: Option<String>,
    /// Locus URIs, in scheme order.
    #[serde(default)]
    pub loci: Vec<String>,
    pub locus_count: Option<u64>,
}
