use serde::Deserialize;

/// Response of `GET /db/{db}/loci`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LociList {
    #[serde(default)]
    pub loci: Vec<String>,
    pub records: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Locus {
    pub id: String,
    /// Link to the FASTA of all alleles; null when the locus has none defined.
    pub alleles_fasta: Option<String>,
}
