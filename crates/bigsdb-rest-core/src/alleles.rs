//! Allele FASTA downloads, one `{locus}.fas` file per locus.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::api::{ApiClient, ApiError};

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub database: String,
    pub dir: PathBuf,
    /// Restrict to the loci of one scheme; all loci otherwise.
    pub scheme_id: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct DownloadSummary {
    pub written: Vec<PathBuf>,
    /// Loci without any defined alleles.
    pub skipped: Vec<String>,
}

/// Output file for a locus. The id comes from the server, so anything that
/// could name a file outside `dir` is refused.
pub fn fasta_path(dir: &Path, locus_id: &str) -> Result<PathBuf> {
    if locus_id.is_empty()
        || locus_id == "."
        || locus_id.contains("..")
        || locus_id.contains(['/', '\\'])
    {
        return Err(ApiError::InvalidResponse(format!("Unsafe locus id: {:?}", locus_id)).into());
    }
    Ok(dir.join(format!("{}.fas", locus_id)))
}

pub async fn download_alleles(client: &ApiClient, request: &DownloadRequest) -> Result<DownloadSummary> {
    // Fails with NotFound before anything is written
    client.database(&request.database).await?;

    let loci = match request.scheme_id {
        Some(id) => {
            let scheme = client.scheme(&request.database, id).await?;
            debug!(
                scheme = ?scheme.description,
                locus_count = ?scheme.locus_count,
                "Resolved scheme"
            );
            scheme.loci
        }
        None => {
            let list = client.loci(&request.database).await?;
            debug!(records = ?list.records, "Listed loci");
            list.loci
        }
    };
    debug!(database = %request.database, count = loci.len(), "Resolved loci");

    std::fs::create_dir_all(&request.dir)
        .with_context(|| format!("Failed to create output directory {}", request.dir.display()))?;

    let mut summary = DownloadSummary::default();
    for locus_url in &loci {
        let locus = client.locus_at(locus_url).await?;
        let Some(fasta_url) = locus.alleles_fasta else {
            debug!(locus = %locus.id, "No alleles defined");
            summary.skipped.push(locus.id);
            continue;
        };

        let path = fasta_path(&request.dir, &locus.id)?;
        let fasta = client.fasta_at(&fasta_url).await?;
        std::fs::write(&path, fasta)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(locus = %locus.id, path = %path.display(), "Wrote alleles");
        summary.written.push(path);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fasta_path() {
        assert_eq!(
            fasta_path(Path::new("out"), "abcZ").unwrap(),
            PathBuf::from("out/abcZ.fas")
        );
        assert_eq!(
            fasta_path(Path::new("out"), "NEIS0001").unwrap(),
            PathBuf::from("out/NEIS0001.fas")
        );
    }

    #[test]
    fn test_fasta_path_rejects_escaping_ids() {
        for id in ["../../etc/evil", "a/b", "a\\b", "..", ".", ""] {
            let err = fasta_path(Path::new("/tmp/out"), id).unwrap_err();
            assert!(
                matches!(err.downcast_ref::<ApiError>(), Some(ApiError::InvalidResponse(_))),
                "{:?} accepted",
                id
            );
        }
    }
}
