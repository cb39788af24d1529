//! Data models for BIGSdb REST documents.
//!
//! - `Resource`, `DatabaseLink`, `DatabaseAttributes`: the resource index and
//!   per-database link documents
//! - `SchemeList`, `SchemeSummary`, `SchemeDetail`: typing schemes
//! - `LociList`, `Locus`: loci and their allele FASTA links

pub mod database;
pub mod locus;
pub mod scheme;

pub use database::{DatabaseAttributes, DatabaseLink, Resource};
pub use locus::{LociList, Locus};
pub use scheme::{SchemeDetail, SchemeList, SchemeSummary};
