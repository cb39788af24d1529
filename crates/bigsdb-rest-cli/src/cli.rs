//! Command line definitions.

use std::path::PathBuf;

use bigsdb_rest_core::api::UploadSources;
use bigsdb_rest_core::HttpMethod;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bigsdb-rest", version)]
#[command(about = "Client for BIGSdb REST databases (PubMLST and compatible sites)")]
pub struct Cli {
    /// Root of the REST interface [default: https://rest.pubmlst.org]
    #[arg(long, global = true)]
    pub rest_url: Option<String>,

    /// Web front end hosting the client authorization page
    #[arg(long, global = true)]
    pub web_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List names and URIs of scheme definitions
    Schemes {
        /// Scheme name must include this term (regular expression)
        #[arg(long = "match")]
        match_term: Option<String>,

        /// Scheme name must not include this term (regular expression)
        #[arg(long)]
        exclude: Option<String>,
    },

    /// Download allele FASTA files from a sequence definition database
    DownloadAlleles {
        /// Database configuration name
        #[arg(long)]
        database: String,

        /// Output directory
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Only download loci belonging to this scheme
        #[arg(long, alias = "scheme_id")]
        scheme_id: Option<u32>,
    },

    /// Call an authenticated route, obtaining OAuth tokens as needed
    Request(RequestArgs),
}

#[derive(Debug, Args)]
pub struct RequestArgs {
    /// Relative path of route, e.g. 'submissions'
    #[arg(short, long, default_value = "")]
    pub route: String,

    /// HTTP method
    #[arg(short, long, default_value = "GET", value_parser = parse_method)]
    pub method: HttpMethod,

    /// Data to send with POST/PUT, e.g. 'type=alleles&software=Enterobase'
    #[arg(short, long)]
    pub arguments: Option<String>,

    /// File to upload (sent base64-encoded)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Tab-delimited file of isolate data to upload
    #[arg(short, long, alias = "isolates_file")]
    pub isolates_file: Option<PathBuf>,

    /// Tab-delimited file of allelic profiles to upload
    #[arg(short, long, alias = "profiles_file")]
    pub profiles_file: Option<PathBuf>,

    /// FASTA or single sequence file to upload
    #[arg(short, long, alias = "sequence_file")]
    pub sequence_file: Option<PathBuf>,

    /// Pause before each token request
    #[arg(long)]
    pub prompt: bool,

    /// Database configuration name [default: pubmlst_test_seqdef]
    #[arg(long)]
    pub database: Option<String>,

    /// Directory holding the token files [default: current directory]
    #[arg(long)]
    pub token_dir: Option<PathBuf>,

    /// Keep tokens in the OS keychain instead of files (needs a build with
    /// the keyring-native feature)
    #[arg(long, conflicts_with = "token_dir")]
    pub keyring: bool,
}

impl RequestArgs {
    pub fn upload_sources(&self) -> UploadSources {
        UploadSources {
            sequence_file: self.sequence_file.clone(),
            profiles_file: self.profiles_file.clone(),
            isolates_file: self.isolates_file.clone(),
            file: self.file.clone(),
            arguments: self.arguments.clone(),
        }
    }
}

fn parse_method(s: &str) -> Result<HttpMethod, String> {
    s.parse::<HttpMethod>().map_err(|e| e.to_string())
}
