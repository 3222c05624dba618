use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use onoma::api::{OnomaClient, Service, DEFAULT_BASE_URL};
use onoma::config::RunConfig;
use onoma::digest::{DigestAlgo, TextDigest};
use onoma::pipeline::Pipeline;
use onoma::record::InputFormat;

/// Bulk name scoring against the Onoma API.
#[derive(Debug, Parser)]
#[command(name = "onoma", version, about)]
struct Cli {
    /// API key (or set ONOMA_API_KEY).
    #[arg(short = 'a', long, env = "ONOMA_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Input file, one record per line.
    #[arg(short = 'i', long)]
    input_file: PathBuf,

    /// Output file (default: <input>.<service>[.digest].onoma).
    #[arg(short = 'w', long)]
    output_file: Option<PathBuf>,

    /// Replace an existing output file.
    #[arg(short = 'o', long)]
    overwrite: bool,

    /// Resume a previous run, appending to its output file. Requires --uid.
    #[arg(short = 'r', long)]
    resume: bool,

    /// Column layout of the input file.
    #[arg(short = 'f', long, value_enum, default_value_t = InputFormat::FnLn)]
    input_format: InputFormat,

    /// Write a header line before the first data row.
    #[arg(long)]
    header: bool,

    /// The first input column is a caller-supplied uid.
    #[arg(short = 'u', long)]
    uid: bool,

    /// Digest name fields in the output instead of writing them in clear.
    #[arg(short = 'd', long)]
    digest: bool,

    /// Digest algorithm used with --digest.
    #[arg(long, value_enum, default_value_t = DigestAlgo::Md5)]
    digest_algo: DigestAlgo,

    /// Scoring service to run.
    #[arg(short = 's', long, value_enum)]
    service: Service,

    /// Default ISO2 country code for records with a blank geo column.
    #[arg(long)]
    country_iso2: Option<String>,

    /// Column separator.
    #[arg(long, default_value_t = '|')]
    separator: char,

    /// Skip malformed lines instead of aborting.
    #[arg(long)]
    skip_errors: bool,

    /// API base URL.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        let digest = if self.digest {
            TextDigest::from_algo(self.digest_algo)
        } else {
            TextDigest::Identity
        };
        RunConfig {
            api_key: self.api_key,
            base_url: self.base_url,
            input_file: self.input_file,
            output_file: self.output_file,
            input_format: self.input_format,
            service: self.service,
            overwrite: self.overwrite,
            resume: self.resume,
            with_uid: self.uid,
            header: self.header,
            digest,
            default_country: self.country_iso2,
            separator: self.separator,
            skip_errors: self.skip_errors,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config();

    let client = match OnomaClient::new(&config.api_key, &config.base_url, config.timeout) {
        Ok(client) => client,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    match Pipeline::run(&config, &client).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
