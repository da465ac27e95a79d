use std::path::PathBuf;

use crate::config::FailurePolicy;
use crate::ip_source::SourceKind;

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Options {
    /// Optional YAML file; command line and environment values win over it
    #[arg(short, long, env = "DDNS_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    #[arg(long, env = "CLOUDFLARE_API_TOKEN", hide_env_values = true)]
    pub cloudflare_api_token: Option<String>,

    #[arg(long, env = "CLOUDFLARE_API_KEY", hide_env_values = true)]
    pub cloudflare_api_key: Option<String>,

    #[arg(long, env = "CLOUDFLARE_EMAIL")]
    pub cloudflare_email: Option<String>,

    /// Cloudflare DNS zone (your domain)
    #[arg(long, env = "CLOUDFLARE_ZONE")]
    pub cloudflare_zone: Option<String>,

    /// Single record to keep updated, as "TYPE subdomain.domain"
    #[arg(long, env = "CLOUDFLARE_RECORD")]
    pub cloudflare_record: Option<String>,

    /// Record to keep updated, as provider:zone:type:name (repeatable)
    #[arg(short, long = "target", env = "DDNS_TARGETS", value_delimiter = ',')]
    pub targets: Vec<String>,

    /// IP echo services to ask (default: all)
    #[arg(long = "ip-source", value_enum, value_delimiter = ',')]
    pub ip_sources: Vec<SourceKind>,

    /// Per-source timeout in seconds
    #[arg(long)]
    pub source_timeout: Option<u64>,

    /// What to do when one of several targets fails
    #[arg(long, value_enum)]
    pub on_error: Option<FailurePolicy>,

    /// Print DNS records and exit
    #[arg(long)]
    pub print_records: bool,

    /// Dry run
    #[arg(long, overrides_with = "no_dry")]
    pub dry: bool,

    /// Apply updates even if the config file asks for a dry run
    #[arg(long, overrides_with = "dry")]
    pub no_dry: bool,

    /// Seconds between runs; 0 runs once
    #[arg(long)]
    pub check_interval: Option<u64>,

    #[arg(short, long)]
    pub log_level: Option<tracing::Level>,
}
