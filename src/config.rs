use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::backends::{Auth, ProviderKind};
use crate::err::*;
use crate::ip_source::SourceKind;
use crate::options::Options;

use clap::ValueEnum;
use serde::Deserialize;

const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 10;

/// One record to reconcile, written `provider:zone:type:name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub provider: ProviderKind,
    pub zone: String,
    pub dns_type: String,
    pub name: String,
}

impl FromStr for TargetSpec {
    type Err = AppErr;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(':').map(str::trim).collect();

        let [provider, zone, dns_type, name] = parts.as_slice() else {
            return Err(AppErr::config(format!(
                "target '{}' must have 4 parts (provider:zone:type:name), got {}",
                s,
                parts.len()
            )));
        };

        if parts.iter().any(|p| p.is_empty()) {
            return Err(AppErr::config(format!("target '{}' has an empty part", s)));
        }

        Ok(Self {
            provider: provider.parse()?,
            zone: zone.to_string(),
            dns_type: dns_type.to_uppercase(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.provider, self.zone, self.dns_type, self.name
        )
    }
}

impl TargetSpec {
    /// The `--cloudflare-zone` + `--cloudflare-record "TYPE name"` form.
    fn from_zone_record(zone: &str, record: &str) -> Result<Self> {
        let parts: Vec<&str> = record.split_whitespace().collect();
        let [dns_type, name] = parts.as_slice() else {
            return Err(AppErr::config(format!(
                "record '{}' must look like \"TYPE subdomain.domain\"",
                record
            )));
        };

        Ok(Self {
            provider: ProviderKind::Cloudflare,
            zone: zone.to_owned(),
            dns_type: dns_type.to_uppercase(),
            name: name.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the batch at the first failing target
    Stop,
    /// Reconcile every target, then report all failures
    Continue,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigYaml {
    authentication: Option<Auth>,
    zone: Option<String>,
    record: Option<String>,
    targets: Vec<String>,
    ip_sources: Vec<SourceKind>,
    source_timeout: Option<u64>,
    on_error: Option<FailurePolicy>,
    dry_run: bool,
    check_interval: Option<u64>,
}

impl ConfigYaml {
    pub fn from_yaml<P>(file: P) -> Result<ConfigYaml>
    where
        P: AsRef<Path>,
    {
        let path = file.as_ref();
        let file = File::open(path).map_err(|e| {
            AppErr::config(format!("open config file {}: {}", path.display(), e))
        })?;
        let file_reader = BufReader::new(file);

        let rval = serde_yaml::from_reader(file_reader)?;
        Ok(rval)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub auth: Auth,
    pub targets: Vec<TargetSpec>,
    /// Zones touched by this invocation, in first-seen order.
    pub zones: Vec<String>,
    pub on_error: FailurePolicy,
    pub ip_sources: Vec<SourceKind>,
    pub source_timeout: Duration,
    pub dry_run: bool,
    pub print_only: bool,
    pub check_interval: u64,
}

impl Config {
    pub fn load(opts: Options) -> Result<Config> {
        let file = match &opts.config_file {
            Some(path) => ConfigYaml::from_yaml(path)?,
            None => ConfigYaml::default(),
        };
        Self::build(opts, file)
    }

    pub fn build(opts: Options, file: ConfigYaml) -> Result<Config> {
        let auth = Self::auth(&opts).or(file.authentication);

        let zone = opts.cloudflare_zone.or(file.zone);
        let record = opts.cloudflare_record.or(file.record);
        let raw_targets = if opts.targets.is_empty() {
            file.targets
        } else {
            opts.targets
        };

        // The single-record form is fatal on any error; batches pick a policy.
        let (targets, on_error) = match (&record, raw_targets.is_empty()) {
            (Some(_), false) => {
                return Err(AppErr::config(
                    "use either a single record or a list of targets, not both",
                ))
            }
            (Some(record), true) => {
                let zone = zone.as_deref().ok_or(AppErr::config(
                    "a single record needs its zone (--cloudflare-zone)",
                ))?;
                let target = TargetSpec::from_zone_record(zone, record)?;
                (vec![target], FailurePolicy::Stop)
            }
            (None, _) => {
                let targets = raw_targets
                    .iter()
                    .map(|t| t.parse())
                    .collect::<Result<Vec<TargetSpec>>>()?;
                let policy = opts
                    .on_error
                    .or(file.on_error)
                    .unwrap_or(FailurePolicy::Continue);
                (targets, policy)
            }
        };

        let mut zones: Vec<String> = Vec::new();
        for z in targets.iter().map(|t| &t.zone).chain(zone.iter()) {
            if !zones.contains(z) {
                zones.push(z.clone());
            }
        }

        if opts.print_records {
            if zones.is_empty() {
                return Err(AppErr::config("nothing to print: no zone given"));
            }
        } else if targets.is_empty() {
            return Err(AppErr::config("no target records given"));
        }

        let auth = auth.ok_or(AppErr::config(
            "missing credentials: set an api token, or an api key with its account email",
        ))?;

        let ip_sources = if !opts.ip_sources.is_empty() {
            opts.ip_sources
        } else if !file.ip_sources.is_empty() {
            file.ip_sources
        } else {
            SourceKind::all()
        };

        let source_timeout = Duration::from_secs(
            opts.source_timeout
                .or(file.source_timeout)
                .unwrap_or(DEFAULT_SOURCE_TIMEOUT_SECS),
        );
        if source_timeout.is_zero() {
            return Err(AppErr::config("source timeout must be greater than 0"));
        }

        Ok(Config {
            auth,
            targets,
            zones,
            on_error,
            ip_sources,
            source_timeout,
            dry_run: match (opts.dry, opts.no_dry) {
                (true, _) => true,
                (_, true) => false,
                _ => file.dry_run,
            },
            print_only: opts.print_records,
            check_interval: opts.check_interval.or(file.check_interval).unwrap_or(0),
        })
    }

    fn auth(opts: &Options) -> Option<Auth> {
        if let Some(api_token) = opts.cloudflare_api_token.as_ref().filter(|t| !t.is_empty()) {
            return Some(Auth::ApiToken {
                api_token: api_token.clone(),
            });
        }

        match (&opts.cloudflare_api_key, &opts.cloudflare_email) {
            (Some(api_key), Some(email)) if !api_key.is_empty() && !email.is_empty() => {
                Some(Auth::ApiKey {
                    api_key: api_key.clone(),
                    account_email: email.clone(),
                })
            }
            _ => None,
        }
    }
}
