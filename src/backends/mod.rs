mod cloudflare;
#[cfg(test)]
pub(crate) mod mock;

pub use cloudflare::*;

use std::fmt;
use std::str::FromStr;

use crate::err::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    #[serde(default)]
    pub zone_id: String,

    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(rename(serialize = "type", deserialize = "type"))]
    pub dns_type: String,

    #[serde(default)]
    pub content: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<String>,
}

#[async_trait]
pub trait DnsProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn zone_id_by_name(&self, zone: &str) -> Result<String>;

    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>>;

    async fn update_record(&self, zone_id: &str, record_id: &str, record: &DnsRecord)
        -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Cloudflare,
}

impl FromStr for ProviderKind {
    type Err = AppErr;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cloudflare" | "cf" => Ok(Self::Cloudflare),
            _ => Err(AppErr::config(format!("unknown dns provider '{}'", s))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cloudflare => f.write_str("cloudflare"),
        }
    }
}

#[derive(Debug)]
pub enum Backend {
    Cloudflare(Cloudflare),
}

#[async_trait]
impl DnsProvider for Backend {
    fn kind(&self) -> ProviderKind {
        match self {
            Backend::Cloudflare(cloudflare) => cloudflare.kind(),
        }
    }

    async fn zone_id_by_name(&self, zone: &str) -> Result<String> {
        match self {
            Backend::Cloudflare(cloudflare) => cloudflare.zone_id_by_name(zone).await,
        }
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
        match self {
            Backend::Cloudflare(cloudflare) => cloudflare.list_records(zone_id).await,
        }
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &DnsRecord,
    ) -> Result<()> {
        match self {
            Backend::Cloudflare(cloudflare) => {
                cloudflare.update_record(zone_id, record_id, record).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parses_case_insensitively() {
        assert_eq!(
            "Cloudflare".parse::<ProviderKind>().unwrap(),
            ProviderKind::Cloudflare
        );
        assert!("route53".parse::<ProviderKind>().unwrap_err().is_config());
    }

    #[test]
    fn record_reads_cloudflare_listing_entry() {
        let json = r#"{
            "id": "372e67954025e0ba6aaa6d586b9e0b59",
            "zone_id": "023e105f4ecef8ad9ca31a8372d0c353",
            "zone_name": "example.com",
            "name": "home.example.com",
            "type": "A",
            "content": "198.51.100.4",
            "proxiable": true,
            "proxied": false,
            "ttl": 1,
            "modified_on": "2014-01-01T05:20:00.12345Z"
        }"#;
        let record: DnsRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.dns_type, "A");
        assert_eq!(record.content, "198.51.100.4");
        assert_eq!(record.ttl, Some(1));
        assert_eq!(record.proxied, Some(false));
    }
}
