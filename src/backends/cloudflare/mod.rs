mod restful;

use std::fmt;

use super::{DnsProvider, DnsRecord, ProviderKind};
use crate::err::*;
use restful::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

const RECORDS_PER_PAGE: u32 = 100;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Auth {
    ApiToken {
        api_token: String,
    },
    ApiKey {
        api_key: String,
        account_email: String,
    },
}

impl Auth {
    fn http_headers(&self) -> Vec<(String, String)> {
        match self {
            Self::ApiToken { api_token } => {
                vec![("Authorization".to_string(), format!("Bearer {}", api_token))]
            }
            Self::ApiKey {
                api_key,
                account_email,
            } => vec![
                ("X-Auth-Email".to_string(), account_email.clone()),
                ("X-Auth-Key".to_string(), api_key.clone()),
            ],
        }
    }
}

// secrets stay out of logs
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiToken { .. } => f
                .debug_struct("ApiToken")
                .field("api_token", &"<REDACTED>")
                .finish(),
            Self::ApiKey { account_email, .. } => f
                .debug_struct("ApiKey")
                .field("api_key", &"<REDACTED>")
                .field("account_email", account_email)
                .finish(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ZoneEntry {
    id: String,
    name: String,
}

/// Body of `PUT /zones/:zone_id/dns_records/:id`.
#[derive(Debug, Serialize)]
struct RecordUpdate<'a> {
    #[serde(rename = "type")]
    dns_type: &'a str,
    name: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxied: Option<bool>,
}

pub struct Cloudflare {
    api: Restful,
    auth: Auth,
}

impl fmt::Debug for Cloudflare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cloudflare")
            .field("base_url", &self.api.base_url())
            .field("auth", &self.auth)
            .finish()
    }
}

impl Cloudflare {
    pub fn new(auth: Auth, client: reqwest::Client) -> Self {
        Self::with_base_url(auth, client, CLOUDFLARE_API_BASE)
    }

    pub fn with_base_url(auth: Auth, client: reqwest::Client, base_url: &str) -> Self {
        let api = Restful::new(
            client,
            base_url.trim_end_matches('/'),
            auth.http_headers(),
        );
        Self { api, auth }
    }
}

#[async_trait]
impl DnsProvider for Cloudflare {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Cloudflare
    }

    async fn zone_id_by_name(&self, zone: &str) -> Result<String> {
        let resp: Envelope<Vec<ZoneEntry>> = self
            .api
            .get("/zones", &[("name", zone.to_owned())])
            .await?;

        let zone_entry = resp
            .result
            .unwrap_or_default()
            .into_iter()
            .find(|z| z.name.eq_ignore_ascii_case(zone))
            .ok_or_else(|| AppErr::ZoneNotFound(zone.to_owned()))?;

        debug!("zone {} has id {}", zone_entry.name, zone_entry.id);
        Ok(zone_entry.id)
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
        let path = format!("/zones/{}/dns_records", zone_id);
        let mut records = Vec::new();
        let mut page: u32 = 1;

        loop {
            let resp: Envelope<Vec<DnsRecord>> = self
                .api
                .get(
                    &path,
                    &[
                        ("page", page.to_string()),
                        ("per_page", RECORDS_PER_PAGE.to_string()),
                    ],
                )
                .await?;

            let batch = resp.result.ok_or(AppErr::provider(
                "list dns records, and there is no 'result' field in the returned json",
            ))?;
            records.extend(batch);

            match resp.result_info {
                Some(info) if page < info.total_pages => page += 1,
                _ => break,
            }
        }

        // Newer API versions no longer echo zone_id on each record.
        for record in records.iter_mut().filter(|r| r.zone_id.is_empty()) {
            record.zone_id = zone_id.to_owned();
        }

        debug!("zone {} has {} records", zone_id, records.len());
        Ok(records)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &DnsRecord,
    ) -> Result<()> {
        let path = format!("/zones/{}/dns_records/{}", zone_id, record_id);
        let body = RecordUpdate {
            dns_type: &record.dns_type,
            name: &record.name,
            content: &record.content,
            ttl: record.ttl,
            proxied: record.proxied,
        };

        let _: Envelope<serde_json::Value> = self.api.put(&path, &body).await?;
        info!(
            "updated {} {} ({}) to {}",
            record.dns_type, record.name, record_id, record.content
        );
        Ok(())
    }
}
