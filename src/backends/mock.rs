use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{DnsProvider, DnsRecord, ProviderKind};
use crate::err::*;

use async_trait::async_trait;

/// Applies updates to its own records, so repeated runs see the new content.
#[derive(Debug, Default)]
pub struct MockProvider {
    zones: HashMap<String, String>,
    records: Mutex<HashMap<String, Vec<DnsRecord>>>,
    fail_updates: bool,
    list_calls: AtomicUsize,
    zone_calls: AtomicUsize,
    update_calls: AtomicUsize,
    updated: Mutex<Vec<(String, String, DnsRecord)>>,
}

pub fn record(zone_id: &str, id: &str, dns_type: &str, name: &str, content: &str) -> DnsRecord {
    DnsRecord {
        zone_id: zone_id.to_owned(),
        id: id.to_owned(),
        name: name.to_owned(),
        dns_type: dns_type.to_owned(),
        content: content.to_owned(),
        ttl: Some(1),
        proxied: Some(false),
        modified_on: None,
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(mut self, name: &str, id: &str, records: Vec<DnsRecord>) -> Self {
        self.zones.insert(name.to_owned(), id.to_owned());
        self.records
            .get_mut()
            .expect("mock lock")
            .insert(id.to_owned(), records);
        self
    }

    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn zone_calls(&self) -> usize {
        self.zone_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn updated(&self) -> Vec<(String, String, DnsRecord)> {
        self.updated.lock().expect("mock lock").clone()
    }
}

#[async_trait]
impl DnsProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Cloudflare
    }

    async fn zone_id_by_name(&self, zone: &str) -> Result<String> {
        self.zone_calls.fetch_add(1, Ordering::SeqCst);
        self.zones
            .get(zone)
            .cloned()
            .ok_or_else(|| AppErr::ZoneNotFound(zone.to_owned()))
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .expect("mock lock")
            .get(zone_id)
            .cloned()
            .ok_or_else(|| AppErr::provider(format!("unknown zone id {}", zone_id)))
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &DnsRecord,
    ) -> Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates {
            return Err(AppErr::provider("scripted update failure"));
        }

        self.updated.lock().expect("mock lock").push((
            zone_id.to_owned(),
            record_id.to_owned(),
            record.clone(),
        ));

        let mut records = self.records.lock().expect("mock lock");
        if let Some(stored) = records
            .get_mut(zone_id)
            .and_then(|rs| rs.iter_mut().find(|r| r.id == record_id))
        {
            stored.content = record.content.clone();
        }
        Ok(())
    }
}
