use std::collections::HashMap;

use crate::backends::{DnsProvider, DnsRecord};
use crate::config::{Config, FailurePolicy, TargetSpec};
use crate::consensus;
use crate::err::*;
use crate::ip_source::SharedSource;
use crate::reconcile::{reconcile, Outcome};
use crate::selector::select;

use tracing::{debug, error, info, warn};

#[derive(Debug)]
pub struct TargetReport {
    pub target: TargetSpec,
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub ip: Option<String>,
    pub targets: Vec<TargetReport>,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.targets.iter().filter(|t| t.outcome.is_failed()).count()
    }

    fn summary(&self) -> String {
        let (mut current, mut updated, mut simulated) = (0, 0, 0);
        for t in self.targets.iter() {
            match &t.outcome {
                Outcome::AlreadyCurrent => current += 1,
                Outcome::Updated { simulated: false } => updated += 1,
                Outcome::Updated { simulated: true } => simulated += 1,
                Outcome::Failed(_) => {}
            }
        }

        let mut line = format!(
            "{} target(s): {} up to date, {} updated",
            self.targets.len(),
            current,
            updated
        );
        if simulated > 0 {
            line.push_str(&format!(", {} updated (dry run)", simulated));
        }
        line.push_str(&format!(", {} failed", self.failures()));
        line
    }

    fn log_summary(&self) {
        for t in self.targets.iter() {
            if let Outcome::Failed(e) = &t.outcome {
                error!("[{}] {}", t.target, e);
            }
        }
        info!("{}", self.summary());
    }
}

/// One stateless pass over the configured targets against one provider.
pub struct Driver<'a, P: DnsProvider + ?Sized> {
    config: &'a Config,
    provider: &'a P,
    sources: &'a [SharedSource],
}

impl<'a, P: DnsProvider + ?Sized> Driver<'a, P> {
    pub fn new(config: &'a Config, provider: &'a P, sources: &'a [SharedSource]) -> Self {
        Self {
            config,
            provider,
            sources,
        }
    }

    // No consensus is always fatal, whatever the policy.
    pub async fn run(&self) -> Result<RunReport> {
        let mut zone_ids: HashMap<String, String> = HashMap::new();
        let mut report = RunReport::default();

        for target in self.config.targets.iter() {
            let record = match self.lookup(target, &mut zone_ids).await {
                Ok(record) => record,
                Err(e) if self.config.on_error == FailurePolicy::Stop => return Err(e),
                Err(e) => {
                    warn!("[{}] skipped: {}", target, e);
                    report.targets.push(TargetReport {
                        target: target.clone(),
                        outcome: Outcome::Failed(e),
                    });
                    continue;
                }
            };

            let ip = match report.ip.clone() {
                Some(ip) => ip,
                None => {
                    let consensus =
                        consensus::resolve(self.sources, self.config.source_timeout).await?;
                    debug!("tally: {:?} ({} votes)", consensus.tally, consensus.votes);
                    report.ip.insert(consensus.ip).clone()
                }
            };

            match reconcile(self.provider, &record, &ip, self.config.dry_run).await {
                Outcome::Failed(e) if self.config.on_error == FailurePolicy::Stop => {
                    return Err(e)
                }
                outcome => report.targets.push(TargetReport {
                    target: target.clone(),
                    outcome,
                }),
            }
        }

        report.log_summary();
        Ok(report)
    }

    async fn lookup(
        &self,
        target: &TargetSpec,
        zone_ids: &mut HashMap<String, String>,
    ) -> Result<DnsRecord> {
        if target.provider != self.provider.kind() {
            return Err(AppErr::config(format!(
                "target {} needs provider {}, configured provider is {}",
                target,
                target.provider,
                self.provider.kind()
            )));
        }

        let zone_id = self.zone_id(&target.zone, zone_ids).await?;
        let records = self.provider.list_records(&zone_id).await?;

        let record = select(&records, &target.dns_type, &target.name).ok_or_else(|| {
            AppErr::RecordNotFound {
                zone: target.zone.clone(),
                dns_type: target.dns_type.clone(),
                name: target.name.clone(),
            }
        })?;

        info!(
            "Found DNS record {}-{} as {} -> {:?}",
            record.zone_id, record.id, record.name, record.content
        );
        Ok(record.clone())
    }

    async fn zone_id(&self, zone: &str, zone_ids: &mut HashMap<String, String>) -> Result<String> {
        if let Some(id) = zone_ids.get(zone) {
            return Ok(id.clone());
        }

        let id = self.provider.zone_id_by_name(zone).await?;
        debug!("zone {} -> {}", zone, id);
        zone_ids.insert(zone.to_owned(), id.clone());
        Ok(id)
    }

    /// Lists every record of every zone this invocation touches.
    pub async fn print_records(&self) -> Result<()> {
        let mut zone_ids = HashMap::new();

        for zone in self.config.zones.iter() {
            let zone_id = self.zone_id(zone, &mut zone_ids).await?;
            let records = self.provider.list_records(&zone_id).await?;
            println!("{}", render_records(&records));
        }

        Ok(())
    }
}

pub fn render_records(records: &[DnsRecord]) -> String {
    use tabled::{
        builder::Builder,
        settings::{object::Rows, Alignment, Modify, Style},
    };

    let mut builder = Builder::default();
    builder.push_record(vec![
        "Zone ID", "ID", "Name", "Type", "TTL", "Modified", "Content",
    ]);
    for r in records.iter() {
        builder.push_record(vec![
            r.zone_id.clone(),
            r.id.clone(),
            r.name.clone(),
            r.dns_type.clone(),
            r.ttl.map(|t| t.to_string()).unwrap_or_default(),
            r.modified_on.clone().unwrap_or_default(),
            r.content.clone(),
        ]);
    }

    let mut table = builder.build();
    table
        .with(Style::psql())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}
