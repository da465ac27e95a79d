use crate::backends::{DnsProvider, DnsRecord};
use crate::err::*;

use tracing::{info, warn};

#[derive(Debug)]
pub enum Outcome {
    AlreadyCurrent,
    /// `simulated` is set for dry runs, where the provider was not contacted.
    Updated { simulated: bool },
    Failed(AppErr),
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

pub async fn reconcile<P>(
    provider: &P,
    record: &DnsRecord,
    desired_ip: &str,
    dry_run: bool,
) -> Outcome
where
    P: DnsProvider + ?Sized,
{
    if record.content == desired_ip {
        info!(
            "{} {} is up to date ({})",
            record.dns_type, record.name, desired_ip
        );
        return Outcome::AlreadyCurrent;
    }

    info!(
        "{} {} is outdated ({:?}); updating to {}...",
        record.dns_type, record.name, record.content, desired_ip
    );

    if dry_run {
        warn!(
            "dry run: not updating {}-{} ({} {})",
            record.zone_id, record.id, record.dns_type, record.name
        );
        return Outcome::Updated { simulated: true };
    }

    let mut patch = record.clone();
    patch.content = desired_ip.to_owned();

    match provider.update_record(&record.zone_id, &record.id, &patch).await {
        Ok(()) => {
            info!("{} {} updated.", record.dns_type, record.name);
            Outcome::Updated { simulated: false }
        }
        Err(e) => Outcome::Failed(e),
    }
}
