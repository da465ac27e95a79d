use std::collections::HashMap;
use std::time::Duration;

use crate::err::*;
use crate::ip_source::SharedSource;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Address occurrence counts for one run.
pub type Tally = HashMap<String, usize>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consensus {
    pub ip: String,
    pub votes: usize,
    pub tally: Tally,
}

pub async fn resolve(sources: &[SharedSource], timeout: Duration) -> Result<Consensus> {
    let (tx, mut rx) = mpsc::channel(sources.len().max(1));

    for source in sources.iter() {
        let source = source.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, source.fetch()).await {
                Ok(r) => r,
                Err(_) => Err(AppErr::source_fetch(
                    source.name(),
                    format!("timed out after {:?}", timeout),
                )),
            };
            // The collector only goes away once every sender is dropped.
            let _ = tx.send((source.name().to_owned(), result)).await;
        });
    }
    drop(tx);

    let mut tally = Tally::new();
    while let Some((name, result)) = rx.recv().await {
        match result {
            Ok(ip) => {
                let ip = ip.trim();
                if ip.is_empty() {
                    warn!("[{}] returned an empty address, ignored", name);
                    continue;
                }
                debug!("[{}] reports {}", name, ip);
                *tally.entry(ip.to_owned()).or_insert(0) += 1;
            }
            Err(e) => warn!("ip source failed: {}", e),
        }
    }

    let (ip, votes) = winner(&tally).ok_or(AppErr::NoConsensus {
        attempted: sources.len(),
    })?;

    info!(
        "consensus ip is {} ({} of {} sources agree)",
        ip,
        votes,
        sources.len()
    );

    Ok(Consensus { ip, votes, tally })
}

// Ties go to the lexicographically smallest address.
pub fn winner(tally: &Tally) -> Option<(String, usize)> {
    tally
        .iter()
        .max_by(|(a_ip, a_n), (b_ip, b_n)| a_n.cmp(b_n).then_with(|| b_ip.cmp(a_ip)))
        .map(|(ip, n)| (ip.clone(), *n))
}
