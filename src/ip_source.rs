use std::fmt::Debug;
use std::io::{BufRead, BufReader};
use std::sync::Arc;

use crate::err::*;

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

const IPIFY_URL: &str = "https://api.ipify.org/?format=json";
const MYIP_URL: &str = "https://api.myip.com/";
const CLOUDFLARE_TRACE_URL: &str = "https://1.1.1.1/cdn-cgi/trace";

/// One external "what is my ip" endpoint. `fetch` returns the raw, untrimmed text.
#[async_trait]
pub trait IpSource: Debug + Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<String>;
}

pub type SharedSource = Arc<dyn IpSource>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Ipify,
    Myip,
    CloudflareTrace,
}

impl SourceKind {
    pub fn all() -> Vec<SourceKind> {
        vec![Self::Ipify, Self::Myip, Self::CloudflareTrace]
    }

    pub fn build(self, client: &reqwest::Client) -> SharedSource {
        match self {
            Self::Ipify => Arc::new(JsonIpSource::new("IPify.org", IPIFY_URL, client.clone())),
            Self::Myip => Arc::new(JsonIpSource::new("MyIP.com", MYIP_URL, client.clone())),
            Self::CloudflareTrace => Arc::new(TraceIpSource::new(
                "Cloudflare trace",
                CLOUDFLARE_TRACE_URL,
                client.clone(),
            )),
        }
    }
}

async fn get_body(client: &reqwest::Client, name: &str, url: &str) -> Result<String> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppErr::source_fetch(name, format!("failed to fetch response: {}", e)))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| AppErr::source_fetch(name, format!("failed to read response: {}", e)))?;

    if !status.is_success() {
        return Err(AppErr::source_fetch(
            name,
            format!("request ip address failed ({}): {}", status, body),
        ));
    }

    Ok(body)
}

#[derive(Debug, Deserialize)]
struct IpResponse {
    ip: String,
}

/// Services answering with a JSON object carrying a top level `ip` string.
#[derive(Debug)]
pub struct JsonIpSource {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl JsonIpSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl IpSource for JsonIpSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<String> {
        let body = get_body(&self.client, &self.name, &self.url).await?;
        let resp: IpResponse = serde_json::from_str(&body)
            .map_err(|e| AppErr::source_fetch(&self.name, format!("malformed json: {}", e)))?;
        Ok(resp.ip)
    }
}

/// Cloudflare's `/cdn-cgi/trace`, a `key=value` per line document.
#[derive(Debug)]
pub struct TraceIpSource {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl TraceIpSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client,
        }
    }
}

fn parse_trace(body: &str) -> Option<String> {
    let reader = BufReader::new(body.as_bytes());

    reader.lines().map_while(|line| line.ok()).find_map(|line| {
        if let Some((k, v)) = line.split_once('=') {
            if k == "ip" {
                Some(v.to_owned())
            } else {
                None
            }
        } else {
            None
        }
    })
}

#[async_trait]
impl IpSource for TraceIpSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<String> {
        let body = get_body(&self.client, &self.name, &self.url).await?;
        parse_trace(&body).ok_or(AppErr::source_fetch(&self.name, "no 'ip' line in trace"))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// A scripted source: answers with a fixed value, a failure, or hangs.
    #[derive(Debug)]
    pub struct StaticSource {
        name: String,
        answer: Answer,
        calls: AtomicUsize,
    }

    #[derive(Debug, Clone)]
    enum Answer {
        Ip(String),
        Fail,
        Hang,
    }

    impl StaticSource {
        pub fn ip(name: &str, ip: &str) -> Arc<Self> {
            Self::with(name, Answer::Ip(ip.to_owned()))
        }

        pub fn failing(name: &str) -> Arc<Self> {
            Self::with(name, Answer::Fail)
        }

        pub fn hanging(name: &str) -> Arc<Self> {
            Self::with(name, Answer::Hang)
        }

        fn with(name: &str, answer: Answer) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_owned(),
                answer,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IpSource for StaticSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.answer {
                Answer::Ip(ip) => Ok(ip.clone()),
                Answer::Fail => Err(AppErr::source_fetch(&self.name, "scripted failure")),
                Answer::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(String::new())
                }
            }
        }
    }

    pub fn sources(answers: &[&str]) -> Vec<SharedSource> {
        answers
            .iter()
            .enumerate()
            .map(|(i, ip)| StaticSource::ip(&format!("source-{}", i), ip) as SharedSource)
            .collect()
    }
}
