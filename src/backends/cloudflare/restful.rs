use crate::err::*;

use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cloudflare v4 response wrapper.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub errors: Vec<ApiMessage>,

    pub result: Option<T>,

    pub result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ResultInfo {
    #[serde(default)]
    pub total_pages: u32,
}

pub struct Restful {
    client: reqwest::Client,
    base_url: String,
    headers: Vec<(String, String)>,
}

enum ReqMethod {
    Get,
    Put,
}

impl Restful {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        headers: Vec<(String, String)>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            headers,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_builder(&self, path: &str, method: ReqMethod) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);

        let mut builder = match method {
            ReqMethod::Get => self.client.get(url),
            ReqMethod::Put => self.client.put(url),
        };

        builder = builder.header("Content-Type", "application/json");

        for (k, v) in self.headers.iter() {
            builder = builder.header(k.as_str(), v.as_str());
        }

        builder
    }

    async fn into_envelope<T: DeserializeOwned>(resp: Response) -> Result<Envelope<T>> {
        let status = resp.status();
        let body = resp.text().await?;

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => {
                return Err(AppErr::provider(format!(
                    "not a 2xx response ({}): {}",
                    status, body
                )))
            }
        };

        if !status.is_success() || !envelope.success {
            let msgs: Vec<String> = envelope
                .errors
                .iter()
                .map(|m| format!("{} (code {})", m.message, m.code))
                .collect();
            return Err(AppErr::provider(format!(
                "request rejected ({}): {}",
                status,
                msgs.join("; ")
            )));
        }

        Ok(envelope)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Envelope<T>> {
        debug!("GET {}", path);
        let resp = self
            .request_builder(path, ReqMethod::Get)
            .query(query)
            .send()
            .await?;
        Self::into_envelope(resp).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        json: &B,
    ) -> Result<Envelope<T>> {
        debug!("PUT {}", path);
        let resp = self
            .request_builder(path, ReqMethod::Put)
            .json(json)
            .send()
            .await?;
        Self::into_envelope(resp).await
    }
}
