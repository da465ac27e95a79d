use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppErr>;

#[derive(Debug, Error)]
pub enum AppErr {
    /// One IP source failed. Recovered inside the consensus run.
    #[error("[{source_name}] {cause}")]
    SourceFetch { source_name: String, cause: String },

    #[error("no consensus: none of the {attempted} ip sources produced an address")]
    NoConsensus { attempted: usize },

    #[error("zone not found: {0}")]
    ZoneNotFound(String),

    #[error("no matching DNS record found: {dns_type} {name} in zone {zone}")]
    RecordNotFound {
        zone: String,
        dns_type: String,
        name: String,
    },

    #[error("{failed} of {total} target(s) failed")]
    TargetsFailed { failed: usize, total: usize },

    #[error("dns provider: {0}")]
    Provider(String),

    #[error("configuration: {0}")]
    Config(String),

    #[error("[http] {0}")]
    Http(#[from] reqwest::Error),

    #[error("[serde json] {0}")]
    Json(#[from] serde_json::Error),

    #[error("[serde yaml] {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("[io] {0}")]
    Io(#[from] std::io::Error),
}

impl AppErr {
    pub fn source_fetch(source_name: impl Into<String>, cause: impl ToString) -> Self {
        Self::SourceFetch {
            source_name: source_name.into(),
            cause: cause.to_string(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Yaml(_))
    }
}
