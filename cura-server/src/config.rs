//! Process configuration read from the environment (and `.env`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use cura_rag::RagConfig;

/// Which chunker builds the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkerKind {
    Fixed,
    Recursive,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub document_path: PathBuf,
    pub openai_api_key: String,
    pub openai_model: Option<String>,
    pub pinecone_api_key: String,
    pub pinecone_index: String,
    /// Data-plane host; resolved from `pinecone_index` when unset.
    pub pinecone_host: Option<String>,
    pub request_timeout: Duration,
    pub chunker: ChunkerKind,
    pub log_json: bool,
}

impl ServerConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value
    /// if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| {
            var(key).with_context(|| format!("{key} not found in environment variables"))
        };

        let port = match var("PORT") {
            Some(value) => value.parse().with_context(|| format!("invalid PORT: {value}"))?,
            None => 3090,
        };
        let request_timeout = match var("CURA_REQUEST_TIMEOUT_SECS") {
            Some(value) => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("invalid CURA_REQUEST_TIMEOUT_SECS: {value}"))?;
                if secs == 0 {
                    bail!("CURA_REQUEST_TIMEOUT_SECS must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(30),
        };
        let chunker = match var("CURA_CHUNKER").as_deref() {
            None | Some("fixed") => ChunkerKind::Fixed,
            Some("recursive") => ChunkerKind::Recursive,
            Some(other) => bail!("invalid CURA_CHUNKER: {other} (expected `fixed` or `recursive`)"),
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            document_path: var("CURA_DOCUMENT_PATH")
                .unwrap_or_else(|| "./data/bnf.pdf".to_string())
                .into(),
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_model: var("OPENAI_EMBEDDING_MODEL"),
            pinecone_api_key: required("PINECONE_API_KEY")?,
            pinecone_index: var("PINECONE_INDEX").unwrap_or_else(|| "mynewindex".to_string()),
            pinecone_host: var("PINECONE_INDEX_HOST"),
            request_timeout,
            chunker,
            log_json: var("CURA_LOG_JSON").is_some_and(|v| matches!(v.as_str(), "1" | "true")),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| "invalid host/port for cura-server")
    }

    /// Pipeline configuration derived from this process configuration.
    pub fn rag_config(&self) -> anyhow::Result<RagConfig> {
        RagConfig::builder()
            .request_timeout(self.request_timeout)
            .build()
            .context("invalid pipeline configuration")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_with_only_api_keys() {
        let keys = [("OPENAI_API_KEY", "sk"), ("PINECONE_API_KEY", "pc")];
        let config = ServerConfig::from_lookup(lookup(&keys)).unwrap();
        assert_eq!(config.port, 3090);
        assert_eq!(config.pinecone_index, "mynewindex");
        assert_eq!(config.document_path, PathBuf::from("./data/bnf.pdf"));
        assert_eq!(config.chunker, ChunkerKind::Fixed);
        assert!(config.pinecone_host.is_none());
        assert!(!config.log_json);
        assert_eq!(config.addr().unwrap().port(), 3090);
    }

    #[test]
    fn missing_pinecone_key_is_reported() {
        let err = ServerConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk")])).unwrap_err();
        assert!(err.to_string().contains("PINECONE_API_KEY"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk"),
            ("PINECONE_API_KEY", "pc"),
            ("PORT", "8080"),
            ("CURA_REQUEST_TIMEOUT_SECS", "5"),
            ("CURA_CHUNKER", "recursive"),
            ("CURA_LOG_JSON", "true"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.chunker, ChunkerKind::Recursive);
        assert!(config.log_json);
        assert_eq!(config.rag_config().unwrap().request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let base = [("OPENAI_API_KEY", "sk"), ("PINECONE_API_KEY", "pc")];
        let with = |extra| ServerConfig::from_lookup(lookup(&[base[0], base[1], extra]));
        assert!(with(("PORT", "http")).is_err());
        assert!(with(("CURA_CHUNKER", "semantic")).is_err());
        assert!(with(("CURA_REQUEST_TIMEOUT_SECS", "0")).is_err());
    }
}
