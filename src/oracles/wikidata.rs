

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Proxy};
use serde::Deserialize;
use tracing::{debug, info};

use super::base::{LookupError, MembershipOracle};

const USER_AGENT: &str = concat!("np-semseg/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct AskResponse {
    boolean: bool,
}


pub struct WikidataClient {
    endpoint: String,
    client: Client,
}

impl WikidataClient {

    pub fn new(
        endpoint: impl Into<String>,
        http_proxy: Option<&str>,
        https_proxy: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        let endpoint = endpoint.into();
        let mut builder = Client::builder().timeout(timeout).user_agent(USER_AGENT);

        if let Some(proxy) = http_proxy {
            builder = builder.proxy(Proxy::http(proxy)?);
        }
        if let Some(proxy) = https_proxy {
            builder = builder.proxy(Proxy::https(proxy)?);
        }

        info!(
            "Wikidata client initialized: endpoint={}, proxied={}",
            endpoint,
            http_proxy.is_some() || https_proxy.is_some()
        );

        Ok(Self {
            endpoint,
            client: builder.build()?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}


pub fn build_ask_query(candidates: &[String]) -> String {
    let mut seen = std::collections::HashSet::new();
    let labels: Vec<String> = candidates
        .iter()
        .filter(|c| !c.trim().is_empty() && seen.insert(c.as_str()))
        .map(|c| format!("\"{}\"@en", escape_literal(c)))
        .collect();

    format!(
        "ASK {{ VALUES ?label {{ {} }} ?item <http://www.w3.org/2000/01/rdf-schema#label> ?label . }}",
        labels.join(" ")
    )
}

fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[async_trait]
impl MembershipOracle for WikidataClient {
    async fn exists(&self, candidates: &[String]) -> Result<bool, LookupError> {
        if candidates.iter().all(|c| c.trim().is_empty()) {
            return Ok(false);
        }

        let query = build_ask_query(candidates);
        debug!("Wikidata ASK with {} candidates", candidates.len());

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query.as_str()), ("format", "json")])
            .header(ACCEPT, "application/sparql-results+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Service {
                source_name: "wikidata".to_string(),
                message: format!("HTTP {}: {}", status, crate::safe_truncate(&body, 200)),
            });
        }

        let body = response.text().await?;
        let answer: AskResponse = serde_json::from_str(&body)?;
        Ok(answer.boolean)
    }

    fn source_name(&self) -> &str {
        "wikidata"
    }
}
