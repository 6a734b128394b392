

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::base::{CooccurrenceScorer, LookupError, PmiScore};
use crate::utils::word_count;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoherenceMeasure {
    Npmi,
    Uci,
}

impl CoherenceMeasure {
    fn path(self) -> &'static str {
        match self {
            Self::Npmi => "npmi",
            Self::Uci => "uci",
        }
    }
}


pub struct PalmettoClient {
    base_url: String,
    client: Client,
}

impl PalmettoClient {

    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Palmetto client initialized: url={}", base_url);

        Ok(Self {
            base_url,
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    async fn measure(&self, measure: CoherenceMeasure, words: &str) -> Result<f64, LookupError> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, measure.path()))
            .query(&[("words", words)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Service {
                source_name: "palmetto".to_string(),
                message: format!("HTTP {} for {}", status, measure.path()),
            });
        }

        let body = response.text().await?;
        Ok(parse_statistic(&body).unwrap_or_else(|| {
            debug!(
                "Palmetto {} returned no usable value for '{}', using sentinel",
                measure.path(),
                words
            );
            PmiScore::SENTINEL
        }))
    }
}


pub fn parse_statistic(body: &str) -> Option<f64> {
    body.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[async_trait]
impl CooccurrenceScorer for PalmettoClient {
    async fn score(&self, phrase: &str) -> Result<PmiScore, LookupError> {
        if word_count(phrase) < 2 {
            return Ok(PmiScore::sentinel());
        }

        let words = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
        let (npmi, uci) = tokio::try_join!(
            self.measure(CoherenceMeasure::Npmi, &words),
            self.measure(CoherenceMeasure::Uci, &words),
        )?;

        Ok(PmiScore::new(npmi, uci))
    }

    fn source_name(&self) -> &str {
        "palmetto"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn test_parse_statistic() {
        assert_eq!(parse_statistic(" 0.4213\n"), Some(0.4213));
        assert_eq!(parse_statistic("-3.5"), Some(-3.5));
        assert_eq!(parse_statistic(""), None);
        assert_eq!(parse_statistic("NaN"), None);
        assert_eq!(parse_statistic("<html>"), None);
    }

    #[tokio::test]
    async fn test_score_returns_npmi_then_uci() {
        let mut server = Server::new_async().await;
        let npmi = server
            .mock("GET", "/npmi")
            .match_query(Matcher::UrlEncoded("words".into(), "hot dog".into()))
            .with_body("0.61")
            .create_async()
            .await;
        let uci = server
            .mock("GET", "/uci")
            .match_query(Matcher::UrlEncoded("words".into(), "hot dog".into()))
            .with_body("2.75")
            .create_async()
            .await;

        let client = PalmettoClient::new(server.url(), Duration::from_secs(5)).unwrap();
        let score = client.score("hot  dog").await.unwrap();

        assert_eq!(score.to_array(), [0.61, 2.75]);
        npmi.assert_async().await;
        uci.assert_async().await;
    }

    #[tokio::test]
    async fn test_partial_response_uses_sentinel() {
        let mut server = Server::new_async().await;
        let _npmi = server
            .mock("GET", "/npmi")
            .match_query(Matcher::Any)
            .with_body("0.12")
            .create_async()
            .await;
        let _uci = server
            .mock("GET", "/uci")
            .match_query(Matcher::Any)
            .with_body("")
            .create_async()
            .await;

        let client = PalmettoClient::new(server.url(), Duration::from_secs(5)).unwrap();
        let score = client.score("ice cream").await.unwrap();
        assert_eq!(score.to_array(), [0.12, 0.0]);
    }

    #[tokio::test]
    async fn test_single_word_is_not_sent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = PalmettoClient::new(server.url(), Duration::from_secs(5)).unwrap();
        assert_eq!(client.score("dog").await.unwrap(), PmiScore::sentinel());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_failure_is_a_lookup_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = PalmettoClient::new(server.url(), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            client.score("hot dog").await,
            Err(LookupError::Service { .. })
        ));
    }
}
