//! Entailment service client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{build_client, endpoint, millis, truncate_body};
use crate::config::EntailmentConfig;
use crate::entailment::EntailmentScorer;
use crate::error::{EntailmentError, FactCheckError};
use crate::types::{
    AggregatedScore, EntailmentLabel, EntailmentResponse, EntailmentScore, RawScore, Verdict,
};

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    claim: &'a str,
    evidence: &'a [String],
}

#[derive(Debug, Deserialize)]
struct WireScore {
    #[serde(default)]
    evidence_index: Option<usize>,
    #[serde(default)]
    label: Option<String>,
    score: f32,
}

#[derive(Debug, Deserialize)]
struct WireVerifyResponse {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    verdict: Option<String>,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    all_scores: Vec<WireScore>,
}

fn parse_label(raw: Option<&str>) -> Result<EntailmentLabel, EntailmentError> {
    raw.map_or(Ok(EntailmentLabel::Neither), str::parse)
}

/// Decode a `verify` response.
///
/// A body carrying `verdict`/`confidence` is an already aggregated response;
/// otherwise `label`/`score` are the raw model output. Per-item scores come
/// from `all_scores`, indexed by position unless they carry `evidence_index`.
///
/// # Errors
///
/// Returns [`EntailmentError::Malformed`] if the body or a label cannot be
/// decoded.
pub fn parse_verify_response(body: &str) -> Result<EntailmentResponse, EntailmentError> {
    let response: WireVerifyResponse =
        serde_json::from_str(body).map_err(|e| EntailmentError::Malformed(e.to_string()))?;

    let items = response
        .all_scores
        .iter()
        .enumerate()
        .map(|(position, s)| {
            Ok(EntailmentScore::new(
                s.evidence_index.unwrap_or(position),
                parse_label(s.label.as_deref())?,
                s.score,
            ))
        })
        .collect::<Result<Vec<_>, EntailmentError>>()?;

    if let Some(verdict) = response.verdict.as_deref() {
        let verdict = match verdict.trim().to_ascii_uppercase().as_str() {
            "NO_EVIDENCE" => Verdict::NoEvidence,
            other => match other.parse::<EntailmentLabel>()? {
                EntailmentLabel::Supported => Verdict::Supported,
                EntailmentLabel::Refuted => Verdict::Refuted,
                EntailmentLabel::Neither => Verdict::Neither,
                EntailmentLabel::Error => Verdict::Error,
            },
        };
        return Ok(EntailmentResponse::Aggregated(AggregatedScore {
            verdict,
            confidence: response.confidence.or(response.score).unwrap_or(0.0),
            items,
        }));
    }

    let score = response
        .score
        .ok_or_else(|| EntailmentError::Malformed("response has no score".to_string()))?;
    Ok(EntailmentResponse::Raw(RawScore {
        label: parse_label(response.label.as_deref())?,
        score,
        items,
    }))
}

/// Scorer backed by the entailment service.
#[derive(Debug, Clone)]
pub struct HttpEntailmentScorer {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpEntailmentScorer {
    /// Create a client for the service at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &EntailmentConfig) -> Result<Self, FactCheckError> {
        Ok(Self {
            client: build_client(config.timeout())?,
            url: endpoint(&config.base_url, "verify"),
            timeout: config.timeout(),
        })
    }

    fn map_error(&self, e: &reqwest::Error) -> EntailmentError {
        if e.is_timeout() {
            EntailmentError::Timeout(millis(self.timeout))
        } else {
            EntailmentError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl EntailmentScorer for HttpEntailmentScorer {
    async fn score(
        &self,
        claim: &str,
        evidence: &[String],
    ) -> Result<EntailmentResponse, EntailmentError> {
        if evidence.is_empty() {
            return Err(EntailmentError::EmptyEvidence);
        }

        let response = self
            .client
            .post(&self.url)
            .json(&VerifyRequest { claim, evidence })
            .send()
            .await
            .map_err(|e| self.map_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_error(&e))?;
        if !status.is_success() {
            return Err(EntailmentError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        parse_verify_response(&body)
    }

    fn name(&self) -> &str {
        "entailment-service"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_raw_response() {
        let body = r#"{"label": "SUPPORTED", "score": 0.91, "all_scores": [
            {"label": "SUPPORTED", "score": 0.91},
            {"label": "UNSUPPORTED", "score": 0.12}
        ]}"#;
        let response = parse_verify_response(body).unwrap();
        assert_eq!(response.label(), EntailmentLabel::Supported);
        let items = response.into_item_scores(2).unwrap();
        assert_eq!(items[1].evidence_index, 1);
        assert_eq!(items[1].label, EntailmentLabel::Refuted);
    }

    #[test]
    fn test_parse_aggregated_response() {
        let body = r#"{"verdict": "NEITHER", "confidence": 0.4, "all_scores": [
            {"evidence_index": 0, "label": "NEITHER", "score": 0.4}
        ]}"#;
        match parse_verify_response(body).unwrap() {
            EntailmentResponse::Aggregated(agg) => {
                assert_eq!(agg.verdict, Verdict::Neither);
                assert!((agg.confidence - 0.4).abs() < f32::EPSILON);
                assert_eq!(agg.items.len(), 1);
            }
            EntailmentResponse::Raw(_) => panic!("expected aggregated response"),
        }
    }

    #[test]
    fn test_parse_single_without_scores() {
        let response = parse_verify_response(r#"{"label": "SUPPORTED", "score": 0.7}"#).unwrap();
        assert!(response.items().is_empty());
        assert_eq!(response.into_item_scores(1).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_verify_response(r#"{"label": "SUPPORTED"}"#).is_err());
        assert!(parse_verify_response(r#"{"label": "MAYBE", "score": 0.5}"#).is_err());
        assert!(parse_verify_response("<html>").is_err());
    }
}
