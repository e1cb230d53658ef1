// src/network/authority.rs
//! Remote authority client
//!
//! The authority publishes the current difficulty, verifies found hashes,
//! serves the last mined block records and accepts proof-of-work
//! submissions. [`Authority`] is the seam the pipeline and the difficulty
//! monitor program against; [`HttpAuthority`] talks to the real endpoints.

use crate::types::BlockRecord;
use crate::utils::error::MinerError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Endpoint URLs of the remote authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityConfig {
    /// GET, returns `{ "difficulty": <KB> }`
    #[serde(default = "default_difficulty_url")]
    pub difficulty_url: String,
    /// POST a found hash for verification
    #[serde(default = "default_verify_url")]
    pub verify_url: String,
    /// GET the ordered list of last mined records
    #[serde(default = "default_lastblock_url")]
    pub lastblock_url: String,
    /// POST the proof-of-work with its Merkle root
    #[serde(default = "default_submit_url")]
    pub submit_url: String,
}

fn default_difficulty_url() -> String {
    "http://xenblocks.io/difficulty".into()
}

fn default_verify_url() -> String {
    "http://xenblocks.io/verify".into()
}

fn default_lastblock_url() -> String {
    "http://xenblocks.io:4445/getblocks/lastblock".into()
}

fn default_submit_url() -> String {
    "http://xenblocks.io:4446/send_pow".into()
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            difficulty_url: default_difficulty_url(),
            verify_url: default_verify_url(),
            lastblock_url: default_lastblock_url(),
            submit_url: default_submit_url(),
        }
    }
}

impl AuthorityConfig {
    /// Checks that every endpoint is an absolute http(s) URL
    pub fn validate(&self) -> Result<(), MinerError> {
        for (name, value) in [
            ("difficulty_url", &self.difficulty_url),
            ("verify_url", &self.verify_url),
            ("lastblock_url", &self.lastblock_url),
            ("submit_url", &self.submit_url),
        ] {
            let url = Url::parse(value)?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(MinerError::ConfigError(format!(
                    "{} must use http or https, got '{}'",
                    name,
                    url.scheme()
                )));
            }
        }
        Ok(())
    }
}

/// Body of the verify request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyRequest {
    /// The found hash
    pub hash_to_verify: String,
    /// Key the hash was computed from
    pub key: String,
    /// Account credited with the block
    pub account: String,
    /// Attempts the finding worker needed
    pub attempts: u64,
    /// Pool speed at the time of the find
    pub hashes_per_second: f64,
    /// Finding worker
    pub worker: usize,
}

/// What the authority answered to a verify request
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyReply {
    /// HTTP status code
    pub status: u16,
    /// Response body; a non-JSON body is kept as a JSON string
    pub body: Value,
}

impl VerifyReply {
    /// Whether the hash was accepted
    ///
    /// An explicit boolean `success` field decides; without one, HTTP 200
    /// means success.
    pub fn accepted(&self) -> bool {
        match self.body.get("success").and_then(Value::as_bool) {
            Some(success) => success,
            None => self.status == 200,
        }
    }
}

/// Body of the proof-of-work submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitRequest {
    /// Account credited with the block
    pub account_address: String,
    /// Last record's block id divided by 100
    pub block_id: u64,
    /// Root over the verified records
    pub merkle_root: String,
    /// Key of the found hash
    pub key: String,
    /// The found hash
    pub hash_to_verify: String,
}

#[derive(Debug, Deserialize)]
struct DifficultyResponse {
    difficulty: u32,
}

/// Operations the miner needs from the remote authority
///
/// Transport failures are `Err`; a delivered verify answer, accepted or not,
/// is `Ok` so the caller can tell rejection from an outage.
#[async_trait]
pub trait Authority: Send + Sync {
    /// Current memory cost in KB
    async fn difficulty(&self) -> Result<u32, MinerError>;

    /// Asks the authority to verify a found hash
    async fn verify(&self, request: &VerifyRequest) -> Result<VerifyReply, MinerError>;

    /// Ordered list of the last mined records
    async fn last_blocks(&self) -> Result<Vec<BlockRecord>, MinerError>;

    /// Submits a proof of work, returning the authority's opaque answer
    async fn submit(&self, request: &SubmitRequest) -> Result<Value, MinerError>;
}

/// [`Authority`] over HTTP with JSON bodies
pub struct HttpAuthority {
    /// Endpoint configuration
    config: AuthorityConfig,
    /// HTTP client shared by all requests
    client: Client,
}

impl HttpAuthority {
    /// Creates a client for the given endpoints
    ///
    /// # Arguments
    /// * `config` - Endpoint URLs
    pub fn new(config: AuthorityConfig) -> Self {
        HttpAuthority {
            config,
            client: Client::new(),
        }
    }
}

/// Parses a body as JSON, falling back to the raw text
fn body_value(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

/// Fails on any non-2xx status, keeping the body for the log
fn ensure_success(endpoint: &str, status: StatusCode, text: &str) -> Result<(), MinerError> {
    if status.is_success() {
        return Ok(());
    }
    Err(MinerError::NetworkError(format!(
        "{} endpoint returned {}: {}",
        endpoint, status, text
    )))
}

/// Memory cost from a difficulty body; zero is not a usable cost
fn parse_difficulty(text: &str) -> Result<u32, MinerError> {
    let response: DifficultyResponse = serde_json::from_str(text)?;
    if response.difficulty == 0 {
        return Err(MinerError::ProtocolError(
            "Authority reported a difficulty of 0".into(),
        ));
    }
    Ok(response.difficulty)
}

/// Classifies a verify answer
///
/// A 5xx is an outage and becomes an error so it is retried; anything else
/// is delivered, and [`VerifyReply::accepted`] decides.
fn verify_reply(status: StatusCode, text: String) -> Result<VerifyReply, MinerError> {
    if status.is_server_error() {
        return Err(MinerError::NetworkError(format!(
            "verify endpoint returned {}",
            status
        )));
    }
    Ok(VerifyReply {
        status: status.as_u16(),
        body: body_value(text),
    })
}

/// Ordered block records from a last-block body
fn parse_records(text: &str) -> Result<Vec<BlockRecord>, MinerError> {
    Ok(serde_json::from_str(text)?)
}

#[async_trait]
impl Authority for HttpAuthority {
    async fn difficulty(&self) -> Result<u32, MinerError> {
        let response = self.client.get(&self.config.difficulty_url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        ensure_success("difficulty", status, &text)?;
        parse_difficulty(&text)
    }

    async fn verify(&self, request: &VerifyRequest) -> Result<VerifyReply, MinerError> {
        let response = self
            .client
            .post(&self.config.verify_url)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        verify_reply(status, response.text().await?)
    }

    async fn last_blocks(&self) -> Result<Vec<BlockRecord>, MinerError> {
        let response = self.client.get(&self.config.lastblock_url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        ensure_success("lastblock", status, &text)?;
        parse_records(&text)
    }

    async fn submit(&self, request: &SubmitRequest) -> Result<Value, MinerError> {
        let response = self
            .client
            .post(&self.config.submit_url)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        ensure_success("send_pow", status, &text)?;
        Ok(body_value(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepted_prefers_success_field() {
        let reply = |status, body| VerifyReply { status, body };

        assert!(reply(200, json!({})).accepted());
        assert!(reply(200, json!("ok")).accepted());
        assert!(!reply(400, json!({"error": "bad"})).accepted());
        assert!(reply(202, json!({"success": true})).accepted());
        assert!(!reply(200, json!({"success": false})).accepted());
    }

    #[test]
    fn test_verify_request_field_names() {
        let request = VerifyRequest {
            hash_to_verify: "h".into(),
            key: "k".into(),
            account: "0xabc".into(),
            attempts: 12,
            hashes_per_second: 3.5,
            worker: 1,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "hash_to_verify": "h",
                "key": "k",
                "account": "0xabc",
                "attempts": 12,
                "hashes_per_second": 3.5,
                "worker": 1
            })
        );
    }

    #[test]
    fn test_submit_request_field_names() {
        let request = SubmitRequest {
            account_address: "0xabc".into(),
            block_id: 12,
            merkle_root: "root".into(),
            key: "k".into(),
            hash_to_verify: "h".into(),
        };
        let value = serde_json::to_value(&request).unwrap();
        for field in ["account_address", "block_id", "merkle_root", "key", "hash_to_verify"] {
            assert!(value.get(field).is_some(), "missing {}", field);
        }
    }

    #[test]
    fn test_body_value_falls_back_to_text() {
        assert_eq!(body_value("{\"a\":1}".into()), json!({"a": 1}));
        assert_eq!(body_value("plain".into()), json!("plain"));
    }

    #[test]
    fn test_config_validation() {
        assert!(AuthorityConfig::default().validate().is_ok());

        let mut config = AuthorityConfig::default();
        config.submit_url = "ftp://xenblocks.io/send_pow".into();
        assert!(matches!(config.validate(), Err(MinerError::ConfigError(_))));

        config.submit_url = "not a url".into();
        assert!(matches!(config.validate(), Err(MinerError::UrlError(_))));
    }

    #[test]
    fn test_verify_server_error_is_retryable() {
        let err = verify_reply(StatusCode::SERVICE_UNAVAILABLE, "down".into()).unwrap_err();
        assert!(matches!(err, MinerError::NetworkError(_)));
    }

    #[test]
    fn test_verify_client_error_is_delivered_as_rejection() {
        let reply = verify_reply(StatusCode::BAD_REQUEST, "{\"error\":\"bad hash\"}".into()).unwrap();
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body, json!({"error": "bad hash"}));
        assert!(!reply.accepted());

        let ok = verify_reply(StatusCode::OK, "verified".into()).unwrap();
        assert!(ok.accepted());
    }

    #[test]
    fn test_non_success_status_fails() {
        assert!(ensure_success("send_pow", StatusCode::OK, "").is_ok());
        assert!(ensure_success("send_pow", StatusCode::CREATED, "").is_ok());

        let err = ensure_success("send_pow", StatusCode::BAD_REQUEST, "stale block").unwrap_err();
        match err {
            MinerError::NetworkError(message) => assert!(message.contains("stale block")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(ensure_success("send_pow", StatusCode::BAD_GATEWAY, "").is_err());
    }

    #[test]
    fn test_parse_difficulty() {
        assert_eq!(parse_difficulty("{\"difficulty\": 1727}").unwrap(), 1727);
        assert!(matches!(
            parse_difficulty("{\"difficulty\": 0}"),
            Err(MinerError::ProtocolError(_))
        ));
        assert!(matches!(
            parse_difficulty("<html>"),
            Err(MinerError::JsonError(_))
        ));
    }

    #[test]
    fn test_parse_records_keeps_order() {
        let text = r#"[
            {"block_id": 7, "hash_to_verify": "a", "key": "ka", "account": "0x1"},
            {"block_id": 3, "hash_to_verify": "b", "key": "kb", "account": "0x2"}
        ]"#;
        let records = parse_records(text).unwrap();
        assert_eq!(
            records.iter().map(|r| r.block_id).collect::<Vec<_>>(),
            vec![7, 3]
        );
        assert!(matches!(parse_records("{}"), Err(MinerError::JsonError(_))));
    }
}
