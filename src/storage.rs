//! Object storage capability.
//!
//! The panel consumes storage through the [`ObjectStore`] trait: fetch a
//! blob, write a blob, or mint a time-limited URL for inline viewing. The
//! production implementation talks to S3 (or an S3-compatible service) over
//! the REST API with AWS Signature V4 authentication, using only pure-Rust
//! dependencies (`hmac`, `sha2`) for signing — no C library dependencies,
//! making it compatible with all build environments including Nix.
//!
//! # Configuration
//!
//! ```toml
//! [storage]
//! bucket = "review-docs"
//! prefix = "panel/"
//! region = "us-east-1"
//! # endpoint_url = "http://localhost:9000"   # MinIO
//! ```
//!
//! # Environment Variables
//!
//! Credentials are read from environment variables:
//! - `AWS_ACCESS_KEY_ID` — required
//! - `AWS_SECRET_ACCESS_KEY` — required
//! - `AWS_SESSION_TOKEN` — optional (for temporary credentials / IAM roles)
//!
//! No retry or timeout policy is layered on top: a failure surfaces
//! immediately to the caller, split into [`StorageError::NotFound`] for
//! missing keys and [`StorageError::Access`] for everything else.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::StorageConfig;

type HmacSha256 = Hmac<Sha256>;

/// Storage failure taxonomy. `NotFound` is recoverable by the viewer's
/// fallback chain; `Access` covers credentials, permissions, and transport.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage access error: {0}")]
    Access(String),
}

/// Minimal object-store capability consumed by the viewer and audit trail.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object's bytes.
    async fn read_blob(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Create or overwrite an object.
    async fn write_blob(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Produce a time-limited URL suitable for inline viewing in a browser.
    async fn signed_url(&self, key: &str, ttl_secs: u64) -> Result<String, StorageError>;
}

// ============ AWS Credentials ============

/// AWS credentials loaded from environment variables.
#[derive(Clone)]
struct AwsCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl AwsCredentials {
    /// Load credentials from `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`,
    /// and optionally `AWS_SESSION_TOKEN`.
    fn from_env() -> Result<Self, StorageError> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID")
            .map_err(|_| StorageError::Access("AWS_ACCESS_KEY_ID environment variable not set".into()))?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY").map_err(|_| {
            StorageError::Access("AWS_SECRET_ACCESS_KEY environment variable not set".into())
        })?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token,
        })
    }
}

// ============ S3 implementation ============

/// S3-backed [`ObjectStore`] using SigV4-signed REST calls.
pub struct S3Store {
    config: StorageConfig,
    creds: AwsCredentials,
    client: reqwest::Client,
}

impl S3Store {
    /// Build a store with credentials taken from the environment.
    pub fn from_env(config: StorageConfig) -> Result<Self, StorageError> {
        let creds = AwsCredentials::from_env()?;
        Ok(Self::new(config, creds))
    }

    fn new(config: StorageConfig, creds: AwsCredentials) -> Self {
        Self {
            config,
            creds,
            client: reqwest::Client::new(),
        }
    }

    /// Compute the S3 hostname for the configured bucket and region.
    ///
    /// A custom `endpoint_url` (MinIO, LocalStack) replaces the standard
    /// `<bucket>.s3.<region>.amazonaws.com` form.
    fn host(&self) -> String {
        if let Some(endpoint) = &self.config.endpoint_url {
            endpoint
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/')
                .to_string()
        } else {
            format!(
                "{}.s3.{}.amazonaws.com",
                self.config.bucket, self.config.region
            )
        }
    }

    /// Join the configured prefix onto a logical key.
    fn full_key(&self, key: &str) -> String {
        let prefix = self.config.prefix.trim_matches('/');
        if prefix.is_empty() {
            key.trim_start_matches('/').to_string()
        } else {
            format!("{}/{}", prefix, key.trim_start_matches('/'))
        }
    }

    fn encoded_key(&self, key: &str) -> String {
        self.full_key(key)
            .split('/')
            .map(uri_encode)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Send a header-signed request for `key` with an optional body.
    async fn signed_request(
        &self,
        method: reqwest::Method,
        key: &str,
        body: Vec<u8>,
    ) -> Result<reqwest::Response, StorageError> {
        let host = self.host();
        let encoded_key = self.encoded_key(key);
        let url = format!("https://{}/{}", host, encoded_key);

        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let payload_hash = hex_sha256(&body);

        let mut headers = vec![
            ("host".to_string(), host.clone()),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(token) = &self.creds.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }
        headers.sort_by(|a, b| a.0.cmp(&b.0));

        let signed_headers: String = headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v))
            .collect();

        let canonical_request = format!(
            "{}\n/{}\n\n{}\n{}\n{}",
            method.as_str(),
            encoded_key,
            canonical_headers,
            signed_headers,
            payload_hash
        );

        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.config.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            credential_scope,
            hex_sha256(canonical_request.as_bytes())
        );

        let signing_key = derive_signing_key(
            &self.creds.secret_access_key,
            &date_stamp,
            &self.config.region,
            "s3",
        );
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.creds.access_key_id, credential_scope, signed_headers, signature
        );

        let mut req = self
            .client
            .request(method, &url)
            .header("Authorization", &authorization)
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &amz_date);
        if let Some(token) = &self.creds.session_token {
            req = req.header("x-amz-security-token", token);
        }
        if !body.is_empty() {
            req = req.body(body);
        }

        req.send()
            .await
            .map_err(|e| StorageError::Access(format!("request to s3://{}/{} failed: {}", self.config.bucket, key, e)))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn read_blob(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let resp = self
            .signed_request(reqwest::Method::GET, key, Vec::new())
            .await?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(key.to_string()));
        }
        if !status.is_success() {
            return Err(StorageError::Access(format!(
                "S3 GetObject failed (HTTP {}) for key '{}'",
                status, key
            )));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| StorageError::Access(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn write_blob(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let resp = self
            .signed_request(reqwest::Method::PUT, key, bytes.to_vec())
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StorageError::Access(format!(
                "S3 PutObject failed (HTTP {}) for key '{}'",
                status, key
            )));
        }
        Ok(())
    }

    async fn signed_url(&self, key: &str, ttl_secs: u64) -> Result<String, StorageError> {
        // Query-string presigning: the signature covers the query parameters
        // themselves, with an unsigned payload.
        let host = self.host();
        let encoded_key = self.encoded_key(key);

        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.config.region);

        let mut query_params = vec![
            (
                "X-Amz-Algorithm".to_string(),
                "AWS4-HMAC-SHA256".to_string(),
            ),
            (
                "X-Amz-Credential".to_string(),
                format!("{}/{}", self.creds.access_key_id, credential_scope),
            ),
            ("X-Amz-Date".to_string(), amz_date.clone()),
            ("X-Amz-Expires".to_string(), ttl_secs.to_string()),
            ("X-Amz-SignedHeaders".to_string(), "host".to_string()),
        ];
        if let Some(token) = &self.creds.session_token {
            query_params.push(("X-Amz-Security-Token".to_string(), token.clone()));
        }
        query_params.sort_by(|a, b| a.0.cmp(&b.0));

        let canonical_querystring: String = query_params
            .iter()
            .map(|(k, v)| format!("{}={}", uri_encode(k), uri_encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_request = format!(
            "GET\n/{}\n{}\nhost:{}\n\nhost\nUNSIGNED-PAYLOAD",
            encoded_key, canonical_querystring, host
        );
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            credential_scope,
            hex_sha256(canonical_request.as_bytes())
        );
        let signing_key = derive_signing_key(
            &self.creds.secret_access_key,
            &date_stamp,
            &self.config.region,
            "s3",
        );
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        Ok(format!(
            "https://{}/{}?{}&X-Amz-Signature={}",
            host, encoded_key, canonical_querystring, signature
        ))
    }
}

// ============ AWS SigV4 Helpers ============

/// Compute the hex-encoded SHA-256 hash of data.
fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute HMAC-SHA256 of data with the given key.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Compute hex-encoded HMAC-SHA256.
fn hex_hmac_sha256(key: &[u8], data: &[u8]) -> String {
    hex::encode(hmac_sha256(key, data))
}

/// Derive the AWS SigV4 signing key for a given date, region, and service.
///
/// ```text
/// kDate    = HMAC("AWS4" + secret, dateStamp)
/// kRegion  = HMAC(kDate, region)
/// kService = HMAC(kRegion, service)
/// kSigning = HMAC(kService, "aws4_request")
/// ```
fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// URI-encode a string per RFC 3986 (used in SigV4 canonical requests).
///
/// Encodes all characters except unreserved characters:
/// `A-Z a-z 0-9 - _ . ~`
pub(crate) fn uri_encode(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

// ============ In-memory implementation ============

/// In-memory [`ObjectStore`] for tests and for running the panel without a
/// configured storage backend. Signed URLs are synthetic `memory://` URLs
/// and only resolve for objects that exist.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object directly, bypassing the trait.
    pub fn insert(&self, key: &str, bytes: Vec<u8>) {
        self.objects.write().unwrap().insert(key.to_string(), bytes);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().unwrap().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().unwrap().is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn read_blob(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn write_blob(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.insert(key, bytes.to_vec());
        Ok(())
    }

    async fn signed_url(&self, key: &str, ttl_secs: u64) -> Result<String, StorageError> {
        if !self.contains(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(format!("memory://{}?ttl={}", key, ttl_secs))
    }
}
