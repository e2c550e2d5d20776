//! Protocol client for the WPS sign-in service. One client is bound to one
//! account's cookies and drives the two-step exchange: fetch the session RSA
//! public key, then submit the hybrid-encrypted sign-in request. Every
//! failure path is folded into [`SignInError`] so the runner can treat the
//! whole attempt as a single fallible operation.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_TYPE, COOKIE, ORIGIN,
    PRAGMA, REFERER, USER_AGENT,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::crypto::keygen::KeyMaterial;
use crate::crypto::{aescbc, wrap, CryptoError};

/// Production API host; tests point the client at a local mock instead.
pub const DEFAULT_BASE_URL: &str = "https://personal-bus.wps.cn";

const ENCRYPT_KEY_PATH: &str = "/sign_in/v1/encrypt/key";
const SIGN_IN_PATH: &str = "/sign_in/v1/sign_in";

/// Web origin the sign-in page runs on; the service checks it.
const WEB_ORIGIN: &str = "https://personal-act.wps.cn";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Fixed literal the service expects in the sign-in body.
const PAY_ORIGIN: &str = "pc_ucs_rwzx_sign";

/// Both HTTP calls are bounded by this; exceeding it fails the attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum SignInError {
    #[error("network request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Protocol(String),
    #[error("HTTP {0}")]
    Http(u16),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("header value unusable: {0}")]
    Header(String),
}

/// Response envelope shared by both endpoints: `result` is `"ok"` on success
/// with the payload in `data`, anything else carries a `msg`.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    result: String,
    data: Option<Value>,
    msg: Option<String>,
}

impl ApiEnvelope {
    fn error_message(self) -> String {
        self.msg.unwrap_or_else(|| "unknown error".to_string())
    }
}

/// Plaintext the service expects inside `extra`. Field order matters for the
/// compact encoding, so it is pinned by the struct rather than a map.
#[derive(Debug, Serialize)]
struct SignInPayload {
    user_id: u64,
    platform: u32,
}

/// Per-request artifacts for one sign-in attempt. `aes_key` is kept only for
/// diagnostics; the service recovers it from `token`.
#[derive(Debug)]
pub struct RequestArtifacts {
    pub extra: String,
    pub token: String,
    pub aes_key: String,
}

/// Parses a `"; "`-separated cookie string into name/value pairs. Segments
/// without `=` are skipped, first-seen order is preserved, and a repeated
/// name keeps the last value.
pub fn parse_cookies(cookie_str: &str) -> Vec<(String, String)> {
    let mut cookies: Vec<(String, String)> = Vec::new();
    for item in cookie_str.split("; ") {
        let Some((name, value)) = item.split_once('=') else {
            continue;
        };
        match cookies.iter_mut().find(|(existing, _)| existing.as_str() == name) {
            Some((_, existing_value)) => *existing_value = value.to_string(),
            None => cookies.push((name.to_string(), value.to_string())),
        }
    }
    cookies
}

fn render_cookie_header(cookies: &[(String, String)]) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// HTTP client bound to one account.
pub struct WpsClient {
    http: Client,
    base_url: String,
}

impl WpsClient {
    /// Builds a client around the account's cookie string and optional user
    /// agent override. The fixed header bundle the web client sends is baked
    /// into the underlying HTTP client once.
    pub fn new(cookie_str: &str, user_agent: Option<&str>) -> Result<Self, SignInError> {
        let cookies = parse_cookies(cookie_str);
        let user_agent = user_agent.unwrap_or(DEFAULT_USER_AGENT);

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).map_err(|e| SignInError::Header(format!("{e}")))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ORIGIN, HeaderValue::from_static(WEB_ORIGIN));
        headers.insert(REFERER, HeaderValue::from_static("https://personal-act.wps.cn/"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        // Client-hint and fetch-metadata fingerprint the browser the cookies
        // were captured from; the service is known to inspect them.
        headers.insert(
            "sec-ch-ua",
            HeaderValue::from_static(
                "\"Chromium\";v=\"142\", \"Brave\";v=\"142\", \"Not_A Brand\";v=\"99\"",
            ),
        );
        headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
        headers.insert("sec-ch-ua-platform", HeaderValue::from_static("\"macOS\""));
        headers.insert("sec-gpc", HeaderValue::from_static("1"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("same-site"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
        headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
        headers.insert("priority", HeaderValue::from_static("u=1, i"));
        // Accept-Encoding stays with reqwest, which only advertises codings
        // it can actually decode.
        if !cookies.is_empty() {
            headers.insert(
                COOKIE,
                HeaderValue::from_str(&render_cookie_header(&cookies))
                    .map_err(|e| SignInError::Header(format!("{e}")))?,
            );
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at a different host. Used by tests to swap in a
    /// local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches the session RSA public key. Returns the base64-encoded PEM on
    /// an `ok` result; any other server answer or transport failure becomes a
    /// [`SignInError`].
    pub async fn fetch_public_key(&self) -> Result<String, SignInError> {
        info!("fetching RSA public key");
        let url = format!("{}{}", self.base_url, ENCRYPT_KEY_PATH);
        let response = self.http.get(url).send().await?.error_for_status()?;
        let mut envelope: ApiEnvelope = response.json().await?;

        if envelope.result == "ok" {
            if let Some(Value::String(public_key_b64)) = envelope.data.take() {
                debug!("public key received");
                return Ok(public_key_b64);
            }
        }
        Err(SignInError::Protocol(envelope.error_message()))
    }

    /// Builds the encrypted request artifacts: decode the public key, mint
    /// fresh key material, AES-encrypt the compact `{user_id, platform}`
    /// payload, and RSA-wrap the AES key.
    pub fn build_request_artifacts(
        &self,
        public_key_b64: &str,
        user_id: u64,
        platform: u32,
    ) -> Result<RequestArtifacts, SignInError> {
        let pem_bytes = STANDARD
            .decode(public_key_b64.as_bytes())
            .map_err(|e| CryptoError::Base64DecodeFailed(format!("{e}")))?;
        let public_key_pem =
            String::from_utf8(pem_bytes).map_err(|e| CryptoError::Utf8(format!("{e}")))?;

        let key_material = KeyMaterial::fresh();
        let payload = SignInPayload { user_id, platform };
        let plain = serde_json::to_string(&payload)
            .map_err(|e| SignInError::Protocol(format!("payload serialization failed: {e}")))?;

        let extra = aescbc::encrypt(&plain, key_material.key_text())?;
        let token = wrap::wrap_key(key_material.key_text(), &public_key_pem)?;
        debug!(user_id, platform, "request artifacts built");

        Ok(RequestArtifacts {
            extra,
            token,
            aes_key: key_material.key_text().to_string(),
        })
    }

    /// Runs the full attempt: fetch key, build artifacts, submit. HTTP 200
    /// plus an `ok` result yields the sign-in data; everything else comes
    /// back as a [`SignInError`] rather than a panic or propagated mishap.
    pub async fn sign_in(&self, user_id: u64, platform: u32) -> Result<Value, SignInError> {
        let public_key_b64 = self.fetch_public_key().await?;
        let artifacts = self.build_request_artifacts(&public_key_b64, user_id, platform)?;

        let body = serde_json::json!({
            "encrypt": true,
            "extra": artifacts.extra,
            "pay_origin": PAY_ORIGIN,
        });

        info!(user_id, "submitting sign-in request");
        let url = format!("{}{}", self.base_url, SIGN_IN_PATH);
        let response = self
            .http
            .post(url)
            .header(
                "token",
                HeaderValue::from_str(&artifacts.token)
                    .map_err(|e| SignInError::Header(format!("{e}")))?,
            )
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(SignInError::Http(status.as_u16()));
        }

        let envelope: ApiEnvelope = response.json().await?;
        if envelope.result == "ok" {
            Ok(envelope.data.unwrap_or_else(|| Value::Object(Default::default())))
        } else {
            Err(SignInError::Protocol(envelope.error_message()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_cookies, render_cookie_header, WpsClient};
    use base64::{engine::general_purpose::STANDARD, Engine};
    use rand::rngs::OsRng;
    use rsa::pkcs8::EncodePublicKey;
    use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};

    #[test]
    fn parses_well_formed_cookie_strings() {
        let cookies = parse_cookies("wps_sid=abc123; uid=42");
        assert_eq!(
            cookies,
            vec![
                ("wps_sid".to_string(), "abc123".to_string()),
                ("uid".to_string(), "42".to_string()),
            ]
        );
    }

    #[test]
    fn skips_segments_without_an_equals_sign() {
        let cookies = parse_cookies("valid=1; garbage; another=2");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].0, "valid");
        assert_eq!(cookies[1].0, "another");
    }

    #[test]
    fn keeps_the_last_value_for_repeated_names() {
        let cookies = parse_cookies("sid=old; sid=new");
        assert_eq!(cookies, vec![("sid".to_string(), "new".to_string())]);
    }

    #[test]
    fn preserves_values_containing_equals_signs() {
        let cookies = parse_cookies("token=a=b=c");
        assert_eq!(cookies, vec![("token".to_string(), "a=b=c".to_string())]);
    }

    #[test]
    fn renders_cookies_back_into_a_header() {
        let cookies = parse_cookies("a=1; b=2");
        assert_eq!(render_cookie_header(&cookies), "a=1; b=2");
    }

    #[test]
    fn artifacts_round_trip_through_the_matching_private_key() {
        let private_key =
            RsaPrivateKey::new(&mut OsRng, 2048).expect("keypair generation should succeed");
        let pem = private_key
            .to_public_key()
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .expect("public key should encode to PEM");
        let public_key_b64 = STANDARD.encode(pem.as_bytes());

        let client = WpsClient::new("sid=123", None).expect("client should build");
        let artifacts = client
            .build_request_artifacts(&public_key_b64, 123, 64)
            .expect("artifact construction should succeed");

        // The server-side view: unwrap the AES key from the token, then
        // decrypt `extra` with it.
        let wrapped = STANDARD
            .decode(artifacts.token.as_bytes())
            .expect("token should be base64");
        let recovered_key = private_key
            .decrypt(Pkcs1v15Encrypt, &wrapped)
            .expect("token should unwrap");
        let recovered_key =
            String::from_utf8(recovered_key).expect("aes key should be utf-8 text");
        assert_eq!(recovered_key, artifacts.aes_key);

        let plain = crate::crypto::aescbc::decrypt(&artifacts.extra, &recovered_key)
            .expect("extra should decrypt");
        assert_eq!(plain, r#"{"user_id":123,"platform":64}"#);
    }

    #[test]
    fn fresh_key_material_per_attempt() {
        let private_key =
            RsaPrivateKey::new(&mut OsRng, 2048).expect("keypair generation should succeed");
        let pem = private_key
            .to_public_key()
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .expect("public key should encode to PEM");
        let public_key_b64 = STANDARD.encode(pem.as_bytes());

        let client = WpsClient::new("sid=123", None).expect("client should build");
        let first = client
            .build_request_artifacts(&public_key_b64, 1, 64)
            .expect("first build should succeed");
        let second = client
            .build_request_artifacts(&public_key_b64, 1, 64)
            .expect("second build should succeed");
        assert_ne!(first.aes_key, second.aes_key);
    }

    #[test]
    fn rejects_public_keys_that_are_not_base64() {
        let client = WpsClient::new("sid=123", None).expect("client should build");
        let err = client
            .build_request_artifacts("!!! not base64 !!!", 1, 64)
            .unwrap_err();
        assert!(format!("{err}").contains("base64"));
    }
}
