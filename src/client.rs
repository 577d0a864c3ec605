//! HTTP client for the Baidu token and recognition endpoints.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use crate::config::{ApiType, BaiduOcrOptions, Credentials};
use crate::error::OcrError;
use crate::token::{FreshToken, TokenCache};
use crate::types::RecognizedWord;

/// OAuth token endpoint.
const TOKEN_URL: &str = "https://aip.baidubce.com/oauth/2.0/token";

/// Seam between the page processor and the remote service, so the
/// processor can be exercised against a scripted backend in tests.
pub trait RecognizeWords: Send + Sync {
    /// Submit an encoded image and return the recognized word list.
    fn recognize(&self, image_bytes: &[u8]) -> Result<Vec<RecognizedWord>, OcrError>;
}

/// Blocking client for the Baidu OCR REST API.
///
/// Stateless apart from the injected token cache; safe to share across
/// worker threads.
pub struct BaiduOcrClient {
    http: reqwest::blocking::Client,
    credentials: Credentials,
    api_type: ApiType,
    detect_direction: bool,
    token_cache: Arc<TokenCache>,
}

/// Wire shape of the token endpoint response.
#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

/// Wire shape of the recognition endpoint response. Exactly one of
/// `words_result` and `error_code` is expected.
#[derive(Debug, Deserialize)]
struct RecognitionResponse {
    words_result: Option<Vec<RecognizedWord>>,
    error_code: Option<i64>,
    error_msg: Option<String>,
}

impl BaiduOcrClient {
    /// Build a client with the resolved credentials and the shared
    /// token cache. The configured timeout applies to both endpoints.
    pub fn new(
        credentials: Credentials,
        options: &BaiduOcrOptions,
        token_cache: Arc<TokenCache>,
    ) -> Result<Self, OcrError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs_f64(options.timeout))
            .build()?;

        Ok(Self {
            http,
            credentials,
            api_type: options.api_type,
            detect_direction: options.detect_direction,
            token_cache,
        })
    }

    /// Request a fresh access token from the token endpoint.
    fn fetch_token(&self) -> Result<FreshToken, OcrError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.api_key.as_str()),
                ("client_secret", self.credentials.secret_key.as_str()),
            ])
            .send()?
            .error_for_status()?;

        parse_token_response(&response.text()?)
    }
}

impl RecognizeWords for BaiduOcrClient {
    fn recognize(&self, image_bytes: &[u8]) -> Result<Vec<RecognizedWord>, OcrError> {
        // Token first: a refresh failure should surface before any
        // payload is encoded or sent.
        let token = self.token_cache.get_or_refresh(|| self.fetch_token())?;

        let image = BASE64_STANDARD.encode(image_bytes);
        debug!(
            endpoint = self.api_type.endpoint_url(),
            payload_bytes = image.len(),
            "submitting region for recognition"
        );

        let response = self
            .http
            .post(self.api_type.endpoint_url())
            .query(&[("access_token", token.as_str())])
            .form(&[
                ("image", image.as_str()),
                ("detect_direction", bool_str(self.detect_direction)),
            ])
            .send()?
            .error_for_status()?;

        parse_recognition_response(&response.text()?)
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Decode a token endpoint body. A body without an `access_token`
/// field (including a non-JSON body) is an authentication failure
/// carrying the raw response for diagnostics.
fn parse_token_response(body: &str) -> Result<FreshToken, OcrError> {
    let parsed: TokenResponse = serde_json::from_str(body).unwrap_or_default();
    match parsed.access_token {
        Some(access_token) => Ok(FreshToken {
            access_token,
            expires_in: parsed.expires_in,
        }),
        None => Err(OcrError::Authentication {
            body: body.to_string(),
        }),
    }
}

/// Decode a recognition endpoint body into the word list, mapping a
/// structured `error_code` to a remote-service error.
fn parse_recognition_response(body: &str) -> Result<Vec<RecognizedWord>, OcrError> {
    let parsed: RecognitionResponse = serde_json::from_str(body)?;

    if let Some(code) = parsed.error_code {
        return Err(OcrError::RemoteService {
            code,
            message: parsed.error_msg.unwrap_or_default(),
        });
    }

    Ok(parsed.words_result.unwrap_or_default())
}
