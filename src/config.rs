//! Stage options and credential resolution.
//!
//! Credentials come from exactly one of three sources, in priority
//! order: direct option fields, a JSON credential file, or the
//! `BAIDU_OCR_API_KEY` / `BAIDU_OCR_SECRET_KEY` environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Environment variable consulted for the API key.
pub const ENV_API_KEY: &str = "BAIDU_OCR_API_KEY";
/// Environment variable consulted for the secret key.
pub const ENV_SECRET_KEY: &str = "BAIDU_OCR_SECRET_KEY";

/// Recognition API tier.
///
/// Both basic tiers speak the same protocol and differ only in endpoint
/// and recognition quality; neither returns per-word geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiType {
    /// Standard recognition, higher free quota
    #[default]
    GeneralBasic,
    /// Higher accuracy recognition
    AccurateBasic,
}

impl ApiType {
    /// Recognition endpoint for this tier.
    pub fn endpoint_url(&self) -> &'static str {
        match self {
            ApiType::GeneralBasic => "https://aip.baidubce.com/rest/2.0/ocr/v1/general_basic",
            ApiType::AccurateBasic => "https://aip.baidubce.com/rest/2.0/ocr/v1/accurate_basic",
        }
    }

    /// Whether this tier reports per-word bounding boxes.
    pub fn returns_geometry(&self) -> bool {
        match self {
            ApiType::GeneralBasic | ApiType::AccurateBasic => false,
        }
    }
}

/// Options for the Baidu OCR stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaiduOcrOptions {
    /// Direct API key (highest-priority credential source)
    pub api_key: Option<String>,
    /// Direct secret key (paired with `api_key`)
    pub secret_key: Option<String>,
    /// Path to a JSON credential file (second-priority source)
    pub config_file: Option<PathBuf>,
    /// Recognition API tier
    #[serde(default)]
    pub api_type: ApiType,
    /// Request timeout in seconds for both endpoints
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    /// Ask the service to detect text direction
    #[serde(default)]
    pub detect_direction: bool,
    /// Confidence threshold consumed by the cell post-processing step
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// Recognition language hint, passed through to the pipeline
    #[serde(default = "default_lang")]
    pub lang: Vec<String>,
}

fn default_timeout() -> f64 {
    10.0
}

fn default_confidence_threshold() -> f32 {
    0.5
}

fn default_lang() -> Vec<String> {
    vec!["CHN_ENG".to_string()]
}

impl Default for BaiduOcrOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            secret_key: None,
            config_file: None,
            api_type: ApiType::default(),
            timeout: default_timeout(),
            detect_direction: false,
            confidence_threshold: default_confidence_threshold(),
            lang: default_lang(),
        }
    }
}

impl BaiduOcrOptions {
    /// Options kind string used by the pipeline's OCR dispatch.
    pub fn kind(&self) -> &'static str {
        "baidu"
    }
}

/// Resolved API credentials. Immutable after construction, held in
/// process memory only.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
}

/// Shape of the JSON credential file. Absent fields are not an error
/// at parse time; completeness is checked after resolution.
#[derive(Debug, Default, Deserialize)]
struct CredentialFile {
    api_key: Option<String>,
    secret_key: Option<String>,
}

impl Credentials {
    /// Resolve credentials from the options, consulting real
    /// environment variables as the lowest-priority source.
    pub fn resolve(options: &BaiduOcrOptions) -> Result<Self, OcrError> {
        Self::resolve_with_env(options, |name| std::env::var(name).ok())
    }

    /// Resolve credentials with an injectable environment lookup.
    ///
    /// The first satisfied source wins; sources are never merged.
    pub fn resolve_with_env<F>(options: &BaiduOcrOptions, env: F) -> Result<Self, OcrError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (api_key, secret_key) = match (&options.api_key, &options.secret_key) {
            // Priority 1: both keys supplied directly
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                (Some(key.clone()), Some(secret.clone()))
            }
            _ => match &options.config_file {
                // Priority 2: JSON credential file
                Some(path) => {
                    if !path.exists() {
                        return Err(OcrError::Configuration(format!(
                            "Baidu OCR config file not found: {}",
                            path.display()
                        )));
                    }
                    let content = std::fs::read_to_string(path).map_err(|e| {
                        OcrError::Configuration(format!(
                            "failed to read Baidu OCR config file {}: {e}",
                            path.display()
                        ))
                    })?;
                    let file: CredentialFile = serde_json::from_str(&content).map_err(|e| {
                        OcrError::Configuration(format!(
                            "invalid Baidu OCR config file {}: {e}",
                            path.display()
                        ))
                    })?;
                    (file.api_key, file.secret_key)
                }
                // Priority 3: environment variables
                None => (env(ENV_API_KEY), env(ENV_SECRET_KEY)),
            },
        };

        match (api_key, secret_key) {
            (Some(api_key), Some(secret_key)) if !api_key.is_empty() && !secret_key.is_empty() => {
                Ok(Self {
                    api_key,
                    secret_key,
                })
            }
            _ => Err(OcrError::Configuration(
                "Baidu OCR credentials not provided. Please set api_key/secret_key, \
                 provide a config_file, or set BAIDU_OCR_API_KEY/BAIDU_OCR_SECRET_KEY \
                 environment variables."
                    .to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn fake_env(name: &str) -> Option<String> {
        match name {
            ENV_API_KEY => Some("env_key".to_string()),
            ENV_SECRET_KEY => Some("env_secret".to_string()),
            _ => None,
        }
    }

    fn credential_file(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{json}").unwrap();
        file
    }

    #[test]
    fn test_default_options() {
        let options = BaiduOcrOptions::default();
        assert_eq!(options.kind(), "baidu");
        assert_eq!(options.api_type, ApiType::GeneralBasic);
        assert_eq!(options.timeout, 10.0);
        assert!(!options.detect_direction);
        assert_eq!(options.confidence_threshold, 0.5);
        assert_eq!(options.lang, vec!["CHN_ENG".to_string()]);
    }

    #[test]
    fn test_options_deserialization_fills_defaults() {
        let options: BaiduOcrOptions =
            serde_json::from_str(r#"{"api_key": "k", "secret_key": "s"}"#).unwrap();
        assert_eq!(options.api_key.as_deref(), Some("k"));
        assert_eq!(options.timeout, 10.0);
        assert_eq!(options.api_type, ApiType::GeneralBasic);
    }

    #[test]
    fn test_api_type_endpoints_differ() {
        assert_ne!(
            ApiType::GeneralBasic.endpoint_url(),
            ApiType::AccurateBasic.endpoint_url()
        );
        assert!(!ApiType::GeneralBasic.returns_geometry());
        assert!(!ApiType::AccurateBasic.returns_geometry());
    }

    #[test]
    fn test_direct_options_win() {
        let options = BaiduOcrOptions {
            api_key: Some("direct_key".to_string()),
            secret_key: Some("direct_secret".to_string()),
            ..Default::default()
        };
        let creds = Credentials::resolve_with_env(&options, fake_env).unwrap();
        assert_eq!(creds.api_key, "direct_key");
        assert_eq!(creds.secret_key, "direct_secret");
    }

    #[test]
    fn test_direct_options_win_over_config_file() {
        let file = credential_file(r#"{"api_key": "file_key", "secret_key": "file_secret"}"#);
        let options = BaiduOcrOptions {
            api_key: Some("direct_key".to_string()),
            secret_key: Some("direct_secret".to_string()),
            config_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let creds = Credentials::resolve_with_env(&options, fake_env).unwrap();
        assert_eq!(creds.api_key, "direct_key");
    }

    #[test]
    fn test_config_file_wins_over_env() {
        let file = credential_file(r#"{"api_key": "file_key", "secret_key": "file_secret"}"#);
        let options = BaiduOcrOptions {
            config_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let creds = Credentials::resolve_with_env(&options, fake_env).unwrap();
        assert_eq!(creds.api_key, "file_key");
        assert_eq!(creds.secret_key, "file_secret");
    }

    #[test]
    fn test_env_used_when_nothing_else_supplied() {
        let options = BaiduOcrOptions::default();
        let creds = Credentials::resolve_with_env(&options, fake_env).unwrap();
        assert_eq!(creds.api_key, "env_key");
        assert_eq!(creds.secret_key, "env_secret");
    }

    #[test]
    fn test_missing_config_file_fails() {
        let options = BaiduOcrOptions {
            config_file: Some(PathBuf::from("/nonexistent/baidu_ocr.json")),
            ..Default::default()
        };
        let err = Credentials::resolve_with_env(&options, fake_env).unwrap_err();
        assert!(matches!(err, OcrError::Configuration(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_config_file_missing_field_fails_completeness_check() {
        // A parseable file with only one key is not a parse error, but
        // resolution still fails because the secret is absent.
        let file = credential_file(r#"{"api_key": "file_key"}"#);
        let options = BaiduOcrOptions {
            config_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let err = Credentials::resolve_with_env(&options, no_env).unwrap_err();
        assert!(matches!(err, OcrError::Configuration(_)));
        assert!(err.to_string().contains("BAIDU_OCR_API_KEY"));
    }

    #[test]
    fn test_no_source_fails_with_remediation_paths() {
        let options = BaiduOcrOptions::default();
        let err = Credentials::resolve_with_env(&options, no_env).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("api_key/secret_key"));
        assert!(msg.contains("config_file"));
        assert!(msg.contains("BAIDU_OCR_API_KEY/BAIDU_OCR_SECRET_KEY"));
    }

    #[test]
    fn test_partial_direct_options_fall_through_to_env() {
        // Only one direct key set: the direct source is unsatisfied,
        // so resolution falls through rather than merging.
        let options = BaiduOcrOptions {
            api_key: Some("direct_key".to_string()),
            ..Default::default()
        };
        let creds = Credentials::resolve_with_env(&options, fake_env).unwrap();
        assert_eq!(creds.api_key, "env_key");
    }
}
