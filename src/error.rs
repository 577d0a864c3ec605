//! Error taxonomy for the OCR stage.

use thiserror::Error;

/// Failures raised by credential resolution, token acquisition, and
/// recognition calls.
///
/// `Configuration` is fatal at stage construction. `Authentication`
/// fails the in-flight call and leaves the token cache unrefreshed so
/// the next call retries from scratch. The remaining variants surface
/// per region and are caught by the page processor.
#[derive(Debug, Error)]
pub enum OcrError {
    /// Missing or incomplete credentials, or a missing credential file.
    #[error("Baidu OCR configuration error: {0}")]
    Configuration(String),

    /// The token endpoint answered but returned no usable access token.
    /// Carries the raw response body for diagnostics.
    #[error("failed to obtain Baidu access token: {body}")]
    Authentication { body: String },

    /// Network failure, timeout, or non-2xx status from either endpoint.
    #[error("Baidu OCR transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The recognition endpoint returned a structured error code.
    #[error("Baidu OCR API error: {code} - {message}")]
    RemoteService { code: i64, message: String },

    /// The recognition endpoint returned a body that is not valid JSON.
    #[error("invalid Baidu OCR response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A rendered region could not be encoded for submission.
    #[error("failed to encode region image: {0}")]
    Image(#[from] image::ImageError),
}
