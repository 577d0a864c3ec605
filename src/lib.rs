//! Baidu Cloud OCR stage for document-conversion pipelines.
//!
//! Recognition happens entirely on the remote service: each flagged
//! page region is rendered, PNG-encoded, and submitted to the Baidu
//! OCR REST API, and the returned word list is mapped to the
//! pipeline's positioned text cells. Credentials are resolved once at
//! construction; the OAuth access token is cached process-wide and
//! shared by every stage instance.

pub mod client;
pub mod config;
pub mod error;
pub mod stage;
pub mod token;
pub mod types;

pub use client::{BaiduOcrClient, RecognizeWords};
pub use config::{ApiType, BaiduOcrOptions, Credentials};
pub use error::OcrError;
pub use stage::{set_visualize_ocr, BaiduOcrStage, OcrPage};
pub use token::{FreshToken, TokenCache};
pub use types::{BoundingBox, RecognizedWord, TextCell};
