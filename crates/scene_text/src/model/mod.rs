//! Model client module for Gemini inference
//!
//! This module provides:
//! - `client`: HTTP client and configuration
//! - `request`: `generateContent` request payloads
//! - `response`: `generateContent` response payloads

mod client;
mod request;
mod response;

pub use client::{
    ModelClient, ModelConfig, API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL,
    MODEL_ENV,
};
pub use request::{
    default_safety_settings, encode_image, mime_type_for_path, Content, GenerateContentRequest,
    GenerationConfig, HarmBlockThreshold, HarmCategory, InlineData, Part, RequestBuilder,
    SafetySetting, DEFAULT_MIME_TYPE, DEFAULT_TOP_P,
};
pub use response::{
    Candidate, CandidateContent, GenerateContentResponse, ResponsePart, TextResponse,
    UsageMetadata,
};
