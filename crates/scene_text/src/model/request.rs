//! Request payloads for the Gemini `generateContent` endpoint

use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// MIME label used when the file extension is not a known image format
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// Default nucleus sampling value
pub const DEFAULT_TOP_P: f32 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

/// A single conversational turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text { text: String },
}

/// Base64 image bytes tagged with a MIME type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmCategory {
    HarmCategoryHateSpeech,
    HarmCategoryDangerousContent,
    HarmCategorySexuallyExplicit,
    HarmCategoryHarassment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockMediumAndAbove,
}

/// Safety settings sent with every request
pub fn default_safety_settings() -> Vec<SafetySetting> {
    [
        HarmCategory::HarmCategoryHateSpeech,
        HarmCategory::HarmCategoryDangerousContent,
        HarmCategory::HarmCategorySexuallyExplicit,
        HarmCategory::HarmCategoryHarassment,
    ]
    .into_iter()
    .map(|category| SafetySetting {
        category,
        threshold: HarmBlockThreshold::BlockMediumAndAbove,
    })
    .collect()
}

/// Helper for building request payloads
pub struct RequestBuilder;

impl RequestBuilder {
    /// Build a single-turn request, image part first when present
    pub fn build(
        prompt: &str,
        image: Option<(&[u8], &str)>,
        max_tokens: u32,
        temperature: f32,
        top_p: f32,
    ) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(2);

        if let Some((bytes, mime_type)) = image {
            parts.push(Self::create_image_part(bytes, mime_type));
        }
        parts.push(Self::create_text_part(prompt));

        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfig {
                max_output_tokens: max_tokens,
                temperature,
                top_p,
            },
            safety_settings: default_safety_settings(),
        }
    }

    /// Create an inline image part from raw bytes
    pub fn create_image_part(bytes: &[u8], mime_type: &str) -> Part {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.to_string(),
                data: general_purpose::STANDARD.encode(bytes),
            },
        }
    }

    pub fn create_text_part(text: &str) -> Part {
        Part::Text {
            text: text.to_string(),
        }
    }
}

/// Read an image file and encode it as base64
pub async fn encode_image(path: impl AsRef<Path>) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(general_purpose::STANDARD.encode(bytes))
}

/// Guess the MIME label from the file extension
pub fn mime_type_for_path(path: impl AsRef<Path>) -> &'static str {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or(DEFAULT_MIME_TYPE)
}
