//! Response payloads from the Gemini `generateContent` endpoint

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SceneTextError};

/// Token accounting returned alongside generated output
pub type UsageMetadata = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
    pub model_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate
    pub fn first_text(&self) -> Result<&str> {
        self.candidates
            .first()
            .ok_or(SceneTextError::MissingField("candidates"))?
            .content
            .as_ref()
            .ok_or(SceneTextError::MissingField("candidates[0].content"))?
            .parts
            .first()
            .ok_or(SceneTextError::MissingField("candidates[0].content.parts"))?
            .text
            .as_deref()
            .ok_or(SceneTextError::MissingField("candidates[0].content.parts[0].text"))
    }

    /// Usage metadata, required for a complete prediction
    pub fn usage(&self) -> Result<&UsageMetadata> {
        self.usage_metadata
            .as_ref()
            .ok_or(SceneTextError::MissingField("usageMetadata"))
    }
}

/// Result of a text-only generation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextResponse {
    pub text: String,
    pub usage: UsageMetadata,
    pub model_version: Option<String>,
}

impl TryFrom<GenerateContentResponse> for TextResponse {
    type Error = SceneTextError;

    fn try_from(response: GenerateContentResponse) -> Result<Self> {
        let text = response.first_text()?.to_string();
        Ok(Self {
            text,
            usage: response.usage_metadata.unwrap_or_default(),
            model_version: response.model_version,
        })
    }
}
