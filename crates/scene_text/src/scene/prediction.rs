//! Prediction record returned for each image

use serde::{Deserialize, Serialize};

use super::grouper::{group_and_format, DescriptionTemplates, SceneTextItem};
use crate::error::Result;
use crate::model::UsageMetadata;

/// JSON shape the model is prompted to produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneTexts {
    pub scene_texts: Vec<SceneTextItem>,
}

impl SceneTexts {
    /// Parse the model's raw text output
    pub fn from_model_output(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Result of describing one image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub output: Vec<SceneTextItem>,
    pub sentence: String,
    pub usage: UsageMetadata,
}

impl PredictionResult {
    /// Build a result from parsed scene texts, cleaning newlines and rendering the sentence
    pub fn from_scene_texts(
        scene_texts: SceneTexts,
        usage: UsageMetadata,
        templates: &DescriptionTemplates,
    ) -> Result<Self> {
        let output: Vec<SceneTextItem> =
            scene_texts.scene_texts.iter().map(SceneTextItem::cleaned).collect();
        let sentence = group_and_format(&output, templates)?;
        Ok(Self {
            output,
            sentence,
            usage,
        })
    }

    /// Fallback used when a prediction fails
    ///
    /// Indistinguishable from an image with no detected text.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty() && self.sentence.is_empty() && self.usage.is_empty()
    }
}
