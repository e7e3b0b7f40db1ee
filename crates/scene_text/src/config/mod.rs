//! Configuration module for scene_text
//!
//! This module contains:
//! - `models`: Supported Gemini model names
//! - `prompts`: Default scene text prompt and description templates

mod models;
mod prompts;

pub use models::{is_supported_model, list_supported_models, SUPPORTED_MODELS};
pub use prompts::{default_templates, DEFAULT_POSITIONS, SCENE_TEXT_PROMPT};
