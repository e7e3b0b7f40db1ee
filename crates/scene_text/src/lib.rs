//! scene_text: scene text description with Gemini multimodal models
//!
//! This library provides:
//! - Request building for the Gemini `generateContent` API (text and inline images)
//! - An HTTP model client with eager configuration validation
//! - Grouping of detected scene texts into one descriptive sentence
//! - Bounded, order-preserving batch prediction
//!
//! # Example
//!
//! ```no_run
//! use scene_text::{BatchDispatcher, ModelClient, ModelConfig};
//!
//! #[tokio::main]
//! async fn main() -> scene_text::Result<()> {
//!     let client = ModelClient::new(ModelConfig::from_env()?)?;
//!
//!     let result = client.predict_file_or_empty("data/016.jpg").await;
//!     println!("{}", result.sentence);
//!
//!     let results = client
//!         .batch_predict_or_empty(&["a.png", "b.png"], &BatchDispatcher::default())
//!         .await;
//!     println!("{} results", results.len());
//!     Ok(())
//! }
//! ```

// Core modules
pub mod error;

// Configuration module
pub mod config;

// Core functionality
pub mod batch;
pub mod model;
pub mod scene;

// Re-export commonly used types and functions
pub use error::{Result, SceneTextError};

// Config re-exports
pub use config::{
    default_templates, is_supported_model, list_supported_models, DEFAULT_POSITIONS,
    SCENE_TEXT_PROMPT, SUPPORTED_MODELS,
};

// Model re-exports
pub use model::{
    encode_image, mime_type_for_path, GenerateContentRequest, GenerateContentResponse,
    ModelClient, ModelConfig, RequestBuilder, TextResponse, UsageMetadata,
};

// Scene re-exports
pub use scene::{
    group_and_format, DescriptionTemplates, GroupedResult, PredictionResult, SceneTextItem,
    SceneTexts,
};

// Batch re-exports
pub use batch::{BatchDispatcher, DEFAULT_CONCURRENCY};
