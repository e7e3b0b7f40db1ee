//! Scene text post-processing
//!
//! This module provides:
//! - `grouper`: grouping detected texts by position into a sentence
//! - `prediction`: the per-image prediction record

mod grouper;
mod prediction;

pub use grouper::{
    clean_text, fill_template, group_and_format, group_by_position, render_group, render_json_array,
    DescriptionTemplates, GroupedResult, SceneTextItem, GROUP_SEPARATOR,
};
pub use prediction::{PredictionResult, SceneTexts};
