//! Default prompt and description templates for scene text recognition

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::scene::DescriptionTemplates;

/// Positions the default prompt asks the model to use
pub const DEFAULT_POSITIONS: [&str; 9] = [
    "top-left",
    "top",
    "top-right",
    "left",
    "center",
    "right",
    "bottom-left",
    "bottom",
    "bottom-right",
];

/// Prompt instructing the model to report scene text as JSON
pub const SCENE_TEXT_PROMPT: &str = r#"You are a scene text recognition system.
Find every piece of readable text in the image and report where it appears.
Use exactly one of these positions for each text: "top-left", "top", "top-right", "left", "center", "right", "bottom-left", "bottom", "bottom-right".
Keep the original language and spelling of the text. Do not translate.
Respond with JSON only, no markdown, in this exact shape:
{"scene_texts": [{"position": "<position>", "text": "<text>"}]}
If the image has no readable text, respond with {"scene_texts": []}."#;

lazy_static! {
    static ref DEFAULT_TEMPLATES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("top-left", "In the top-left corner the text {} can be seen");
        m.insert("top", "Along the top the text {} can be seen");
        m.insert("top-right", "In the top-right corner the text {} can be seen");
        m.insert("left", "On the left side the text {} can be seen");
        m.insert("center", "In the center the text {} can be seen");
        m.insert("right", "On the right side the text {} can be seen");
        m.insert("bottom-left", "In the bottom-left corner the text {} can be seen");
        m.insert("bottom", "Along the bottom the text {} can be seen");
        m.insert("bottom-right", "In the bottom-right corner the text {} can be seen");
        m
    };
}

/// Build the templates matching `SCENE_TEXT_PROMPT`
pub fn default_templates() -> DescriptionTemplates {
    DEFAULT_POSITIONS
        .iter()
        .map(|position| (*position, DEFAULT_TEMPLATES[position]))
        .collect()
}
